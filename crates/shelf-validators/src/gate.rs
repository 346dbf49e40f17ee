use std::cell::Cell;
use std::rc::Rc;

use web_time::{Duration, Instant};

/// Hands out tickets so only the newest check may publish its result.
#[derive(Clone, Default, Debug)]
pub struct LatestOnly {
    issued: Rc<Cell<u64>>,
}

#[derive(Debug)]
pub struct Ticket {
    serial: u64,
    issued: Rc<Cell<u64>>,
}

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        let serial = self.issued.get() + 1;
        self.issued.set(serial);
        Ticket {
            serial,
            issued: self.issued.clone(),
        }
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate(&self) {
        self.issued.set(self.issued.get() + 1);
    }
}

impl Ticket {
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn is_current(&self) -> bool {
        self.issued.get() == self.serial
    }
}

/// Holds back a changing value until it has been quiet for `delay`.
#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(d) if now >= d => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Drops the wait and returns whatever was pending.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
