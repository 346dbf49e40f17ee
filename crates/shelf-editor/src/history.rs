use std::{cell::RefCell, fmt::Debug, rc::Rc};

use serde::{Deserialize, Serialize};
use shelf_core::*;

pub trait RouteKey: Clone + Debug + 'static + Serialize + for<'de> Deserialize<'de> {}
impl<T> RouteKey for T where T: Clone + Debug + 'static + Serialize + for<'de> Deserialize<'de> {}

/// Admin screens reachable from an editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Route {
    List { kind: RecordKind },
    Detail { kind: RecordKind, pid: String },
    Editor { kind: RecordKind, pid: Option<String> },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransitionDir {
    None,
    Push,
    Pop,
}

struct Entry<K: RouteKey> {
    key: K,
    /// Scope owned by this history entry.
    /// Disposed when the entry is popped or replaced.
    scope: Scope,
}

struct HistoryState<K: RouteKey> {
    entries: Vec<Entry<K>>,
    last_dir: TransitionDir,
}

/// Browser-style back stack. Never empty.
#[derive(Clone)]
pub struct History<K: RouteKey> {
    inner: Rc<RefCell<HistoryState<K>>>,
    version: Signal<u64>,
}

impl<K: RouteKey> History<K> {
    pub fn new(start: K) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HistoryState {
                entries: vec![Entry {
                    key: start,
                    scope: Scope::new(),
                }],
                last_dir: TransitionDir::None,
            })),
            version: signal(0),
        }
    }

    pub fn current(&self) -> Option<K> {
        self.inner.borrow().entries.last().map(|e| e.key.clone())
    }
    pub fn current_scope(&self) -> Option<Scope> {
        self.inner.borrow().entries.last().map(|e| e.scope.clone())
    }
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn last_dir(&self) -> TransitionDir {
        self.inner.borrow().last_dir
    }
    /// Bumped on every change.
    pub fn version(&self) -> &Signal<u64> {
        &self.version
    }
    fn bump(&self) {
        let v = self.version.get();
        self.version.set(v.wrapping_add(1));
    }

    pub fn push(&self, key: K) {
        {
            let mut s = self.inner.borrow_mut();
            s.entries.push(Entry {
                key,
                scope: Scope::new(),
            });
            s.last_dir = TransitionDir::Push;
        }
        self.bump();
    }

    /// Swaps the top entry (post-save redirect). The old entry's scope is
    /// disposed.
    pub fn replace(&self, key: K) {
        let old = {
            let mut s = self.inner.borrow_mut();
            let old = s.entries.pop();
            s.entries.push(Entry {
                key,
                scope: Scope::new(),
            });
            s.last_dir = TransitionDir::Push;
            old
        };
        if let Some(e) = old {
            e.scope.dispose();
        }
        self.bump();
    }

    /// Pops the top entry unless it is the only one.
    pub fn back(&self) -> bool {
        let entry = {
            let mut s = self.inner.borrow_mut();
            if s.entries.len() <= 1 {
                return false;
            }
            s.last_dir = TransitionDir::Pop;
            s.entries.pop()
        };
        if let Some(e) = entry {
            e.scope.dispose();
        }
        self.bump();
        true
    }

    pub fn to_json(&self) -> String {
        let s = self.inner.borrow();
        let keys: Vec<&K> = s.entries.iter().map(|e| &e.key).collect();
        serde_json::to_string(&keys).unwrap_or("[]".into())
    }

    /// Restores a stack saved with `to_json`. An empty or malformed list
    /// leaves the history untouched.
    pub fn from_json(&self, json: &str) -> Result<(), serde_json::Error> {
        let keys = serde_json::from_str::<Vec<K>>(json)?;
        if keys.is_empty() {
            return Ok(());
        }
        let old_entries = std::mem::take(&mut self.inner.borrow_mut().entries);
        for e in old_entries {
            e.scope.dispose();
        }

        {
            let mut s = self.inner.borrow_mut();
            for k in keys {
                s.entries.push(Entry {
                    key: k,
                    scope: Scope::new(),
                });
            }
            s.last_dir = TransitionDir::None;
        }
        self.bump();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> Route {
        Route::List {
            kind: RecordKind::CirculationPolicy,
        }
    }

    #[test]
    fn back_never_empties_the_stack() {
        let h = History::new(list());
        assert!(!h.back());
        h.push(Route::Editor {
            kind: RecordKind::CirculationPolicy,
            pid: None,
        });
        assert_eq!(h.len(), 2);
        assert!(h.back());
        assert_eq!(h.current(), Some(list()));
        assert_eq!(h.last_dir(), TransitionDir::Pop);
    }

    #[test]
    fn popping_disposes_entry_scope() {
        let h = History::new(list());
        h.push(Route::Editor {
            kind: RecordKind::Item,
            pid: Some("4".into()),
        });
        let scope = h.current_scope().unwrap();
        let child = scope.child();
        h.back();
        assert!(scope.is_disposed());
        assert!(child.is_disposed());
    }

    #[test]
    fn replace_swaps_top_and_bumps_version() {
        let h = History::new(list());
        h.push(Route::Editor {
            kind: RecordKind::Item,
            pid: None,
        });
        let before = h.version().get();
        let old_scope = h.current_scope().unwrap();
        h.replace(Route::Detail {
            kind: RecordKind::Item,
            pid: "12".into(),
        });
        assert_eq!(h.len(), 2);
        assert!(old_scope.is_disposed());
        assert!(h.version().get() > before);
        assert_eq!(
            h.current(),
            Some(Route::Detail {
                kind: RecordKind::Item,
                pid: "12".into()
            })
        );
    }

    #[test]
    fn json_round_trip_restores_stack() {
        let h = History::new(list());
        h.push(Route::Detail {
            kind: RecordKind::Library,
            pid: "1".into(),
        });
        let saved = h.to_json();
        assert!(saved.contains(r#""screen":"detail""#));

        let other = History::new(Route::List {
            kind: RecordKind::Patron,
        });
        other.from_json(&saved).unwrap();
        assert_eq!(other.len(), 2);
        assert_eq!(other.current(), h.current());
        assert!(other.from_json("not json").is_err());
        assert_eq!(other.len(), 2);
    }
}
