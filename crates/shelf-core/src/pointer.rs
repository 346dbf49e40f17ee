//! Data pointers into a record draft.
//!
//! Layouts address fields with JSON pointers (`/notes/0/type`). A bare key
//! (`name`) is accepted as shorthand for `/name`. The segment `-` stands for
//! "any item of this array" and is how layouts describe array item widgets.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::error::PointerError;

pub const ARRAY_ITEM: &str = "-";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DataPointer {
    segments: SmallVec<[String; 4]>,
}

impl DataPointer {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(key: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(key.into());
        Self { segments }
    }

    pub fn parse(s: &str) -> Result<Self, PointerError> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let body = s.strip_prefix('/').unwrap_or(s);
        let mut segments = SmallVec::new();
        for raw in body.split('/') {
            if raw.is_empty() {
                return Err(PointerError::EmptySegment(s.to_string()));
            }
            segments.push(unescape(raw).ok_or_else(|| PointerError::BadEscape(s.to_string()))?);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Top-level field key the pointer starts with.
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn parent(&self) -> Option<DataPointer> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    pub fn child(&self, segment: impl Into<String>) -> DataPointer {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn starts_with(&self, prefix: &DataPointer) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Pointer of the control that owns this field: array item paths collapse
    /// onto the array itself.
    pub fn control_path(&self) -> DataPointer {
        let end = self
            .segments
            .iter()
            .position(|s| s == ARRAY_ITEM)
            .unwrap_or(self.segments.len());
        Self {
            segments: self.segments[..end].iter().cloned().collect(),
        }
    }

    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        value.pointer(&self.to_string())
    }

    /// Takes the value at this pointer out of `target`.
    pub fn remove(&self, target: &mut Value) -> Option<Value> {
        let last = self.segments.last()?;
        let parent = self.parent()?;
        match target.pointer_mut(&parent.to_string())? {
            Value::Object(map) => map.remove(last),
            Value::Array(items) => match last.parse::<usize>() {
                Ok(i) if i < items.len() => Some(items.remove(i)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Writes `value` at this pointer, creating intermediate objects.
    pub fn assign(&self, target: &mut Value, value: Value) {
        let Some((last, init)) = self.segments.split_last() else {
            *target = value;
            return;
        };
        let mut cur = target;
        for seg in init {
            cur = child_slot(cur, seg);
        }
        match cur {
            Value::Array(items) => match last.parse::<usize>() {
                Ok(i) if i < items.len() => items[i] = value,
                _ => items.push(value),
            },
            other => {
                if !other.is_object() {
                    *other = Value::Object(Map::new());
                }
                if let Value::Object(map) = other {
                    map.insert(last.clone(), value);
                }
            }
        }
    }
}

fn child_slot<'a>(cur: &'a mut Value, seg: &str) -> &'a mut Value {
    match cur {
        Value::Array(items) => {
            let idx = match seg.parse::<usize>() {
                Ok(i) if i < items.len() => i,
                _ => {
                    items.push(Value::Object(Map::new()));
                    items.len() - 1
                }
            };
            &mut items[idx]
        }
        Value::Object(map) => map
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
        other => {
            *other = Value::Object(Map::new());
            child_slot(other, seg)
        }
    }
}

fn unescape(raw: &str) -> Option<String> {
    if !raw.contains('~') {
        return Some(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next()? {
                '0' => out.push('~'),
                '1' => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

impl fmt::Display for DataPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            write!(f, "/{}", seg.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl FromStr for DataPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
