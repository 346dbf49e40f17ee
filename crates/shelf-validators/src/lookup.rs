use std::future::Future;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shelf_core::RecordKind;

use crate::LookupError;

/// Search endpoint used to test whether a value is already in use.
pub trait RecordLookup {
    fn search(
        &self,
        kind: RecordKind,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<SearchHits, LookupError>>;
}

impl<L: RecordLookup> RecordLookup for Rc<L> {
    fn search(
        &self,
        kind: RecordKind,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<SearchHits, LookupError>> {
        (**self).search(kind, query)
    }
}

impl<L: RecordLookup> RecordLookup for &L {
    fn search(
        &self,
        kind: RecordKind,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<SearchHits, LookupError>> {
        (**self).search(kind, query)
    }
}

/// `field:value` terms joined with `AND`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<(String, String)>,
    size: usize,
}

impl SearchQuery {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            terms: vec![(field.into(), value.into())],
            size: 10,
        }
    }

    pub fn and(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((field.into(), value.into()));
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The `q` expression, e.g. `code:AOSTE AND library.pid:3`.
    pub fn q(&self) -> String {
        self.terms
            .iter()
            .map(|(f, v)| format!("{f}:{}", quote(v)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn to_query_string(&self) -> String {
        let q: String = url::form_urlencoded::byte_serialize(self.q().as_bytes()).collect();
        format!("q={q}&size={}", self.size)
    }
}

fn is_plain(v: &str) -> bool {
    !v.is_empty()
        && v
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn quote(v: &str) -> String {
    if is_plain(v) {
        return v.to_string();
    }
    let mut out = String::with_capacity(v.len() + 2);
    out.push('"');
    for c in v.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Total {
    Count(u64),
    Tracked {
        value: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation: Option<String>,
    },
}

impl Total {
    pub fn count(&self) -> u64 {
        match self {
            Total::Count(n) => *n,
            Total::Tracked { value, .. } => *value,
        }
    }
}

impl Default for Total {
    fn default() -> Self {
        Total::Count(0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitMetadata {
    pub pid: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub metadata: HitMetadata,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HitList {
    #[serde(default)]
    pub total: Total,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// `{ hits: { total, hits: [{ metadata: { pid, .. } }] } }`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    pub hits: HitList,
}

impl SearchHits {
    pub fn from_json(value: &Value) -> Result<Self, LookupError> {
        Ok(Self::deserialize(value)?)
    }

    pub fn from_hits(hits: Vec<Hit>, total: u64) -> Self {
        Self {
            hits: HitList {
                total: Total::Count(total),
                hits,
            },
        }
    }

    pub fn total(&self) -> u64 {
        self.hits.total.count()
    }

    pub fn pids(&self) -> impl Iterator<Item = &str> {
        self.hits.hits.iter().map(|h| h.metadata.pid.as_str())
    }
}

impl FromIterator<String> for SearchHits {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let hits: Vec<Hit> = iter
            .into_iter()
            .map(|pid| Hit {
                metadata: HitMetadata {
                    pid,
                    fields: Map::new(),
                },
            })
            .collect();
        let total = hits.len() as u64;
        Self::from_hits(hits, total)
    }
}
