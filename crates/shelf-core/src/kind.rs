use serde::{Deserialize, Serialize};

/// Record types the admin editors work on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    CirculationPolicy,
    ItemType,
    PatronType,
    Library,
    Location,
    Item,
    Patron,
}

impl RecordKind {
    /// Indexed field that must be unique among records of this kind.
    pub fn unique_field(self) -> &'static str {
        match self {
            RecordKind::CirculationPolicy | RecordKind::ItemType | RecordKind::PatronType => {
                "name"
            }
            RecordKind::Library | RecordKind::Location => "code",
            RecordKind::Item | RecordKind::Patron => "barcode",
        }
    }

    /// The other kind whose barcodes share a namespace with this one.
    pub fn barcode_counterpart(self) -> Option<RecordKind> {
        match self {
            RecordKind::Item => Some(RecordKind::Patron),
            RecordKind::Patron => Some(RecordKind::Item),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::CirculationPolicy => "circulation policy",
            RecordKind::ItemType => "item type",
            RecordKind::PatronType => "patron type",
            RecordKind::Library => "library",
            RecordKind::Location => "location",
            RecordKind::Item => "item",
            RecordKind::Patron => "patron",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
