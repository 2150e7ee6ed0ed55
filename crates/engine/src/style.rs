//! Interned formatting records.
//!
//! A `StyleRecord` is the full resolved attribute set of a cell. Records
//! are immutable once interned: the document's `StyleTable` hands out one
//! `StyleId` per distinct record, so identical formatting is stored (and
//! later serialized) exactly once.

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Index into a document's `StyleTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleId(pub u32);

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontStyle {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Point size. None = inherit the platform default (11).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<OrderedFloat<f32>>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderStyle {
    Thin,
    Hair,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorderSide {
    pub style: BorderStyle,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Borders {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub top: Option<BorderSide>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bottom: Option<BorderSide>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub left: Option<BorderSide>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub right: Option<BorderSide>,
}

impl Borders {
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.bottom.is_none() && self.left.is_none() && self.right.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignmentStyle {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub horizontal: Option<HorizontalAlign>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vertical: Option<VerticalAlign>,
    #[serde(default)]
    pub wrap_text: bool,
    /// Degrees, 0 = horizontal.
    #[serde(default)]
    pub rotation: i16,
}

/// The complete resolved attribute set of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRecord {
    #[serde(default)]
    pub font: FontStyle,
    /// Solid background fill. None = default (white).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fill: Option<Color>,
    #[serde(default)]
    pub borders: Borders,
    #[serde(default)]
    pub alignment: AlignmentStyle,
    /// Number format pattern. None = "General".
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub number_format: Option<String>,
}

impl StyleRecord {
    pub fn is_default(&self) -> bool {
        *self == StyleRecord::default()
    }
}

/// Intern table mapping equal records to one shared id.
///
/// Serializes as the plain record list; the reverse index is rebuilt on
/// deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<StyleRecord>", into = "Vec<StyleRecord>")]
pub struct StyleTable {
    records: Vec<StyleRecord>,
    index: FxHashMap<StyleRecord, StyleId>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a record, returning the id shared by all equal records.
    pub fn intern(&mut self, record: StyleRecord) -> StyleId {
        if let Some(id) = self.index.get(&record) {
            return *id;
        }
        let id = StyleId(self.records.len() as u32);
        self.records.push(record.clone());
        self.index.insert(record, id);
        id
    }

    pub fn get(&self, id: StyleId) -> Option<&StyleRecord> {
        self.records.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<StyleRecord>> for StyleTable {
    fn from(records: Vec<StyleRecord>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.clone(), StyleId(i as u32)))
            .collect();
        Self { records, index }
    }
}

impl From<StyleTable> for Vec<StyleRecord> {
    fn from(table: StyleTable) -> Self {
        table.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold_red() -> StyleRecord {
        StyleRecord {
            font: FontStyle {
                bold: true,
                color: Some(Color::rgb("FF0000")),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn equal_records_share_one_id() {
        let mut table = StyleTable::new();
        let a = table.intern(bold_red());
        let b = table.intern(bold_red());
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_records_get_distinct_ids() {
        let mut table = StyleTable::new();
        let a = table.intern(bold_red());
        let b = table.intern(StyleRecord::default());
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn index_survives_serde_round_trip() {
        let mut table = StyleTable::new();
        let id = table.intern(bold_red());
        let json = serde_json::to_string(&table).unwrap();
        let mut restored: StyleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.get(id), table.get(id));
        // Interning the same record again must reuse the id, not grow.
        assert_eq!(restored.intern(bold_red()), id);
        assert_eq!(restored.len(), 1);
    }
}
