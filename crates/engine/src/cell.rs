use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::style::StyleId;

/// The scalar content of a cell.
///
/// Formulas are carried as opaque source strings; evaluation is the job of
/// an external codec/engine and never happens here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Formula source, including the leading `=`.
    Formula(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// Classify a raw scalar the way interactive input arrives: formulas
    /// start with `=`, numbers parse as f64, everything else is text.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if trimmed.starts_with('=') {
            return CellValue::Formula(trimmed.to_string());
        }
        if let Ok(num) = trimmed.parse::<f64>() {
            return CellValue::Number(num);
        }
        CellValue::Text(trimmed.to_string())
    }

    /// Build a value from an untyped JSON scalar (the shape UI edits and
    /// bulk tool payloads arrive in).
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => {
                CellValue::Number(n.as_f64().unwrap_or(0.0))
            }
            serde_json::Value::String(s) => CellValue::from_input(s),
            // Arrays/objects have no cell representation; store their text.
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }
}

/// One cell: a value plus a reference into the document's style table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub style: Option<StyleId>,
}

impl Cell {
    pub fn with_value(value: CellValue) -> Self {
        Self { value, style: None }
    }

    /// A cell is dead weight when it has no value and no style; such cells
    /// are omitted from the wire projection entirely.
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.style.is_none()
    }
}
