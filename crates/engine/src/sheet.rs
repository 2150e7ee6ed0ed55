use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellValue};
use crate::color::Color;
use crate::style::StyleId;

/// An inclusive rectangular merge region, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRange {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
}

/// Frozen-pane offset: everything above `row` and left of `col` is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezePane {
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RowProps {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColProps {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub hidden: bool,
}

/// One worksheet: a sparse cell map plus layout metadata.
///
/// Bounds auto-extend on write; `rows`/`cols` track the used extent, not a
/// fixed grid size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sheet {
    pub name: String,
    #[serde(with = "coord_map")]
    cells: FxHashMap<(u32, u32), Cell>,
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub merges: Vec<MergedRange>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub freeze: Option<FreezePane>,
    #[serde(default)]
    pub row_props: FxHashMap<u32, RowProps>,
    #[serde(default)]
    pub col_props: FxHashMap<u32, ColProps>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tab_color: Option<Color>,
    #[serde(default)]
    pub hidden: bool,
    /// View zoom factor, 1.0 = 100%.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub zoom: Option<f32>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: FxHashMap::default(),
            rows: 0,
            cols: 0,
            merges: Vec::new(),
            freeze: None,
            row_props: FxHashMap::default(),
            col_props: FxHashMap::default(),
            tab_color: None,
            hidden: false,
            zoom: None,
        }
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u32) -> CellValue {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    pub fn is_formula(&self, row: u32, col: u32) -> bool {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.is_formula())
            .unwrap_or(false)
    }

    /// Set a cell's value, preserving its style and extending the used
    /// extent. Existing formulas are only replaced when `overwrite_formulas`
    /// is set; returns false when the write was withheld to protect one.
    pub fn set_value_guarded(
        &mut self,
        row: u32,
        col: u32,
        value: CellValue,
        overwrite_formulas: bool,
    ) -> bool {
        let cell = self.cells.entry((row, col)).or_default();
        if cell.value.is_formula() && !overwrite_formulas {
            return false;
        }
        cell.value = value;
        self.extend_to(row, col);
        true
    }

    /// Unconditional value write (bulk/tool path).
    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        self.set_value_guarded(row, col, value, true);
    }

    /// Replace a whole cell, style reference included.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        self.extend_to(row, col);
        self.cells.insert((row, col), cell);
    }

    pub fn set_style(&mut self, row: u32, col: u32, style: StyleId) {
        let cell = self.cells.entry((row, col)).or_default();
        cell.style = Some(style);
        self.extend_to(row, col);
    }

    fn extend_to(&mut self, row: u32, col: u32) {
        if row + 1 > self.rows {
            self.rows = row + 1;
        }
        if col + 1 > self.cols {
            self.cols = col + 1;
        }
    }

    pub fn merge(&mut self, range: MergedRange) {
        self.extend_to(range.end_row, range.end_col);
        self.merges.push(range);
    }

    /// Iterate populated cells in unspecified order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (&(u32, u32), &Cell)> {
        self.cells.iter()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Tuple-keyed maps don't survive JSON; serialize the cell map as an entry
/// list instead.
mod coord_map {
    use super::*;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &FxHashMap<(u32, u32), Cell>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&(u32, u32), &Cell)> = map.iter().collect();
        entries.sort_by_key(|(coord, _)| **coord);
        let mut seq = serializer.serialize_seq(Some(entries.len()))?;
        for ((row, col), cell) in entries {
            seq.serialize_element(&(row, col, cell))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<FxHashMap<(u32, u32), Cell>, D::Error> {
        let entries: Vec<(u32, u32, Cell)> = Vec::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|(row, col, cell)| ((row, col), cell))
            .collect())
    }
}
