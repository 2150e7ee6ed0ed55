use serde::{Deserialize, Serialize};

use crate::color::ThemePalette;
use crate::sheet::Sheet;
use crate::style::{StyleId, StyleTable};

/// A workbook-scoped defined name (named range or constant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinedName {
    pub name: String,
    pub target: String,
}

/// An embedded non-cell asset (image blob). The native codec cannot write
/// these; `save()` strips them on its retry path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub sheet: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The canonical in-memory workbook: an ordered set of sheets sharing one
/// interned style table and one theme palette.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookDocument {
    sheets: Vec<Sheet>,
    #[serde(default)]
    pub styles: StyleTable,
    #[serde(default)]
    pub theme: ThemePalette,
    #[serde(default)]
    pub defined_names: Vec<DefinedName>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl WorkbookDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Add an empty sheet. No-op (returning false) if the name is taken.
    pub fn add_sheet(&mut self, name: &str) -> bool {
        if self.has_sheet(name) {
            return false;
        }
        self.sheets.push(Sheet::new(name));
        true
    }

    /// Remove a sheet by name. No-op (returning false) if absent.
    pub fn delete_sheet(&mut self, name: &str) -> bool {
        let before = self.sheets.len();
        self.sheets.retain(|s| s.name != name);
        self.sheets.len() != before
    }

    /// Get a sheet, creating an empty one when missing.
    pub fn sheet_mut_or_create(&mut self, name: &str) -> &mut Sheet {
        if !self.has_sheet(name) {
            self.sheets.push(Sheet::new(name));
        }
        self.sheet_mut(name).expect("sheet exists after insert")
    }

    /// Replace (or append) a sheet wholesale, keeping the replaced sheet's
    /// position in the sheet order so compiled commits don't reorder tabs.
    pub fn put_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter().position(|s| s.name == sheet.name) {
            Some(idx) => self.sheets[idx] = sheet,
            None => self.sheets.push(sheet),
        }
    }

    /// High-fidelity copy of a sheet from another document: values, style
    /// references re-interned into this document's table, merges, freeze
    /// panes and row/column sizing. Replaces any same-named sheet.
    pub fn adopt_sheet(&mut self, source: &Sheet, source_styles: &StyleTable, new_name: &str) {
        let mut copy = source.clone();
        copy.name = new_name.to_string();

        // Re-intern style ids: the source ids index a different table.
        let mut remap: Vec<((u32, u32), StyleId)> = Vec::new();
        for (&coord, cell) in copy.iter_cells() {
            if let Some(src_id) = cell.style {
                if let Some(record) = source_styles.get(src_id) {
                    remap.push((coord, self.styles.intern(record.clone())));
                }
            }
        }
        for ((row, col), id) in remap {
            copy.set_style(row, col, id);
        }

        self.put_sheet(copy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::color::Color;
    use crate::style::{FontStyle, StyleRecord};

    #[test]
    fn add_and_delete_are_idempotent() {
        let mut doc = WorkbookDocument::new();
        assert!(doc.add_sheet("Accueil"));
        assert!(!doc.add_sheet("Accueil"));
        assert_eq!(doc.sheet_count(), 1);

        assert!(doc.delete_sheet("Accueil"));
        assert!(!doc.delete_sheet("Accueil"));
        assert_eq!(doc.sheet_count(), 0);
    }

    #[test]
    fn put_sheet_keeps_position() {
        let mut doc = WorkbookDocument::new();
        doc.add_sheet("A");
        doc.add_sheet("B");
        doc.add_sheet("C");

        let mut replacement = Sheet::new("B");
        replacement.set_value(0, 0, CellValue::Number(1.0));
        doc.put_sheet(replacement);

        assert_eq!(doc.sheet_names(), vec!["A", "B", "C"]);
        assert_eq!(doc.sheet("B").unwrap().value(0, 0), CellValue::Number(1.0));
    }

    #[test]
    fn adopt_sheet_reinterns_styles() {
        let mut source_doc = WorkbookDocument::new();
        let red = source_doc.styles.intern(StyleRecord {
            font: FontStyle { color: Some(Color::rgb("FF0000")), ..Default::default() },
            ..Default::default()
        });
        let sheet = source_doc.sheet_mut_or_create("Src");
        sheet.set_value(0, 0, CellValue::Text("x".into()));
        sheet.set_style(0, 0, red);

        let mut target = WorkbookDocument::new();
        // Occupy id 0 with something else so the remap is observable.
        target.styles.intern(StyleRecord {
            font: FontStyle { bold: true, ..Default::default() },
            ..Default::default()
        });
        let src_sheet = source_doc.sheet("Src").unwrap().clone();
        target.adopt_sheet(&src_sheet, &source_doc.styles, "Dest");

        let adopted = target.sheet("Dest").unwrap();
        let id = adopted.cell(0, 0).unwrap().style.unwrap();
        assert_eq!(
            target.styles.get(id).unwrap().font.color,
            Some(Color::rgb("FF0000"))
        );
    }
}
