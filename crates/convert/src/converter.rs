//! Canonical document → wire-format projection.
//!
//! One converter instance is one interning pass: identical resolved style
//! attributes always map to the same wire style id within a pass. Interning
//! is two-level — a cache keyed by the engine's `StyleId` avoids
//! recomputing records, and a cache keyed by the computed wire style's
//! canonical JSON collapses distinct engine styles that render identically.

use std::collections::{BTreeMap, HashMap};

use rustc_hash::FxHashMap;

use gridsync_engine::cell::{Cell, CellValue};
use gridsync_engine::serial::datetime_to_serial;
use gridsync_engine::sheet::Sheet;
use gridsync_engine::style::{
    BorderSide, BorderStyle, HorizontalAlign, StyleId, StyleRecord, VerticalAlign,
};
use gridsync_engine::WorkbookDocument;
use gridsync_protocol::{
    WireBorderSide, WireBorders, WireCell, WireColProps, WireColor, WireFreeze, WireMergeRange,
    WireNumberFormat, WireRotation, WireRowProps, WireSheet, WireStyle, WireStyleRegion,
    WireToggle, WireWorkbook, TYPE_BOOLEAN, TYPE_NUMBER, TYPE_STRING,
};

/// Documented wire defaults; attributes matching them are never emitted.
const DEFAULT_FONT: &str = "Calibri";
const DEFAULT_FONT_SIZE: f32 = 11.0;
const DEFAULT_FONT_COLOR: &str = "000000";
const DEFAULT_FILL_COLOR: &str = "FFFFFF";
const DEFAULT_NUMBER_FORMAT: &str = "General";

/// Row heights are stored in points; the UI wants pixels.
const ROW_HEIGHT_SCALE: f32 = 1.4;
/// Column widths are stored in character units; the UI wants pixels.
const COL_WIDTH_SCALE: f32 = 7.5;

/// Map a cell value onto the `{v?, f?, t?}` wire shape.
pub fn cell_value_to_wire(value: &CellValue) -> WireCell {
    let mut wire = WireCell::default();
    match value {
        CellValue::Empty => {}
        CellValue::Number(n) => {
            wire.v = Some(serde_json::json!(n));
            wire.t = Some(TYPE_NUMBER);
        }
        CellValue::Text(s) => {
            wire.v = Some(serde_json::json!(s));
            wire.t = Some(TYPE_STRING);
        }
        CellValue::Bool(b) => {
            wire.v = Some(serde_json::json!(if *b { 1 } else { 0 }));
            wire.t = Some(TYPE_BOOLEAN);
        }
        CellValue::DateTime(dt) => {
            wire.v = Some(serde_json::json!(datetime_to_serial(dt)));
            wire.t = Some(TYPE_NUMBER);
        }
        // Formula cells always emit the source, never a cached value.
        CellValue::Formula(src) => {
            let body = src.trim_start_matches('=');
            wire.f = Some(format!("={body}"));
        }
    }
    wire
}

/// Interpret an incoming wire cell as a value. A formula source wins over
/// any cached value; otherwise the type tag disambiguates.
pub fn wire_to_cell_value(cell: &WireCell) -> CellValue {
    if let Some(f) = &cell.f {
        let body = f.trim_start_matches('=');
        return CellValue::Formula(format!("={body}"));
    }
    let v = match &cell.v {
        Some(v) => v,
        None => return CellValue::Empty,
    };
    match cell.t {
        Some(TYPE_BOOLEAN) => match v {
            serde_json::Value::Number(n) => CellValue::Bool(n.as_f64() != Some(0.0)),
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            other => CellValue::from_json(other),
        },
        Some(TYPE_STRING) => match v.as_str() {
            Some(s) => CellValue::Text(s.to_string()),
            None => CellValue::Text(v.to_string()),
        },
        _ => CellValue::from_json(v),
    }
}

pub struct WireConverter<'a> {
    doc: &'a WorkbookDocument,
    locale: String,
    registry: BTreeMap<String, WireStyle>,
    /// Engine style id → wire id (None = resolves to the default style).
    by_style_id: FxHashMap<StyleId, Option<String>>,
    /// Canonical wire-style JSON → wire id.
    by_wire_identity: HashMap<String, String>,
    counter: usize,
}

impl<'a> WireConverter<'a> {
    pub fn new(doc: &'a WorkbookDocument) -> Self {
        Self {
            doc,
            locale: "FR_FR".to_string(),
            registry: BTreeMap::new(),
            by_style_id: FxHashMap::default(),
            by_wire_identity: HashMap::new(),
            counter: 0,
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    /// Project the whole document. The style registry is emitted once at
    /// workbook level.
    pub fn convert(mut self) -> WireWorkbook {
        let mut sheets = BTreeMap::new();
        let mut sheet_order = Vec::new();
        for sheet in self.doc.sheets() {
            let wire = self.convert_sheet(sheet);
            sheet_order.push(wire.id.clone());
            sheets.insert(wire.id.clone(), wire);
        }

        WireWorkbook {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Imported Workbook".to_string(),
            locale: self.locale.clone(),
            styles: self.registry,
            sheets,
            sheet_order,
            defined_names: self
                .doc
                .defined_names
                .iter()
                .map(|dn| gridsync_protocol::WireDefinedName {
                    n: dn.name.clone(),
                    formula_ref_or_string: dn.target.replace('$', ""),
                })
                .collect(),
        }
    }

    /// Project one sheet as a standalone payload (ReplaceSheet operations):
    /// the styles its cells reference are embedded in the sheet itself.
    pub fn sheet_payload(doc: &WorkbookDocument, sheet: &Sheet) -> WireSheet {
        let mut converter = WireConverter::new(doc);
        let mut wire = converter.convert_sheet(sheet);
        wire.styles = converter.registry;
        wire
    }

    /// Project one sheet using this pass's shared style registry.
    pub fn convert_sheet(&mut self, sheet: &Sheet) -> WireSheet {
        let mut cell_data: BTreeMap<u32, BTreeMap<u32, WireCell>> = BTreeMap::new();
        // Empty-but-styled cells get compacted into rectangles instead of
        // one cellData entry each.
        let mut style_only: FxHashMap<(u32, u32), String> = FxHashMap::default();

        for (&(row, col), cell) in sheet.iter_cells() {
            let style_id = cell.style.and_then(|sid| self.wire_style_id(sid));
            if cell.value.is_empty() {
                if let Some(id) = style_id {
                    style_only.insert((row, col), id);
                }
                continue;
            }
            let wire = self.convert_cell(cell, style_id);
            if !wire.is_empty() {
                cell_data.entry(row).or_default().insert(col, wire);
            }
        }

        let style_regions = crate::compact::compact_rectangles(&style_only)
            .into_iter()
            .map(|rect| WireStyleRegion {
                start_row: rect.start_row,
                end_row: rect.end_row,
                start_column: rect.start_col,
                end_column: rect.end_col,
                s: rect.value,
            })
            .collect();

        let mut row_data = BTreeMap::new();
        for (&row, props) in &sheet.row_props {
            let wire = WireRowProps {
                h: props.height.map(|h| h * ROW_HEIGHT_SCALE),
                hd: props.hidden.then_some(1),
            };
            if wire != WireRowProps::default() {
                row_data.insert(row, wire);
            }
        }

        let mut column_data = BTreeMap::new();
        for (&col, props) in &sheet.col_props {
            let wire = WireColProps {
                w: props.width.map(|w| (w * COL_WIDTH_SCALE) as i32),
                hd: props.hidden.then_some(1),
            };
            if wire != WireColProps::default() {
                column_data.insert(col, wire);
            }
        }

        WireSheet {
            // The UI addresses sheets by name; a name-derived id keeps the
            // projection deterministic across passes.
            id: sheet.name.clone(),
            name: sheet.name.clone(),
            tab_color: sheet
                .tab_color
                .as_ref()
                .map(|c| format!("#{}", c.resolve(&self.doc.theme)))
                .unwrap_or_default(),
            hidden: sheet.hidden as u8,
            row_count: sheet.rows,
            column_count: sheet.cols,
            zoom_ratio: sheet.zoom.unwrap_or(1.0),
            freeze: sheet
                .freeze
                .map(|f| WireFreeze {
                    start_row: f.row as i32,
                    start_column: f.col as i32,
                    y_split: f.row as i32,
                    x_split: f.col as i32,
                })
                .unwrap_or_default(),
            merge_data: sheet
                .merges
                .iter()
                .map(|m| WireMergeRange {
                    start_row: m.start_row,
                    end_row: m.end_row,
                    start_column: m.start_col,
                    end_column: m.end_col,
                })
                .collect(),
            cell_data,
            row_data,
            column_data,
            style_regions,
            styles: BTreeMap::new(),
        }
    }

    /// Project a single cell (style id already resolved).
    fn convert_cell(&self, cell: &Cell, style_id: Option<String>) -> WireCell {
        let mut wire = cell_value_to_wire(&cell.value);
        wire.s = style_id;
        wire
    }

    /// Two-level interned style lookup.
    fn wire_style_id(&mut self, sid: StyleId) -> Option<String> {
        if let Some(cached) = self.by_style_id.get(&sid) {
            return cached.clone();
        }

        let record = match self.doc.styles.get(sid) {
            Some(r) => r,
            None => {
                log::warn!("dangling style id {:?}, treating as default", sid);
                self.by_style_id.insert(sid, None);
                return None;
            }
        };

        let wire = self.compute_wire_style(record);
        let resolved = if wire.is_default() {
            None
        } else {
            // Canonical identity of the *computed* style: two distinct
            // engine records that render identically share one wire id.
            let identity = serde_json::to_string(&wire).expect("wire style serializes");
            match self.by_wire_identity.get(&identity) {
                Some(existing) => Some(existing.clone()),
                None => {
                    let id = format!("s{}", self.counter);
                    self.counter += 1;
                    self.registry.insert(id.clone(), wire);
                    self.by_wire_identity.insert(identity, id.clone());
                    Some(id)
                }
            }
        };

        self.by_style_id.insert(sid, resolved.clone());
        resolved
    }

    /// Compute the wire style for a record, emitting only non-default
    /// attributes.
    fn compute_wire_style(&self, record: &StyleRecord) -> WireStyle {
        let mut style = WireStyle::default();
        let font = &record.font;

        if let Some(name) = &font.name {
            if name != DEFAULT_FONT {
                style.ff = Some(name.clone());
            }
        }
        if let Some(size) = font.size {
            if size.into_inner() != DEFAULT_FONT_SIZE {
                style.fs = Some(size.into_inner());
            }
        }
        if font.bold {
            style.bl = Some(1);
        }
        if font.italic {
            style.it = Some(1);
        }
        if font.underline {
            style.ul = Some(WireToggle { s: 1 });
        }
        if font.strikethrough {
            style.st = Some(WireToggle { s: 1 });
        }
        if let Some(color) = &font.color {
            let rgb = color.resolve(&self.doc.theme);
            if rgb != DEFAULT_FONT_COLOR {
                style.cl = Some(WireColor::new(&rgb));
            }
        }

        if let Some(fill) = &record.fill {
            let rgb = fill.resolve(&self.doc.theme);
            if rgb != DEFAULT_FILL_COLOR {
                style.bg = Some(WireColor::new(&rgb));
            }
        }

        let borders = WireBorders {
            t: record.borders.top.as_ref().map(|s| self.wire_border(s)),
            b: record.borders.bottom.as_ref().map(|s| self.wire_border(s)),
            l: record.borders.left.as_ref().map(|s| self.wire_border(s)),
            r: record.borders.right.as_ref().map(|s| self.wire_border(s)),
        };
        if !borders.is_empty() {
            style.bd = Some(borders);
        }

        style.ht = record.alignment.horizontal.map(|h| match h {
            HorizontalAlign::Left => 1,
            HorizontalAlign::Center => 2,
            HorizontalAlign::Right => 3,
            HorizontalAlign::Justify => 4,
        });
        style.vt = record.alignment.vertical.map(|v| match v {
            VerticalAlign::Top => 1,
            VerticalAlign::Center => 2,
            VerticalAlign::Bottom => 3,
        });
        if record.alignment.wrap_text {
            style.tb = Some(3);
        }
        if record.alignment.rotation != 0 {
            style.tr = Some(WireRotation { a: record.alignment.rotation, v: 0 });
        }

        if let Some(pattern) = &record.number_format {
            if pattern != DEFAULT_NUMBER_FORMAT {
                style.n = Some(WireNumberFormat { pattern: pattern.clone() });
            }
        }

        style
    }

    fn wire_border(&self, side: &BorderSide) -> WireBorderSide {
        let code = match side.style {
            BorderStyle::Thin => 1,
            BorderStyle::Hair => 2,
            BorderStyle::Dotted => 3,
            BorderStyle::Dashed => 4,
            BorderStyle::Double => 7,
            BorderStyle::Medium => 8,
            BorderStyle::Thick => 13,
        };
        let rgb = side
            .color
            .as_ref()
            .map(|c| c.resolve(&self.doc.theme))
            .unwrap_or_else(|| DEFAULT_FONT_COLOR.to_string());
        WireBorderSide { s: code, cl: WireColor::new(&rgb) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsync_engine::color::Color;
    use gridsync_engine::sheet::{FreezePane, MergedRange};
    use gridsync_engine::style::FontStyle;
    use ordered_float::OrderedFloat;

    fn bold_style() -> StyleRecord {
        StyleRecord {
            font: FontStyle { bold: true, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn identical_styles_share_one_wire_id() {
        let mut doc = WorkbookDocument::new();
        let a = doc.styles.intern(bold_style());
        let b = doc.styles.intern(bold_style());
        assert_eq!(a, b); // engine interning already collapses these

        let sheet = doc.sheet_mut_or_create("S");
        sheet.set_value(0, 0, CellValue::Number(1.0));
        sheet.set_style(0, 0, a);
        sheet.set_value(0, 1, CellValue::Number(2.0));
        sheet.set_style(0, 1, b);

        let wire = WireConverter::new(&doc).convert();
        assert_eq!(wire.styles.len(), 1);
        let s = &wire.sheets["S"];
        assert_eq!(s.cell_data[&0][&0].s, s.cell_data[&0][&1].s);
    }

    #[test]
    fn distinct_engine_styles_rendering_identically_collapse() {
        let mut doc = WorkbookDocument::new();
        // Calibri 11 named explicitly vs. inherited: different records,
        // identical rendering.
        let explicit = doc.styles.intern(StyleRecord {
            font: FontStyle {
                name: Some(DEFAULT_FONT.to_string()),
                size: Some(OrderedFloat(DEFAULT_FONT_SIZE)),
                bold: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let inherited = doc.styles.intern(bold_style());
        assert_ne!(explicit, inherited);

        let sheet = doc.sheet_mut_or_create("S");
        sheet.set_value(0, 0, CellValue::Number(1.0));
        sheet.set_style(0, 0, explicit);
        sheet.set_value(0, 1, CellValue::Number(2.0));
        sheet.set_style(0, 1, inherited);

        let wire = WireConverter::new(&doc).convert();
        assert_eq!(wire.styles.len(), 1);
    }

    #[test]
    fn default_resolved_style_gets_no_id() {
        let mut doc = WorkbookDocument::new();
        let noop = doc.styles.intern(StyleRecord {
            font: FontStyle {
                name: Some(DEFAULT_FONT.to_string()),
                color: Some(Color::rgb("000000")),
                ..Default::default()
            },
            ..Default::default()
        });
        let sheet = doc.sheet_mut_or_create("S");
        sheet.set_value(0, 0, CellValue::Text("x".into()));
        sheet.set_style(0, 0, noop);

        let wire = WireConverter::new(&doc).convert();
        assert!(wire.styles.is_empty());
        assert_eq!(wire.sheets["S"].cell_data[&0][&0].s, None);
    }

    #[test]
    fn value_mapping_follows_wire_conventions() {
        let mut doc = WorkbookDocument::new();
        let sheet = doc.sheet_mut_or_create("S");
        sheet.set_value(0, 0, CellValue::Number(12.5));
        sheet.set_value(0, 1, CellValue::Bool(true));
        sheet.set_value(0, 2, CellValue::Formula("SUM(A1:A2)".into()));
        sheet.set_value(
            0,
            3,
            CellValue::DateTime(
                chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
        );

        let wire = WireConverter::new(&doc).convert();
        let row = &wire.sheets["S"].cell_data[&0];
        assert_eq!(row[&0].t, Some(TYPE_NUMBER));
        assert_eq!(row[&1].v, Some(serde_json::json!(1)));
        assert_eq!(row[&1].t, Some(TYPE_BOOLEAN));
        // Formula: source only, leading '=' restored, no cached value.
        assert_eq!(row[&2].f.as_deref(), Some("=SUM(A1:A2)"));
        assert_eq!(row[&2].v, None);
        assert_eq!(row[&3].v, Some(serde_json::json!(45658.0)));
    }

    #[test]
    fn layout_metadata_projects() {
        let mut doc = WorkbookDocument::new();
        let sheet = doc.sheet_mut_or_create("S");
        sheet.set_value(9, 0, CellValue::Number(1.0));
        sheet.freeze = Some(FreezePane { row: 1, col: 2 });
        sheet.merge(MergedRange { start_row: 0, end_row: 1, start_col: 0, end_col: 3 });
        sheet.row_props.insert(4, gridsync_engine::sheet::RowProps { height: Some(30.0), hidden: false });
        sheet.col_props.insert(2, gridsync_engine::sheet::ColProps { width: Some(12.0), hidden: true });

        let wire = WireConverter::new(&doc).convert();
        let s = &wire.sheets["S"];
        assert_eq!(s.freeze, WireFreeze { start_row: 1, start_column: 2, y_split: 1, x_split: 2 });
        assert_eq!(s.merge_data.len(), 1);
        assert_eq!(s.row_data[&4].h, Some(42.0));
        assert_eq!(s.column_data[&2].w, Some(90));
        assert_eq!(s.column_data[&2].hd, Some(1));
    }

    #[test]
    fn empty_styled_cells_become_style_regions() {
        let mut doc = WorkbookDocument::new();
        let fill = doc.styles.intern(StyleRecord {
            fill: Some(Color::rgb("FFFF00")),
            ..Default::default()
        });
        let sheet = doc.sheet_mut_or_create("S");
        // A 2x3 highlighted block with no values.
        for r in 0..2 {
            for c in 0..3 {
                sheet.set_style(r, c, fill);
            }
        }
        sheet.set_value(5, 0, CellValue::Number(1.0));

        let wire = WireConverter::new(&doc).convert();
        let s = &wire.sheets["S"];
        assert_eq!(s.style_regions.len(), 1);
        let region = &s.style_regions[0];
        assert_eq!((region.start_row, region.end_row), (0, 1));
        assert_eq!((region.start_column, region.end_column), (0, 2));
        // The block does not appear cell-by-cell.
        assert!(!s.cell_data.contains_key(&0));
        assert!(s.cell_data.contains_key(&5));
    }

    #[test]
    fn theme_fill_resolves_through_palette() {
        let mut doc = WorkbookDocument::new();
        let themed = doc.styles.intern(StyleRecord {
            fill: Some(Color::theme(5, 0.0)),
            ..Default::default()
        });
        let sheet = doc.sheet_mut_or_create("S");
        sheet.set_value(0, 0, CellValue::Text("x".into()));
        sheet.set_style(0, 0, themed);

        let wire = WireConverter::new(&doc).convert();
        let style = wire.styles.values().next().unwrap();
        assert_eq!(style.bg.as_ref().unwrap().rgb, "#C0504D");
    }
}
