//! GridSync UI Protocol — v1 Frozen Wire Format
//!
//! Canonical message and payload types exchanged with the remote
//! spreadsheet UI, as JSON over a duplex transport. The field names and
//! `type` tags below are frozen: the UI dispatches on them verbatim.
//!
//! Conventions:
//! - All coordinates are 0-based.
//! - Sparse structures omit empty/None fields (`skip_serializing_if`)
//!   to bound payload size.
//! - Cell shape is `{v?, f?, t?, s?}`: value, formula source, type tag,
//!   style id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Cell type tags on the wire.
pub const TYPE_STRING: u8 = 1;
pub const TYPE_NUMBER: u8 = 2;
pub const TYPE_BOOLEAN: u8 = 3;

// =============================================================================
// UI → Backend Messages
// =============================================================================

/// Messages sent by the remote UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A trusted interactive edit of one cell or one contiguous block.
    CellUpdate(CellUpdatePayload),
    /// The user's decision on a previously proposed batch.
    ValidateChange(ValidateChangePayload),
}

/// Direct edit payload: `values[row][col]` holds the new cell content.
/// Rows/cols are sent as numeric strings by the UI grid, hence the maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellUpdatePayload {
    pub sheet: String,
    pub value: BTreeMap<u32, BTreeMap<u32, WireCell>>,
}

/// Per-operation-id accept/refuse decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateChangePayload {
    #[serde(default)]
    pub accepted: Vec<String>,
    #[serde(default)]
    pub refused: Vec<String>,
}

// =============================================================================
// Backend → UI Messages
// =============================================================================

/// Messages sent to the remote UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Operations awaiting the user's accept/refuse decision.
    ProposeUpdates(OperationList),
    /// Operations already applied to the canonical document.
    ApplyDirectUpdates(OperationList),
    /// Full workbook resync.
    WorkbookUpdate(WireWorkbook),
    /// Chat-style notification (assistant banner in the UI).
    ChatMessage(Notice),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationList {
    pub operations: Vec<UiOperation>,
}

/// One operation as shown to the user for review or record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiOperation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: UiOpKind,
    pub description: String,
    pub payload: UiPayload,
}

/// Operation kinds as the UI names them. Coarser than the engine's
/// operation set: bulk imports and high-fidelity copies both surface as
/// `REPLACE_SHEET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiOpKind {
    CreateSheet,
    DeleteSheet,
    UpdateCell,
    ReplaceSheet,
}

/// UI instruction payload. Untagged: the UI distinguishes variants by
/// shape, keyed off the operation kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiPayload {
    /// Full sheet replacement data (REPLACE_SHEET).
    Sheet(Box<WireSheet>),
    /// Single cell edit (UPDATE_CELL).
    CellEdit {
        sheet: String,
        row: u32,
        col: u32,
        value: WireCell,
    },
    /// Sheet-level structural change (CREATE_SHEET / DELETE_SHEET).
    SheetName { sheet: String },
}

/// Chat-style notification, timestamped ISO-8601.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub role: String,
    pub content: String,
    pub timestamp: String,
    /// Set when the notice reports a failed commit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

// =============================================================================
// Wire workbook shapes
// =============================================================================

/// Full-document projection (`workbook_update`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireWorkbook {
    pub id: String,
    pub name: String,
    pub locale: String,
    /// Deduplicated style registry: style id → definition.
    pub styles: BTreeMap<String, WireStyle>,
    pub sheets: BTreeMap<String, WireSheet>,
    pub sheet_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defined_names: Vec<WireDefinedName>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireDefinedName {
    pub n: String,
    #[serde(rename = "formulaRefOrString")]
    pub formula_ref_or_string: String,
}

/// Single-sheet projection. Standalone payloads (ReplaceSheet operations)
/// embed their own style registry; inside a `WireWorkbook` the registry
/// lives at workbook level and `styles` here stays empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSheet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tab_color: String,
    pub hidden: u8,
    pub row_count: u32,
    pub column_count: u32,
    #[serde(default = "default_zoom")]
    pub zoom_ratio: f32,
    pub freeze: WireFreeze,
    pub merge_data: Vec<WireMergeRange>,
    /// Sparse row → col → cell map; cells that are both empty and
    /// default-styled are omitted.
    pub cell_data: BTreeMap<u32, BTreeMap<u32, WireCell>>,
    pub row_data: BTreeMap<u32, WireRowProps>,
    pub column_data: BTreeMap<u32, WireColProps>,
    /// Compacted rectangles covering empty-but-styled cells.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style_regions: Vec<WireStyleRegion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, WireStyle>,
}

fn default_zoom() -> f32 {
    1.0
}

/// Frozen panes; -1 start coordinates mean "no freeze".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFreeze {
    pub start_row: i32,
    pub start_column: i32,
    pub x_split: i32,
    pub y_split: i32,
}

impl Default for WireFreeze {
    fn default() -> Self {
        Self { start_row: -1, start_column: -1, x_split: 0, y_split: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMergeRange {
    pub start_row: u32,
    pub end_row: u32,
    pub start_column: u32,
    pub end_column: u32,
}

/// One axis-aligned rectangle of cells sharing a style id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStyleRegion {
    pub start_row: u32,
    pub end_row: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub s: String,
}

/// `{v?, f?, t?, s?}` — the per-cell wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
}

impl WireCell {
    pub fn is_empty(&self) -> bool {
        self.v.is_none() && self.f.is_none() && self.t.is_none() && self.s.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireRowProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireColProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd: Option<u8>,
}

// =============================================================================
// Wire styles
// =============================================================================

/// Deduplicated style definition. Only non-default attributes appear;
/// documented defaults are size 11, font Calibri, white background, black
/// text, "General" number format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireStyle {
    /// Font family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ff: Option<String>,
    /// Font size in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<f32>,
    /// Bold flag (1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bl: Option<u8>,
    /// Italic flag (1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<u8>,
    /// Underline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ul: Option<WireToggle>,
    /// Strikethrough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub st: Option<WireToggle>,
    /// Font color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cl: Option<WireColor>,
    /// Background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<WireColor>,
    /// Borders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bd: Option<WireBorders>,
    /// Horizontal alignment: 1=left 2=center 3=right 4=justify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ht: Option<u8>,
    /// Vertical alignment: 1=top 2=center 3=bottom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vt: Option<u8>,
    /// Text wrap: 3=wrap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tb: Option<u8>,
    /// Text rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tr: Option<WireRotation>,
    /// Number format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<WireNumberFormat>,
}

impl WireStyle {
    pub fn is_default(&self) -> bool {
        *self == WireStyle::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireToggle {
    pub s: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireColor {
    pub rgb: String,
}

impl WireColor {
    pub fn new(hex: &str) -> Self {
        Self { rgb: format!("#{hex}") }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireBorders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<WireBorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<WireBorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<WireBorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<WireBorderSide>,
}

impl WireBorders {
    pub fn is_empty(&self) -> bool {
        self.t.is_none() && self.b.is_none() && self.l.is_none() && self.r.is_none()
    }
}

/// Border side: line style code plus color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireBorderSide {
    pub s: u8,
    pub cl: WireColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRotation {
    pub a: i16,
    pub v: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireNumberFormat {
    pub pattern: String,
}
