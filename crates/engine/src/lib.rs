pub mod cell;
pub mod color;
pub mod document;
pub mod serial;
pub mod sheet;
pub mod style;

pub use cell::{Cell, CellValue};
pub use color::{Color, ThemePalette};
pub use document::{Asset, DefinedName, WorkbookDocument};
pub use sheet::{ColProps, FreezePane, MergedRange, RowProps, Sheet};
pub use style::{StyleId, StyleRecord, StyleTable};
