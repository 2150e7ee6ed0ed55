// Projection from the canonical document model to the UI wire format.

pub mod compact;
pub mod converter;

pub use compact::{compact_rectangles, ValueRect};
pub use converter::{cell_value_to_wire, wire_to_cell_value, WireConverter};
