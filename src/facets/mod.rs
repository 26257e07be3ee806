// Facet model and matrix — dimensions, cells and the grid that holds them.

pub mod cell;
pub mod filter;
pub mod table;

pub use cell::{AttributeKind, CellAttribute, CellAttributes, FilterCell};
pub use filter::{global_filter, FilterDimension, FilterValue};
pub use table::TableManager;
