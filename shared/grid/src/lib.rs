pub use grid_impl::{DynamicGrid, GridCoord};

mod grid_impl;
