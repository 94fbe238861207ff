pub mod grid;

pub use grid::SparseHashGrid;
