pub mod auc;
pub mod grid;
pub mod units;

pub use grid::{arange, linspace, GridError, UniformGrid};
pub use units::{Flow, Rate};
