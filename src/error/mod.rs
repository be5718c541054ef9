use thiserror::Error;

use crate::data::grid::GridError;
use crate::dro::DroError;
use crate::signal::SignalError;
use crate::tissue::TissueError;

/// Any error produced by this crate
#[derive(Error, Debug)]
pub enum PerfusionError {
    #[error(transparent)]
    Tissue(#[from] TissueError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Dro(#[from] DroError),
}
