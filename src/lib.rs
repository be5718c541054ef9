//! Pharmacokinetic tissue models for DCE-MRI
//!
//! Forward models that turn an arterial input function into tissue
//! concentration curves ([`tissue`]), the convolution machinery behind them
//! ([`convolution`]), population AIFs ([`aif`]), signal-to-concentration
//! conversion ([`signal`]) and voxel-wise simulation and fitting over
//! parameter maps ([`dro`]).

pub mod aif;
pub mod convolution;
pub mod data;
pub mod dro;
pub mod error;
pub mod signal;
pub mod tissue;

pub use crate::aif::{parker, ParkerAif};
pub use crate::data::units::{Flow, Rate};
pub use crate::tissue::{
    extended_tofts, tofts, two_compartment_exchange_model, Discretization, ModelOptions,
    TissueModel, TissueResponse,
};
pub use error::PerfusionError;

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            auc::{cumulative_trapezoid, trapezoid},
            grid::{is_uniform, GridError, UniformGrid},
        };
    }
    pub mod dro {
        pub use crate::dro::{
            fit_extended_tofts, fit_tofts, forward_extended_tofts_map, forward_tofts_map,
            murase_fit, DroError, FitOptions,
        };
    }

    pub use crate::aif::{parker, ParkerAif};
    pub use crate::data::auc::trapezoid;
    pub use crate::data::grid::{arange, linspace};
    pub use crate::data::units::{Flow, Rate};
    pub use crate::error::PerfusionError;
    pub use crate::tissue::{
        extended_tofts, tofts, two_compartment_exchange_model, Compartments, Discretization,
        ExtendedTofts, ModelOptions, ParameterError, TissueError, TissueModel, TissueResponse,
        Tofts, TwoCompartmentExchange,
    };
}
