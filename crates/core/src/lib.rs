//! # ucmonitor Core
//!
//! Core types, traits and I/O for the ucmonitor overlap toolkit.
//!
//! This crate provides:
//! - `FeatureCollection`: vector layers with attributes and a CRS
//! - `CRS` and `Transformer`: coordinate reference systems and reprojection
//! - `Table`: attribute-only records for tabular sources
//! - Algorithm traits for consistent API
//! - GeoJSON I/O

pub mod crs;
pub mod error;
pub mod io;
pub mod table;
pub mod vector;

pub use crs::{Transformer, CRS};
pub use error::{Error, Result};
pub use table::{Record, Table};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{Transformer, CRS};
    pub use crate::error::{Error, Result};
    pub use crate::table::{Record, Table};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in ucmonitor.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
