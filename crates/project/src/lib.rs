//! SWAT+ project text files: fixed-layout parsers, connectivity reporting,
//! and validators for hand-authored data files.

pub mod connectivity;
pub mod constituents;
pub mod error;
pub mod model;
pub mod parse;
pub mod water;

pub use connectivity::{BurnImpact, Connectivity};
pub use error::{ProjectError, Result};
pub use model::{Hru, ObjectCount, Outlet, RoutingUnit};
