pub mod arch;
pub mod clustering;
pub mod dataset;
pub mod descent;
pub mod error;
pub mod initialization;
pub mod math;
pub mod network;
pub mod optimization;
pub mod regression;
pub mod training;
pub mod transformer;

pub use error::{MlErr, Result};
