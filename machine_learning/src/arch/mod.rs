pub mod activations;
mod architecture;
pub mod layers;
pub mod loss;
mod params;
mod sequential;

pub use architecture::{LayerSpec, NetworkArchitecture};
pub use params::{BackIter, FrontIter};
pub use sequential::Sequential;
