//! Step-by-step training loops that can be stopped from another thread.

mod session;
mod trainer;

pub use session::{NetworkSession, TransformerSession};
pub use trainer::{StopFlag, Trainer, TrainingLoop};
