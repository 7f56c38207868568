mod act_fn;
mod activation;
mod softmax;

pub use act_fn::ActFn;
pub use activation::Activation;
pub use softmax::{softmax_rows, softmax_rows_backward};
