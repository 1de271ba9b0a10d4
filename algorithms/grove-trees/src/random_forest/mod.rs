mod algorithm;
mod checkpoint;
mod hyperparams;

pub use algorithm::*;
pub use checkpoint::*;
pub use hyperparams::*;
