mod algorithm;
pub(crate) mod builder;
mod checkpoint;
mod criterion;
mod hyperparams;
mod iter;
mod node;
mod tikz;

pub use algorithm::*;
pub use checkpoint::*;
pub use criterion::*;
pub use hyperparams::*;
pub use iter::*;
pub use node::*;
pub use tikz::*;
