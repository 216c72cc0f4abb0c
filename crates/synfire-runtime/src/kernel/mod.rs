//! Row-processing kernels
//!
//! One kernel per row layout: [`process_fixed_row`] applies a fixed-weight
//! row straight into the ring, [`PlasticKernel`] runs the deferred STDP
//! update before depositing. Both report delay extensions through a
//! callback instead of touching the delay-row buffer directly, so they stay
//! free of scheduler state.

mod fixed;
mod plastic;

pub use fixed::process_fixed_row;
pub use plastic::PlasticKernel;
