//! Per-core synapse-processing engine for the synfire runtime
//!
//! This crate is the compute side of the synapse core: the delay-indexed
//! input ring, the spike input queue, the delay-row buffer, post-event
//! history, the plasticity policies, the fixed and plastic row kernels, and
//! the tick scheduler that pipelines row fetches against row processing.
//! Everything that lives in the shared store comes from `synfire-storage`.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export essential types from storage
pub use synfire_storage::{
    KeyLookup, KeyRange, MemoryStore, PlasticityParams, RegionId, RegionTable, RowLocator,
    SharedStore, StorageError, SynapseCodec, Tick, TimingMode, WeightMode,
};

// Core modules
pub mod delay;
pub mod error;
pub mod history;
pub mod kernel;
pub mod pipeline;
pub mod plasticity;
pub mod queue;
pub mod ring;
pub mod stimulus;

// Re-export essential types
pub use delay::{DelayRowBuffer, DelayedRow};
pub use error::{Result, RuntimeError};
pub use history::{PostEventHistory, PostEventWindow};
pub use kernel::{process_fixed_row, PlasticKernel};
pub use pipeline::{CoreConfig, RegionConfig, SynapseCore, TickCounters};
pub use plasticity::{
    AdditiveWeight, DecayLut, MultiplicativeWeight, NearestPairTiming, NoTrace, PairTiming,
    SynapseStructure, SynapticTarget, TimingDependence, UpdateState, WeightDependence, WeightOnly,
    WeightState,
};
pub use queue::SpikeQueue;
pub use ring::InputRing;
pub use stimulus::PoissonSource;

/// Runtime crate version for compatibility checking
pub const RUNTIME_VERSION: u32 = 1;
