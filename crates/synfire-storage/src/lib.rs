//! Shared-store formats for the synfire synapse-processing core
//!
//! This crate defines everything that lives in or describes the shared
//! off-chip store: the bit-packed synaptic row formats, the routing-key
//! lookup table, the configuration region blob, the store access contract,
//! and the off-line matrix generator that produces packed rows.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod error;
pub mod lookup;
pub mod matrix;
pub mod regions;
pub mod row;
pub mod store;

// Re-export essential types
pub use error::{Result, StorageError};
pub use lookup::{KeyLookup, KeyRange, RowLocator, KEY_RANGE_WORDS};
pub use matrix::{
    AllToAllConnector, ConstantDelay, ConstantWeight, Connector, DelayGenerator,
    FixedProbabilityConnector, MatrixConfig, MatrixGenerator, UniformDelay, UniformWeight,
    WeightGenerator, MAX_ROW_SYNAPSES,
};
pub use regions::{
    checksum_words, OutputBufferRegion, PlasticityParams, PoissonRegion, RecordingRegion,
    RegionBlobBuilder, RegionId, RegionTable, SystemRegion, TimingMode, WeightMode,
    CONFIG_MAGIC, CONFIG_VERSION,
};
pub use row::{
    build_plastic_row, DelayExtension, FixedRow, PlasticRow, PlasticRowLayout, SynapseCodec,
    WriteSpan, FIXED_HEADER_WORDS, PLASTIC_HEADER_WORDS,
};
pub use store::{MemoryStore, SharedStore};

/// A discrete simulation time step; tick 0 is initialisation and doubles as
/// the "never" sentinel in row headers and event history
pub type Tick = u32;

/// Storage crate version for compatibility checking
pub const STORAGE_VERSION: u32 = 1;
