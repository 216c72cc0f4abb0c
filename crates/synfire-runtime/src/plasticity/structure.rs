//! Synapse-structure policies
//!
//! The structure policy owns the plastic halfword layout: how a synapse's
//! stored state becomes a running update state and how the finished state
//! packs back into the row.

/// In-row plastic word layout and per-synapse state
pub trait SynapseStructure {
    /// Decoded per-synapse state
    type State: Copy;

    /// Unpack a plastic halfword
    fn from_plastic_word(&self, word: u16) -> Self::State;

    /// Pack state back into a plastic halfword
    fn to_plastic_word(&self, state: Self::State) -> u16;

    /// The weight held by the state when the update begins
    fn initial_weight(&self, state: Self::State) -> u16;

    /// Install the weight produced by the update
    fn with_final_weight(&self, state: Self::State, weight: u16) -> Self::State;
}

/// The plastic halfword is exactly the weight
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightOnly;

impl SynapseStructure for WeightOnly {
    type State = u16;

    fn from_plastic_word(&self, word: u16) -> u16 {
        word
    }

    fn to_plastic_word(&self, state: u16) -> u16 {
        state
    }

    fn initial_weight(&self, state: u16) -> u16 {
        state
    }

    fn with_final_weight(&self, _state: u16, weight: u16) -> u16 {
        weight
    }
}
