//! Plasticity policies
//!
//! The STDP kernel is parameterised over three capabilities, statically
//! dispatched and selected at core construction:
//!
//! - [`WeightDependence`]: how depression/potentiation amounts move a
//!   weight within its saturating bounds;
//! - [`TimingDependence`]: how pre/post traces evolve and how a pre or
//!   post event converts trace state into depression/potentiation amounts;
//! - [`SynapseStructure`]: how per-synapse state is packed into the row's
//!   plastic halfword.
//!
//! Amounts and traces use Q11 fixed point throughout; decay curves are
//! lookup tables built once at initialisation.

mod structure;
mod timing;
mod weight;

pub use structure::{SynapseStructure, WeightOnly};
pub use timing::{NearestPairTiming, NoTrace, PairTiming};
pub use weight::{
    AdditiveWeight, MultiplicativeWeight, UpdateState, WeightDependence, WeightState,
};

use synfire_storage::Tick;

/// Fractional bits of the plasticity fixed-point format
pub const FIXED_SHIFT: u32 = 11;

/// One in Q11
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;

/// Q11 multiply
#[inline]
pub fn fixed_mul(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64) >> FIXED_SHIFT) as i32
}

/// Exponential-decay lookup table over tick deltas
///
/// `get(dt)` approximates `FIXED_ONE * exp(-dt / tau)`; entries are
/// precomputed until they round to zero, and anything past the horizon
/// reads as zero, so stale anchors cannot inject drive.
#[derive(Debug, Clone)]
pub struct DecayLut {
    values: Vec<i32>,
}

impl DecayLut {
    /// Build the table for a time constant in ticks
    pub fn from_tau_ticks(tau_ticks: f32) -> Self {
        assert!(tau_ticks > 0.0);
        let mut values = Vec::new();
        let mut dt = 0u32;
        loop {
            let value = ((-(dt as f32) / tau_ticks).exp() * FIXED_ONE as f32).round() as i32;
            if value == 0 {
                break;
            }
            values.push(value);
            dt += 1;
        }
        Self { values }
    }

    /// Decay factor for a tick delta, in Q11
    #[inline]
    pub fn get(&self, dt: Tick) -> i32 {
        self.values.get(dt as usize).copied().unwrap_or(0)
    }

    /// Deltas covered before the curve rounds to zero
    pub fn horizon(&self) -> usize {
        self.values.len()
    }
}

/// Receiver of depression/potentiation amounts
///
/// The timing dependence converts events into scalar amounts and hands
/// them to a target; during row processing the target is the per-synapse
/// [`UpdateState`], which routes them through the weight dependence.
pub trait SynapticTarget {
    /// Apply a depression amount (Q11)
    fn depress(&mut self, amount: i32);
    /// Apply a potentiation amount (Q11)
    fn potentiate(&mut self, amount: i32);
}

/// Spike-timing rule: trace evolution and event application
pub trait TimingDependence {
    /// Pre-synaptic trace carried in the row header
    type PreTrace: Copy + Default;
    /// Post-synaptic trace carried in the event history
    type PostTrace: Copy + Default;

    /// Words the encoded pre-trace occupies in a plastic row
    fn pre_trace_words(&self) -> usize;

    /// Decode the pre-trace from its row words
    fn decode_pre_trace(&self, words: &[u32]) -> Self::PreTrace;

    /// Encode the pre-trace into its row words
    fn encode_pre_trace(&self, trace: Self::PreTrace, words: &mut [u32]);

    /// Fold a pre-spike at `tick` into the trace last updated at `last_tick`
    fn update_pre_trace(&self, tick: Tick, last_trace: Self::PreTrace, last_tick: Tick)
        -> Self::PreTrace;

    /// Fold a post-spike at `tick` into the trace last updated at `last_tick`
    fn update_post_trace(
        &self,
        tick: Tick,
        last_trace: Self::PostTrace,
        last_tick: Tick,
    ) -> Self::PostTrace;

    /// Consume a pre-synaptic event at `time`
    ///
    /// The neighbourhood tuple carries the event's own trace plus the most
    /// recent opposite- and same-side anchors as seen through the synapse's
    /// delays.
    #[allow(clippy::too_many_arguments)]
    fn apply_pre_spike<S: SynapticTarget>(
        &self,
        target: &mut S,
        time: Tick,
        trace: Self::PreTrace,
        last_pre_time: Tick,
        last_pre_trace: Self::PreTrace,
        last_post_time: Tick,
        last_post_trace: Self::PostTrace,
    );

    /// Consume a post-synaptic event at `time`
    #[allow(clippy::too_many_arguments)]
    fn apply_post_spike<S: SynapticTarget>(
        &self,
        target: &mut S,
        time: Tick,
        trace: Self::PostTrace,
        last_pre_time: Tick,
        last_pre_trace: Self::PreTrace,
        last_post_time: Tick,
        last_post_trace: Self::PostTrace,
    );
}
