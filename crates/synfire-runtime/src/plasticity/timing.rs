//! Timing-dependence policies
//!
//! Two canonical STDP variants. The pair rule keeps accumulating traces so
//! every pre/post crossing contributes; the nearest-pair rule keeps no
//! traces at all and differences only against the nearest opposite-side
//! event.

use super::{fixed_mul, DecayLut, SynapticTarget, TimingDependence, FIXED_ONE};
use synfire_storage::{PlasticityParams, Tick};

/// Pair-based STDP: all-to-all crossings via accumulating traces
#[derive(Debug, Clone)]
pub struct PairTiming {
    tau_plus: DecayLut,
    tau_minus: DecayLut,
}

impl PairTiming {
    /// Build the decay tables for the given time constants (ticks)
    pub fn new(tau_plus_ticks: f32, tau_minus_ticks: f32) -> Self {
        Self {
            tau_plus: DecayLut::from_tau_ticks(tau_plus_ticks),
            tau_minus: DecayLut::from_tau_ticks(tau_minus_ticks),
        }
    }

    /// Build from a PlasticityData region
    pub fn from_params(params: &PlasticityParams) -> Self {
        Self::new(params.tau_plus_ticks as f32, params.tau_minus_ticks as f32)
    }
}

impl TimingDependence for PairTiming {
    type PreTrace = u16;
    type PostTrace = u16;

    fn pre_trace_words(&self) -> usize {
        1
    }

    fn decode_pre_trace(&self, words: &[u32]) -> u16 {
        (words[0] & 0xFFFF) as u16
    }

    fn encode_pre_trace(&self, trace: u16, words: &mut [u32]) {
        words[0] = trace as u32;
    }

    fn update_pre_trace(&self, tick: Tick, last_trace: u16, last_tick: Tick) -> u16 {
        let decayed = fixed_mul(last_trace as i32, self.tau_plus.get(tick - last_tick));
        (decayed + FIXED_ONE).min(u16::MAX as i32) as u16
    }

    fn update_post_trace(&self, tick: Tick, last_trace: u16, last_tick: Tick) -> u16 {
        let decayed = fixed_mul(last_trace as i32, self.tau_minus.get(tick - last_tick));
        (decayed + FIXED_ONE).min(u16::MAX as i32) as u16
    }

    fn apply_pre_spike<S: SynapticTarget>(
        &self,
        target: &mut S,
        time: Tick,
        _trace: u16,
        _last_pre_time: Tick,
        _last_pre_trace: u16,
        last_post_time: Tick,
        last_post_trace: u16,
    ) {
        // Depress against the accumulated post activity decayed to now
        let dt = time.saturating_sub(last_post_time);
        if dt > 0 {
            let amount = fixed_mul(last_post_trace as i32, self.tau_minus.get(dt));
            target.depress(amount);
        }
    }

    fn apply_post_spike<S: SynapticTarget>(
        &self,
        target: &mut S,
        time: Tick,
        _trace: u16,
        last_pre_time: Tick,
        last_pre_trace: u16,
        _last_post_time: Tick,
        _last_post_trace: u16,
    ) {
        // Potentiate against the accumulated pre activity decayed to now
        let dt = time.saturating_sub(last_pre_time);
        if dt > 0 {
            let amount = fixed_mul(last_pre_trace as i32, self.tau_plus.get(dt));
            target.potentiate(amount);
        }
    }
}

/// Marker trace for rules that keep no history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoTrace;

/// Nearest-pair STDP: only the nearest opposite-side event contributes
#[derive(Debug, Clone)]
pub struct NearestPairTiming {
    tau_plus: DecayLut,
    tau_minus: DecayLut,
}

impl NearestPairTiming {
    /// Build the decay tables for the given time constants (ticks)
    pub fn new(tau_plus_ticks: f32, tau_minus_ticks: f32) -> Self {
        Self {
            tau_plus: DecayLut::from_tau_ticks(tau_plus_ticks),
            tau_minus: DecayLut::from_tau_ticks(tau_minus_ticks),
        }
    }

    /// Build from a PlasticityData region
    pub fn from_params(params: &PlasticityParams) -> Self {
        Self::new(params.tau_plus_ticks as f32, params.tau_minus_ticks as f32)
    }
}

impl TimingDependence for NearestPairTiming {
    type PreTrace = NoTrace;
    type PostTrace = NoTrace;

    fn pre_trace_words(&self) -> usize {
        0
    }

    fn decode_pre_trace(&self, _words: &[u32]) -> NoTrace {
        NoTrace
    }

    fn encode_pre_trace(&self, _trace: NoTrace, _words: &mut [u32]) {}

    fn update_pre_trace(&self, _tick: Tick, _last: NoTrace, _last_tick: Tick) -> NoTrace {
        NoTrace
    }

    fn update_post_trace(&self, _tick: Tick, _last: NoTrace, _last_tick: Tick) -> NoTrace {
        NoTrace
    }

    fn apply_pre_spike<S: SynapticTarget>(
        &self,
        target: &mut S,
        time: Tick,
        _trace: NoTrace,
        _last_pre_time: Tick,
        _last_pre_trace: NoTrace,
        last_post_time: Tick,
        _last_post_trace: NoTrace,
    ) {
        let dt = time.saturating_sub(last_post_time);
        if dt > 0 {
            target.depress(self.tau_minus.get(dt));
        }
    }

    fn apply_post_spike<S: SynapticTarget>(
        &self,
        target: &mut S,
        time: Tick,
        _trace: NoTrace,
        last_pre_time: Tick,
        _last_pre_trace: NoTrace,
        _last_post_time: Tick,
        _last_post_trace: NoTrace,
    ) {
        let dt = time.saturating_sub(last_pre_time);
        if dt > 0 {
            target.potentiate(self.tau_plus.get(dt));
        }
    }
}
