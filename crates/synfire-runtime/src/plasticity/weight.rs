//! Weight-dependence policies

use super::{fixed_mul, SynapticTarget};
use crate::error::{Result, RuntimeError};
use synfire_storage::PlasticityParams;

/// Per-synapse running state during a deferred update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightState {
    /// Current weight (raw fixed-point)
    pub weight: i32,
    /// Accumulated potentiation (Q11), for rules that defer application
    pub potentiation: i32,
    /// Accumulated depression (Q11), for rules that defer application
    pub depression: i32,
}

impl WeightState {
    /// Start from a row weight
    pub fn new(weight: u16) -> Self {
        Self {
            weight: weight as i32,
            potentiation: 0,
            depression: 0,
        }
    }
}

/// How depression/potentiation amounts move a weight within its bounds
pub trait WeightDependence {
    /// Fold a depression amount (Q11) into the state
    fn apply_depression(&self, state: &mut WeightState, amount: i32);

    /// Fold a potentiation amount (Q11) into the state
    fn apply_potentiation(&self, state: &mut WeightState, amount: i32);

    /// Extract the bounded weight to store and deposit
    fn final_weight(&self, state: &WeightState) -> u16;

    /// Lower weight bound
    fn min_weight(&self) -> u16;

    /// Upper weight bound
    fn max_weight(&self) -> u16;
}

// The region blob stores every field as a u32 word; narrow to the rule's
// field widths with an explicit guard rather than a silent truncation.
fn weight_bound(value: u32, parameter: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        RuntimeError::invalid_parameter(parameter, value.to_string(), "<= 65535")
    })
}

fn scale_factor(value: u32, parameter: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        RuntimeError::invalid_parameter(parameter, value.to_string(), "a Q11 scale fitting i32")
    })
}

/// Additive rule: fixed-scale steps, clamped at the bounds on extraction
#[derive(Debug, Clone, Copy)]
pub struct AdditiveWeight {
    /// Minimum weight
    pub w_min: u16,
    /// Maximum weight
    pub w_max: u16,
    /// Potentiation scale (Q11)
    pub a2_plus: i32,
    /// Depression scale (Q11)
    pub a2_minus: i32,
}

impl AdditiveWeight {
    /// Build from a PlasticityData region
    pub fn from_params(params: &PlasticityParams) -> Result<Self> {
        Ok(Self {
            w_min: weight_bound(params.w_min, "w_min")?,
            w_max: weight_bound(params.w_max, "w_max")?,
            a2_plus: scale_factor(params.a2_plus, "a2_plus")?,
            a2_minus: scale_factor(params.a2_minus, "a2_minus")?,
        })
    }
}

impl WeightDependence for AdditiveWeight {
    fn apply_depression(&self, state: &mut WeightState, amount: i32) {
        state.depression += amount;
    }

    fn apply_potentiation(&self, state: &mut WeightState, amount: i32) {
        state.potentiation += amount;
    }

    fn final_weight(&self, state: &WeightState) -> u16 {
        let delta =
            fixed_mul(state.potentiation, self.a2_plus) - fixed_mul(state.depression, self.a2_minus);
        (state.weight + delta).clamp(self.w_min as i32, self.w_max as i32) as u16
    }

    fn min_weight(&self) -> u16 {
        self.w_min
    }

    fn max_weight(&self) -> u16 {
        self.w_max
    }
}

/// Multiplicative rule: each step scaled by the distance to the bound it
/// moves toward, applied as it arrives
#[derive(Debug, Clone, Copy)]
pub struct MultiplicativeWeight {
    /// Minimum weight
    pub w_min: u16,
    /// Maximum weight
    pub w_max: u16,
    /// Potentiation scale (Q11)
    pub a2_plus: i32,
    /// Depression scale (Q11)
    pub a2_minus: i32,
}

impl MultiplicativeWeight {
    /// Build from a PlasticityData region
    pub fn from_params(params: &PlasticityParams) -> Result<Self> {
        Ok(Self {
            w_min: weight_bound(params.w_min, "w_min")?,
            w_max: weight_bound(params.w_max, "w_max")?,
            a2_plus: scale_factor(params.a2_plus, "a2_plus")?,
            a2_minus: scale_factor(params.a2_minus, "a2_minus")?,
        })
    }
}

impl WeightDependence for MultiplicativeWeight {
    fn apply_depression(&self, state: &mut WeightState, amount: i32) {
        let headroom = state.weight - self.w_min as i32;
        state.weight -= fixed_mul(fixed_mul(amount, self.a2_minus), headroom);
    }

    fn apply_potentiation(&self, state: &mut WeightState, amount: i32) {
        let headroom = self.w_max as i32 - state.weight;
        state.weight += fixed_mul(fixed_mul(amount, self.a2_plus), headroom);
    }

    fn final_weight(&self, state: &WeightState) -> u16 {
        state.weight.clamp(self.w_min as i32, self.w_max as i32) as u16
    }

    fn min_weight(&self) -> u16 {
        self.w_min
    }

    fn max_weight(&self) -> u16 {
        self.w_max
    }
}

/// A synapse mid-update: weight state routed through its weight dependence
///
/// Implements [`SynapticTarget`] so the timing dependence can hand it
/// depression/potentiation amounts without knowing the weight rule.
#[derive(Debug)]
pub struct UpdateState<'a, W: WeightDependence> {
    rule: &'a W,
    state: WeightState,
}

impl<'a, W: WeightDependence> UpdateState<'a, W> {
    /// Begin updating a synapse holding `weight`
    pub fn new(rule: &'a W, weight: u16) -> Self {
        Self {
            rule,
            state: WeightState::new(weight),
        }
    }

    /// Finish the update, extracting the bounded weight
    pub fn final_weight(&self) -> u16 {
        self.rule.final_weight(&self.state)
    }
}

impl<W: WeightDependence> SynapticTarget for UpdateState<'_, W> {
    fn depress(&mut self, amount: i32) {
        self.rule.apply_depression(&mut self.state, amount);
    }

    fn potentiate(&mut self, amount: i32) {
        self.rule.apply_potentiation(&mut self.state, amount);
    }
}
