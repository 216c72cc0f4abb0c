//! Plastic (STDP) row kernel
//!
//! Plastic rows are updated lazily: nothing happens to a synapse between
//! pre-spikes. When a row arrives, because its pre-neuron spiked or as a
//! flush, the kernel replays the post-event history that accumulated since
//! the row's last update, interleaving it with the pending pre-spike, and
//! rewrites the plastic halfwords in place. A flush commits pending
//! post-events without a pre-spike: traces and state update, but no weight
//! is deposited and the pre-side bookkeeping is untouched.

use crate::error::Result;
use crate::history::PostEventHistory;
use crate::plasticity::{SynapseStructure, TimingDependence, UpdateState, WeightDependence};
use synfire_storage::{PlasticRow, SynapseCodec, Tick, WriteSpan};

/// Deferred-update kernel for one plasticity configuration
#[derive(Debug)]
pub struct PlasticKernel<T, W, S> {
    codec: SynapseCodec,
    timing: T,
    weight: W,
    structure: S,
}

impl<T, W, S> PlasticKernel<T, W, S>
where
    T: TimingDependence,
    W: WeightDependence,
    S: SynapseStructure,
{
    /// Assemble a kernel from its policies
    pub fn new(codec: SynapseCodec, timing: T, weight: W, structure: S) -> Self {
        Self {
            codec,
            timing,
            weight,
            structure,
        }
    }

    /// Words the pre-trace occupies in rows this kernel processes
    pub fn pre_trace_words(&self) -> usize {
        self.timing.pre_trace_words()
    }

    /// The timing dependence driving this kernel
    pub fn timing(&self) -> &T {
        &self.timing
    }

    /// Record a post-neuron firing at `tick` into the event history
    pub fn record_post_spike(
        &self,
        history: &mut PostEventHistory<T::PostTrace>,
        neuron: usize,
        tick: Tick,
    ) {
        let last_time = history.last_time(neuron);
        let last_trace = history.last_trace(neuron);
        let trace = self.timing.update_post_trace(tick, last_trace, last_time);
        history.add(neuron, tick, trace);
    }

    /// Run the deferred update of one row
    ///
    /// Returns the span of `row` that must be written back to the shared
    /// store: the header tail, the pre-trace and the plastic region. The
    /// control region is never part of the span.
    pub fn process_row<A, D>(
        &self,
        row: &mut [u32],
        tick: Tick,
        flush: bool,
        history: &PostEventHistory<T::PostTrace>,
        mut apply_input: A,
        mut add_delay_row: D,
    ) -> Result<WriteSpan>
    where
        A: FnMut(Tick, usize, u32),
        D: FnMut(Tick, u32),
    {
        let mut row = PlasticRow::new(row, self.timing.pre_trace_words())?;

        if let Some(ext) = row.delay_extension() {
            add_delay_row(tick + ext.tick_offset, ext.locator_word);
        }

        let last_update_tick = row.last_update_tick();
        row.set_last_update_tick(tick);

        let last_pre_tick = row.last_pre_tick();
        let last_pre_trace = self.timing.decode_pre_trace(row.pre_trace());
        let new_pre_trace = if flush {
            last_pre_trace
        } else {
            let trace = self
                .timing
                .update_pre_trace(tick, last_pre_trace, last_pre_tick);
            row.set_last_pre_tick(tick);
            self.timing.encode_pre_trace(trace, row.pre_trace_mut());
            trace
        };

        // Axonal delay is not modelled on this core type
        let delay_axonal: Tick = 0;
        let delayed_last_pre = last_pre_tick + delay_axonal;

        for i in 0..row.synapse_count() {
            let control = row.control_halfword(i);
            let post_index = self.codec.control_index(control) as usize;
            let delay_dendritic = self.codec.control_delay(control);

            let state = self.structure.from_plastic_word(row.plastic_halfword(i));
            let mut update = UpdateState::new(&self.weight, self.structure.initial_weight(state));

            // Post events are compared in pre-arrival time: shift the window
            // back by the dendritic delay.
            let window_begin = (last_update_tick + delay_axonal).saturating_sub(delay_dendritic);
            let window_end = (tick + delay_axonal).saturating_sub(delay_dendritic);
            let mut window = history.window(post_index, window_begin, window_end);

            while window.num_events() > 0 {
                let delayed_post = window.next_time() + delay_dendritic;
                self.timing.apply_post_spike(
                    &mut update,
                    delayed_post,
                    window.next_trace(),
                    delayed_last_pre,
                    last_pre_trace,
                    window.prev_time(),
                    window.prev_trace(),
                );
                window.advance(delayed_post);
            }

            if !flush {
                self.timing.apply_pre_spike(
                    &mut update,
                    tick + delay_axonal,
                    new_pre_trace,
                    delayed_last_pre,
                    last_pre_trace,
                    window.prev_time(),
                    window.prev_trace(),
                );
            }

            let final_weight = update.final_weight();
            if !flush {
                apply_input(
                    tick + delay_axonal + delay_dendritic,
                    post_index,
                    final_weight as u32,
                );
            }

            let state = self.structure.with_final_weight(state, final_weight);
            row.set_plastic_halfword(i, self.structure.to_plastic_word(state));
        }

        Ok(row.write_span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plasticity::{AdditiveWeight, NearestPairTiming, PairTiming, WeightOnly, FIXED_ONE};
    use synfire_storage::build_plastic_row;

    fn codec() -> SynapseCodec {
        SynapseCodec::default()
    }

    fn additive() -> AdditiveWeight {
        AdditiveWeight {
            w_min: 0,
            w_max: 0xFFFF,
            a2_plus: FIXED_ONE,
            a2_minus: FIXED_ONE,
        }
    }

    fn pair_kernel() -> PlasticKernel<PairTiming, AdditiveWeight, WeightOnly> {
        PlasticKernel::new(codec(), PairTiming::new(20.0, 20.0), additive(), WeightOnly)
    }

    #[test]
    fn test_header_bookkeeping_on_spike() {
        let kernel = pair_kernel();
        let history = PostEventHistory::new(16, 8);
        let controls = [codec().encode_control(3, 1)];
        let mut row = build_plastic_row(1, None, &controls, &[500]);

        kernel
            .process_row(&mut row, 10, false, &history, |_, _, _| {}, |_, _| {})
            .unwrap();

        let view = PlasticRow::new(&mut row, 1).unwrap();
        assert_eq!(view.last_update_tick(), 10);
        assert_eq!(view.last_pre_tick(), 10);
    }

    #[test]
    fn test_flush_leaves_pre_side_untouched() {
        let kernel = pair_kernel();
        let history = PostEventHistory::new(16, 8);
        let controls = [codec().encode_control(3, 1)];
        let mut row = build_plastic_row(1, None, &controls, &[500]);

        kernel
            .process_row(
                &mut row,
                1000,
                true,
                &history,
                |_, _, _| panic!("flush must not deposit"),
                |_, _| {},
            )
            .unwrap();

        let view = PlasticRow::new(&mut row, 1).unwrap();
        assert_eq!(view.last_update_tick(), 1000);
        assert_eq!(view.last_pre_tick(), 0);
        assert_eq!(view.plastic_halfword(0), 500);
    }

    #[test]
    fn test_write_span_excludes_control_region() {
        let kernel = pair_kernel();
        let history = PostEventHistory::new(16, 8);
        let controls = [codec().encode_control(0, 1), codec().encode_control(1, 1)];
        let mut row = build_plastic_row(1, None, &controls, &[10, 20]);

        let span = kernel
            .process_row(&mut row, 5, false, &history, |_, _, _| {}, |_, _| {})
            .unwrap();
        // Header tail (2) + pre-trace (1) + plastic (1)
        assert_eq!(span.offset, 3);
        assert_eq!(span.words, 4);
    }

    #[test]
    fn test_deposits_match_final_weights() {
        let kernel = pair_kernel();
        let mut history = PostEventHistory::new(16, 8);
        kernel.record_post_spike(&mut history, 2, 4);

        let controls = [
            codec().encode_control(2, 1),
            codec().encode_control(5, 2),
        ];
        let mut row = build_plastic_row(1, None, &controls, &[300, 400]);

        let mut deposits = Vec::new();
        kernel
            .process_row(
                &mut row,
                10,
                false,
                &history,
                |tick, post, weight| deposits.push((tick, post, weight)),
                |_, _| {},
            )
            .unwrap();

        let view = PlasticRow::new(&mut row, 1).unwrap();
        assert_eq!(deposits.len(), 2);
        assert_eq!(deposits[0].0, 11);
        assert_eq!(deposits[1].0, 12);
        for (i, &(_, post, weight)) in deposits.iter().enumerate() {
            assert_eq!(post, codec().control_index(controls[i]) as usize);
            assert_eq!(weight, view.plastic_halfword(i) as u32);
        }
    }

    #[test]
    fn test_nearest_pair_single_crossing() {
        // Pre at 0 (row sentinel), post at 7, pre at 10: one potentiation at
        // delta 7 and one depression at delta 3.
        let timing = NearestPairTiming::new(20.0, 20.0);
        let weight = AdditiveWeight {
            w_min: 0,
            w_max: 2000,
            a2_plus: FIXED_ONE,
            a2_minus: FIXED_ONE,
        };
        let kernel = PlasticKernel::new(codec(), timing, weight, WeightOnly);

        let mut history = PostEventHistory::new(16, 8);
        kernel.record_post_spike(&mut history, 0, 7);

        let controls = [codec().encode_control(0, 0)];
        let mut row = build_plastic_row(0, None, &controls, &[1000]);

        let mut deposits = Vec::new();
        kernel
            .process_row(
                &mut row,
                10,
                false,
                &history,
                |_, _, weight| deposits.push(weight),
                |_, _| {},
            )
            .unwrap();

        let lut = crate::plasticity::DecayLut::from_tau_ticks(20.0);
        let expected = 1000 + lut.get(7) - lut.get(3);
        assert_eq!(deposits, vec![expected as u32]);

        let view = PlasticRow::new(&mut row, 0).unwrap();
        assert_eq!(view.plastic_halfword(0) as i32, expected);
    }

    #[test]
    fn test_delay_extension_passed_through() {
        let kernel = pair_kernel();
        let history = PostEventHistory::new(16, 8);
        let mut row = build_plastic_row(
            1,
            Some(synfire_storage::DelayExtension {
                tick_offset: 4,
                locator_word: 0x99,
            }),
            &[],
            &[],
        );

        let mut extensions = Vec::new();
        kernel
            .process_row(
                &mut row,
                10,
                true,
                &history,
                |_, _, _| {},
                |target, locator| extensions.push((target, locator)),
            )
            .unwrap();
        assert_eq!(extensions, vec![(14, 0x99)]);
    }

    #[test]
    fn test_flush_is_idempotent() {
        let kernel = pair_kernel();
        let mut history = PostEventHistory::new(16, 8);
        kernel.record_post_spike(&mut history, 1, 3);

        let controls = [codec().encode_control(1, 1)];
        let mut row = build_plastic_row(1, None, &controls, &[600]);

        kernel
            .process_row(&mut row, 50, true, &history, |_, _, _| {}, |_, _| {})
            .unwrap();
        let after_first = row.clone();

        kernel
            .process_row(&mut row, 50, true, &history, |_, _, _| {}, |_, _| {})
            .unwrap();
        assert_eq!(row, after_first);
    }
}
