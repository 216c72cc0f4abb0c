//! Tick scheduler and row pipeline
//!
//! One [`SynapseCore`] is the whole per-core state: configuration, buffers,
//! kernels and counters, driven by a periodic timer tick. Each tick it
//! promotes due delay-rows, drains the spike queue within its budget,
//! streams the resolved rows through a double-buffered fetch/process
//! pipeline, and hands the current ring slot downstream. Fatal conditions
//! surface as errors before or during `run`; operational events only move
//! counters.

use crate::delay::{DelayRowBuffer, DelayedRow};
use crate::error::{Result, RuntimeError};
use crate::history::PostEventHistory;
use crate::kernel::{process_fixed_row, PlasticKernel};
use crate::plasticity::{SynapseStructure, TimingDependence, WeightDependence};
use crate::queue::SpikeQueue;
use crate::ring::InputRing;
use crate::stimulus::PoissonSource;
use std::sync::Arc;
use synfire_storage::{
    KeyLookup, OutputBufferRegion, PlasticityParams, PoissonRegion, RecordingRegion, RegionId,
    RegionTable, RowLocator, SharedStore, SynapseCodec, SystemRegion, Tick,
};

/// Default spike-processing budget per tick
pub const DEFAULT_SPIKE_BUDGET: usize = 64;

/// Default row-buffer size in words
pub const DEFAULT_MAX_ROW_WORDS: usize = 256;

/// Default post-event history depth
pub const DEFAULT_HISTORY_DEPTH: usize = 8;

/// Per-core configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreConfig {
    /// Timer tick period in microseconds
    pub timer_period_us: u32,
    /// Ticks to simulate before clean termination
    pub simulation_ticks: u32,
    /// Post-neurons driven by this core
    pub num_post: usize,
    /// Row-buffer capacity in words; rows longer than this are fatal
    pub max_row_words: usize,
    /// Spikes processed per tick before the rest stay queued
    pub spike_budget_per_tick: usize,
    /// Spike input queue capacity (power of two)
    pub queue_capacity: usize,
    /// Post-event samples retained per neuron
    pub history_depth: usize,
    /// Delay-row buffer slot count as a power of two
    pub delay_slot_bits: u32,
    /// Delay-row bucket bound
    pub delay_rows_per_slot: usize,
    /// Where the drained ring slot is copied each tick
    pub output_mailbox: Option<u32>,
    /// Where the counters are written at termination
    pub recording_mailbox: Option<u32>,
}

impl CoreConfig {
    /// Create a configuration with defaults for the buffer shapes
    pub fn new(timer_period_us: u32, simulation_ticks: u32, num_post: usize) -> Result<Self> {
        let config = Self {
            timer_period_us,
            simulation_ticks,
            num_post,
            max_row_words: DEFAULT_MAX_ROW_WORDS,
            spike_budget_per_tick: DEFAULT_SPIKE_BUDGET,
            queue_capacity: crate::queue::DEFAULT_SPIKE_QUEUE_CAPACITY,
            history_depth: DEFAULT_HISTORY_DEPTH,
            delay_slot_bits: 6,
            delay_rows_per_slot: 8,
            output_mailbox: None,
            recording_mailbox: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from the configuration regions in the shared store
    ///
    /// Reads System, OutputBuffer and SpikeRecording into the core
    /// configuration, and passes the PlasticityData and PoissonSource
    /// payloads through parsed. Policy selection stays with the caller: the
    /// returned [`PlasticityParams`] feed the `from_params` constructors of
    /// whichever timing/weight variants this core was built for.
    pub fn from_regions(table: &RegionTable<'_>, num_post: usize) -> Result<RegionConfig> {
        let system = SystemRegion::parse(table.require(RegionId::System)?)?;
        let mut core = Self::new(system.timer_period_us, system.simulation_ticks, num_post)?;
        if let Some(payload) = table.region(RegionId::OutputBuffer) {
            core.output_mailbox = Some(OutputBufferRegion::parse(payload)?.mailbox_address);
        }
        if let Some(payload) = table.region(RegionId::SpikeRecording) {
            core.recording_mailbox = Some(RecordingRegion::parse(payload)?.counter_address);
        }
        let plasticity = match table.region(RegionId::PlasticityData) {
            Some(payload) => Some(PlasticityParams::parse(payload)?),
            None => None,
        };
        let poisson = match table.region(RegionId::PoissonSource) {
            Some(payload) => Some(PoissonRegion::parse(payload)?),
            None => None,
        };
        Ok(RegionConfig {
            core,
            plasticity,
            poisson,
        })
    }

    /// Set the row-buffer capacity
    pub fn with_max_row_words(mut self, words: usize) -> Self {
        self.max_row_words = words;
        self
    }

    /// Set the per-tick spike budget
    pub fn with_spike_budget(mut self, budget: usize) -> Self {
        self.spike_budget_per_tick = budget;
        self
    }

    /// Set the output mailbox address
    pub fn with_output_mailbox(mut self, address: u32) -> Self {
        self.output_mailbox = Some(address);
        self
    }

    /// Set the recording mailbox address
    pub fn with_recording_mailbox(mut self, address: u32) -> Self {
        self.recording_mailbox = Some(address);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.simulation_ticks == 0 {
            return Err(RuntimeError::invalid_parameter(
                "simulation_ticks",
                "0",
                "> 0",
            ));
        }
        if self.num_post == 0 {
            return Err(RuntimeError::invalid_parameter("num_post", "0", "> 0"));
        }
        if self.max_row_words < synfire_storage::FIXED_HEADER_WORDS {
            return Err(RuntimeError::invalid_parameter(
                "max_row_words",
                self.max_row_words.to_string(),
                ">= row header",
            ));
        }
        if self.spike_budget_per_tick == 0 {
            return Err(RuntimeError::invalid_parameter(
                "spike_budget_per_tick",
                "0",
                "> 0",
            ));
        }
        Ok(())
    }

    fn post_bits(&self) -> u32 {
        self.num_post.next_power_of_two().trailing_zeros()
    }
}

/// Everything a core's region blob configures
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Core configuration from System, OutputBuffer and SpikeRecording
    pub core: CoreConfig,
    /// STDP parameters, when a PlasticityData region is present
    pub plasticity: Option<PlasticityParams>,
    /// Stimulus parameters, when a PoissonSource region is present
    pub poisson: Option<PoissonRegion>,
}

/// Monotonic diagnostic counters
///
/// Every "counted, continue" event of the error-handling policy lands
/// here; the snapshot is written to the SpikeRecording mailbox at
/// termination.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickCounters {
    /// Ticks executed
    pub ticks_run: u32,
    /// Spikes resolved and processed
    pub spikes_processed: u64,
    /// Spikes dropped on key-lookup miss
    pub spikes_dropped: u64,
    /// Rows fetched from the shared store
    pub rows_fetched: u64,
    /// Plastic rows written back
    pub rows_written_back: u64,
    /// Delay rows replayed at their target tick
    pub delay_rows_replayed: u64,
    /// Spike-queue pushes rejected while full
    pub queue_overflows: u64,
    /// Spike-queue pops attempted while empty
    pub queue_underflows: u64,
    /// Delay rows rejected while their bucket was full
    pub delay_buffer_overflows: u64,
    /// Ring accumulators clamped at their ceiling
    pub ring_saturations: u64,
}

impl TickCounters {
    /// Serialize for the recording mailbox, one u32 per counter
    pub fn to_words(&self) -> Vec<u32> {
        vec![
            self.ticks_run,
            self.spikes_processed as u32,
            self.spikes_dropped as u32,
            self.rows_fetched as u32,
            self.rows_written_back as u32,
            self.delay_rows_replayed as u32,
            self.queue_overflows as u32,
            self.queue_underflows as u32,
            self.delay_buffer_overflows as u32,
            self.ring_saturations as u32,
        ]
    }
}

/// A complete per-core synapse processor
///
/// Generic over the plasticity policies (statically dispatched) and the
/// shared-store implementation.
pub struct SynapseCore<T: TimingDependence, W, S, ST> {
    config: CoreConfig,
    codec: SynapseCodec,
    lookup: KeyLookup,
    kernel: PlasticKernel<T, W, S>,
    store: ST,
    queue: Arc<SpikeQueue>,
    ring: InputRing,
    delay_rows: DelayRowBuffer,
    history: PostEventHistory<T::PostTrace>,
    poisson: Option<PoissonSource>,
    buffers: [Vec<u32>; 2],
    due: Vec<DelayedRow>,
    pending: Vec<(RowLocator, bool)>,
    tick: Tick,
    counters: TickCounters,
}

impl<T, W, S, ST> SynapseCore<T, W, S, ST>
where
    T: TimingDependence,
    W: WeightDependence,
    S: SynapseStructure,
    ST: SharedStore,
{
    /// Allocate a core; all buffers are sized here and never grow
    pub fn new(
        config: CoreConfig,
        codec: SynapseCodec,
        lookup: KeyLookup,
        kernel: PlasticKernel<T, W, S>,
        store: ST,
    ) -> Result<Self> {
        config.validate()?;
        let ring = InputRing::new(codec.delay_bits(), config.post_bits(), config.num_post)?;
        let queue = Arc::new(SpikeQueue::new(config.queue_capacity)?);
        let delay_rows = DelayRowBuffer::new(config.delay_slot_bits, config.delay_rows_per_slot);
        let history = PostEventHistory::new(config.num_post, config.history_depth);
        let buffers = [
            vec![0u32; config.max_row_words],
            vec![0u32; config.max_row_words],
        ];
        log::info!(
            "synapse core ready: {} post-neurons, {} key ranges, {} word row buffers",
            config.num_post,
            lookup.len(),
            config.max_row_words,
        );
        Ok(Self {
            config,
            codec,
            lookup,
            kernel,
            store,
            queue,
            ring,
            delay_rows,
            history,
            poisson: None,
            buffers,
            due: Vec::new(),
            pending: Vec::new(),
            tick: 0,
            counters: TickCounters::default(),
        })
    }

    /// Attach a Poisson stimulus source
    pub fn with_poisson(mut self, source: PoissonSource) -> Self {
        self.poisson = Some(source);
        self
    }

    /// Producer handle for the packet-receive side
    pub fn spike_queue(&self) -> Arc<SpikeQueue> {
        Arc::clone(&self.queue)
    }

    /// Current tick (0 until the first `step`)
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// The shared store
    pub fn store(&self) -> &ST {
        &self.store
    }

    /// Record that post-neuron `neuron` fired during the current tick
    pub fn record_post_spike(&mut self, neuron: usize) {
        self.kernel
            .record_post_spike(&mut self.history, neuron, self.tick);
    }

    /// Counter snapshot including the queue's atomic counts
    pub fn counters(&self) -> TickCounters {
        let mut counters = self.counters;
        counters.queue_overflows = self.queue.overflow_count();
        counters.queue_underflows = self.queue.underflow_count();
        counters.delay_buffer_overflows = self.delay_rows.overflow_count();
        counters.ring_saturations = self.ring.saturation_count();
        counters
    }

    /// Execute one timer tick
    pub fn step(&mut self) -> Result<()> {
        self.tick += 1;
        let tick = self.tick;
        self.counters.ticks_run = tick;

        // 1. Promote delay rows targeting this tick
        self.pending.clear();
        self.due.clear();
        let mut due = std::mem::take(&mut self.due);
        self.delay_rows.drain_due(tick, &mut due);
        for row in &due {
            self.pending.push((row.locator, row.flush));
            self.counters.delay_rows_replayed += 1;
        }
        self.due = due;

        // 2. Stimulus, then drain the spike queue within the tick budget
        if let Some(poisson) = &mut self.poisson {
            if let Some(key) = poisson.sample() {
                self.queue.push(key);
            }
        }
        while self.pending.len() < self.config.spike_budget_per_tick {
            let Some(key) = self.queue.pop() else {
                break;
            };
            match self.lookup.resolve(key) {
                Some(locator) => {
                    self.pending.push((locator, false));
                    self.counters.spikes_processed += 1;
                }
                None => {
                    self.counters.spikes_dropped += 1;
                    log::debug!("dropping spike with unknown key {:#x}", key);
                }
            }
        }

        // 3. Double-buffered fetch/process over the pending rows: buffer
        // `which` receives the next row while its sibling is processed.
        let mut in_flight: Option<(RowLocator, bool, usize)> = None;
        let mut which = 0;
        for i in 0..self.pending.len() {
            let (locator, flush) = self.pending[i];
            self.fetch_into(locator, which)?;
            if let Some((prev_locator, prev_flush, prev_buf)) = in_flight.take() {
                self.apply_row(prev_locator, prev_flush, prev_buf, tick)?;
            }
            in_flight = Some((locator, flush, which));
            which ^= 1;
        }
        if let Some((locator, flush, buf)) = in_flight {
            self.apply_row(locator, flush, buf, tick)?;
        }

        // 4. Hand this tick's ring slot downstream
        let mailbox = self.config.output_mailbox;
        let slot = self.ring.drain_slot(tick);
        if let Some(address) = mailbox {
            self.store.write_words(address, slot)?;
        }

        Ok(())
    }

    /// Run to the configured tick count, then write the counters out
    pub fn run(&mut self) -> Result<TickCounters> {
        log::info!(
            "starting simulation: {} ticks at {} us",
            self.config.simulation_ticks,
            self.config.timer_period_us,
        );
        let milestone = (self.config.simulation_ticks / 10).max(1);
        while self.tick < self.config.simulation_ticks {
            self.step()?;
            if self.tick % milestone == 0 {
                log::debug!("tick {}/{}", self.tick, self.config.simulation_ticks);
            }
        }

        let counters = self.counters();
        if counters.queue_overflows > 0 || counters.delay_buffer_overflows > 0 {
            log::warn!(
                "resource exhaustion during run: {} queue overflows, {} delay-buffer overflows",
                counters.queue_overflows,
                counters.delay_buffer_overflows,
            );
        }
        if let Some(address) = self.config.recording_mailbox {
            self.store.write_words(address, &counters.to_words())?;
        }
        log::info!(
            "simulation complete: {} spikes processed, {} dropped",
            counters.spikes_processed,
            counters.spikes_dropped,
        );
        Ok(counters)
    }

    /// Process one row outside the spike path, e.g. to flush pending
    /// post-events before the row is inspected
    pub fn process_row(&mut self, locator: RowLocator, flush: bool) -> Result<()> {
        let tick = self.tick;
        self.fetch_into(locator, 0)?;
        self.apply_row(locator, flush, 0, tick)
    }

    fn fetch_into(&mut self, locator: RowLocator, buf: usize) -> Result<()> {
        let words = locator.words as usize;
        if words > self.config.max_row_words {
            return Err(RuntimeError::invalid_config(format!(
                "row of {} words exceeds {}-word buffers",
                words, self.config.max_row_words
            )));
        }
        self.store
            .read_words(locator.address, &mut self.buffers[buf][..words])?;
        self.counters.rows_fetched += 1;
        Ok(())
    }

    fn apply_row(&mut self, locator: RowLocator, flush: bool, buf: usize, tick: Tick) -> Result<()> {
        let mut buffer = std::mem::take(&mut self.buffers[buf]);
        let outcome = self.run_kernel(&mut buffer, locator, flush, tick);
        self.buffers[buf] = buffer;
        outcome
    }

    fn run_kernel(
        &mut self,
        buffer: &mut [u32],
        locator: RowLocator,
        flush: bool,
        tick: Tick,
    ) -> Result<()> {
        let words = &mut buffer[..locator.words as usize];
        let ring = &mut self.ring;
        let delay_rows = &mut self.delay_rows;
        // A delay-extension locator word is the replay row's address; shape
        // and layout follow the row that referenced it.
        let add_delay_row = |target_tick: Tick, locator_word: u32| {
            let _ = delay_rows.push(DelayedRow {
                target_tick,
                locator: RowLocator {
                    address: locator_word,
                    words: locator.words,
                    plastic: locator.plastic,
                },
                flush,
            });
        };

        if locator.plastic {
            let span = self.kernel.process_row(
                words,
                tick,
                flush,
                &self.history,
                |t, post, weight| ring.add(t, post, weight),
                add_delay_row,
            )?;
            self.store.write_words(
                locator.address + span.offset as u32,
                &words[span.offset..span.offset + span.words],
            )?;
            self.counters.rows_written_back += 1;
        } else {
            process_fixed_row(
                &self.codec,
                words,
                tick,
                |t, post, weight| ring.add(t, post, weight),
                add_delay_row,
            )?;
        }
        Ok(())
    }
}
