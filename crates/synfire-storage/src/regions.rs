//! Configuration blob and region table
//!
//! A core's configuration lives in the shared store as a sequence of
//! regions indexed by a table at the blob's base: magic word, version,
//! region count, then `(region_id, offset)` pairs. Each region starts with
//! a 32-bit length word followed by its payload. Unknown region ids are
//! ignored so newer toolchains can feed older cores.

use crate::error::{Result, StorageError};

/// Magic word at the base of every configuration blob ("SYNF")
pub const CONFIG_MAGIC: u32 = 0x5359_4E46;

/// Configuration blob version understood by this crate
pub const CONFIG_VERSION: u32 = 1;

/// Region identifiers recognised by the synapse core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RegionId {
    /// Timer period, tick count and application words
    System = 0,
    /// Sorted key-range table
    KeyLookup = 1,
    /// Packed synaptic rows
    SynapticMatrix = 2,
    /// Timing- and weight-dependence parameters
    PlasticityData = 3,
    /// Downstream ring-buffer mailbox address
    OutputBuffer = 4,
    /// Diagnostic counter mailbox address
    SpikeRecording = 5,
    /// Poisson stimulus parameters
    PoissonSource = 6,
}

impl RegionId {
    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::System),
            1 => Some(Self::KeyLookup),
            2 => Some(Self::SynapticMatrix),
            3 => Some(Self::PlasticityData),
            4 => Some(Self::OutputBuffer),
            5 => Some(Self::SpikeRecording),
            6 => Some(Self::PoissonSource),
            _ => None,
        }
    }

    /// Region name for diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::KeyLookup => "KeyLookup",
            Self::SynapticMatrix => "SynapticMatrix",
            Self::PlasticityData => "PlasticityData",
            Self::OutputBuffer => "OutputBuffer",
            Self::SpikeRecording => "SpikeRecording",
            Self::PoissonSource => "PoissonSource",
        }
    }
}

/// Parsed view of a configuration blob
#[derive(Debug)]
pub struct RegionTable<'a> {
    regions: Vec<(RegionId, &'a [u32])>,
}

impl<'a> RegionTable<'a> {
    /// Parse and validate a configuration blob
    ///
    /// Fatal on bad magic, unsupported version, or any region whose declared
    /// payload overruns the blob. Unknown region ids are skipped.
    pub fn parse(blob: &'a [u32]) -> Result<Self> {
        if blob.len() < 3 {
            return Err(StorageError::invalid_format("blob shorter than header"));
        }
        if blob[0] != CONFIG_MAGIC {
            return Err(StorageError::InvalidMagic {
                expected: CONFIG_MAGIC,
                found: blob[0],
            });
        }
        if blob[1] != CONFIG_VERSION {
            return Err(StorageError::UnsupportedVersion {
                version: blob[1],
                supported: CONFIG_VERSION,
            });
        }
        let count = blob[2] as usize;
        let table_end = 3 + 2 * count;
        if blob.len() < table_end {
            return Err(StorageError::invalid_format(format!(
                "region table truncated: need {} words, have {}",
                table_end,
                blob.len()
            )));
        }

        let mut regions: Vec<(RegionId, &[u32])> = Vec::with_capacity(count);
        for i in 0..count {
            let raw_id = blob[3 + 2 * i];
            let offset = blob[3 + 2 * i + 1] as usize;
            if offset >= blob.len() {
                return Err(StorageError::RegionOverrun {
                    region: raw_id,
                    offset,
                    length: 0,
                    capacity: blob.len(),
                });
            }
            let length = blob[offset] as usize;
            let payload_start = offset + 1;
            if payload_start + length > blob.len() {
                return Err(StorageError::RegionOverrun {
                    region: raw_id,
                    offset,
                    length,
                    capacity: blob.len(),
                });
            }
            let Some(id) = RegionId::from_raw(raw_id) else {
                log::debug!("ignoring unknown region id {}", raw_id);
                continue;
            };
            if regions.iter().any(|(seen, _)| *seen == id) {
                return Err(StorageError::invalid_format(format!(
                    "duplicate region {}",
                    id.name()
                )));
            }
            regions.push((id, &blob[payload_start..payload_start + length]));
        }
        Ok(Self { regions })
    }

    /// Payload of a region, if present
    pub fn region(&self, id: RegionId) -> Option<&'a [u32]> {
        self.regions
            .iter()
            .find(|(seen, _)| *seen == id)
            .map(|(_, payload)| *payload)
    }

    /// Payload of a region that must be present
    pub fn require(&self, id: RegionId) -> Result<&'a [u32]> {
        self.region(id).ok_or(StorageError::MissingRegion {
            region: id.name(),
        })
    }
}

/// Assemble a configuration blob from region payloads
///
/// Host-side counterpart of [`RegionTable::parse`]; used by tooling and
/// tests to lay out a core's configuration image.
#[derive(Debug, Default)]
pub struct RegionBlobBuilder {
    regions: Vec<(u32, Vec<u32>)>,
}

impl RegionBlobBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a region payload
    pub fn region(mut self, id: RegionId, payload: Vec<u32>) -> Self {
        self.regions.push((id as u32, payload));
        self
    }

    /// Serialize the blob
    pub fn build(self) -> Vec<u32> {
        let count = self.regions.len();
        let mut blob = vec![CONFIG_MAGIC, CONFIG_VERSION, count as u32];
        blob.resize(3 + 2 * count, 0);
        let mut offset = blob.len();
        for (i, (id, payload)) in self.regions.iter().enumerate() {
            blob[3 + 2 * i] = *id;
            blob[3 + 2 * i + 1] = offset as u32;
            offset += 1 + payload.len();
        }
        for (_, payload) in &self.regions {
            blob.push(payload.len() as u32);
            blob.extend_from_slice(payload);
        }
        blob
    }
}

/// System region: timer configuration and simulation length
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemRegion {
    /// Timer tick period in microseconds
    pub timer_period_us: u32,
    /// Number of ticks to simulate
    pub simulation_ticks: u32,
    /// Application-specific word slots
    pub app_words: Vec<u32>,
}

impl SystemRegion {
    /// Parse the System region payload
    ///
    /// Layout: `[timer_period_us, simulation_ticks, app_word_count,
    /// app_words..., crc32]`. A zero CRC word disables verification;
    /// otherwise a mismatch against the preceding payload words is fatal.
    pub fn parse(payload: &[u32]) -> Result<Self> {
        if payload.len() < 4 {
            return Err(StorageError::invalid_format("System region too short"));
        }
        let app_count = payload[2] as usize;
        if payload.len() != 4 + app_count {
            return Err(StorageError::invalid_format(format!(
                "System region length {} does not match app word count {}",
                payload.len(),
                app_count
            )));
        }
        let expected = payload[payload.len() - 1];
        if expected != 0 {
            let computed = checksum_words(&payload[..payload.len() - 1]);
            if computed != expected {
                return Err(StorageError::ChecksumMismatch { expected, computed });
            }
        }
        Ok(Self {
            timer_period_us: payload[0],
            simulation_ticks: payload[1],
            app_words: payload[3..3 + app_count].to_vec(),
        })
    }

    /// Serialize the region payload, appending the CRC word
    pub fn to_words(&self) -> Vec<u32> {
        let mut words = vec![
            self.timer_period_us,
            self.simulation_ticks,
            self.app_words.len() as u32,
        ];
        words.extend_from_slice(&self.app_words);
        words.push(checksum_words(&words));
        words
    }
}

/// Timing-dependence variant selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimingMode {
    /// Every pre/post crossing contributes
    Pair,
    /// Only the nearest opposite-side event contributes
    NearestPair,
}

/// Weight-dependence variant selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightMode {
    /// Fixed-step updates clamped to the bounds
    Additive,
    /// Updates scaled by the distance to the bound
    Multiplicative,
}

/// PlasticityData region: STDP rule parameters
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlasticityParams {
    /// Timing-dependence variant
    pub timing_mode: TimingMode,
    /// Weight-dependence variant
    pub weight_mode: WeightMode,
    /// Potentiation time constant in ticks
    pub tau_plus_ticks: u32,
    /// Depression time constant in ticks
    pub tau_minus_ticks: u32,
    /// Potentiation scale factor (Q11)
    pub a2_plus: u32,
    /// Depression scale factor (Q11)
    pub a2_minus: u32,
    /// Minimum weight
    pub w_min: u32,
    /// Maximum weight
    pub w_max: u32,
}

impl PlasticityParams {
    /// Parse the PlasticityData region payload
    pub fn parse(payload: &[u32]) -> Result<Self> {
        if payload.len() != 8 {
            return Err(StorageError::invalid_format(format!(
                "PlasticityData region length {} != 8",
                payload.len()
            )));
        }
        let timing_mode = match payload[0] {
            0 => TimingMode::Pair,
            1 => TimingMode::NearestPair,
            other => {
                return Err(StorageError::invalid_format(format!(
                    "unknown timing mode {}",
                    other
                )))
            }
        };
        let weight_mode = match payload[1] {
            0 => WeightMode::Additive,
            1 => WeightMode::Multiplicative,
            other => {
                return Err(StorageError::invalid_format(format!(
                    "unknown weight mode {}",
                    other
                )))
            }
        };
        let params = Self {
            timing_mode,
            weight_mode,
            tau_plus_ticks: payload[2],
            tau_minus_ticks: payload[3],
            a2_plus: payload[4],
            a2_minus: payload[5],
            w_min: payload[6],
            w_max: payload[7],
        };
        if params.tau_plus_ticks == 0 || params.tau_minus_ticks == 0 {
            return Err(StorageError::invalid_format("zero STDP time constant"));
        }
        if params.w_min > params.w_max {
            return Err(StorageError::invalid_format("w_min exceeds w_max"));
        }
        Ok(params)
    }

    /// Serialize the region payload
    pub fn to_words(&self) -> Vec<u32> {
        vec![
            match self.timing_mode {
                TimingMode::Pair => 0,
                TimingMode::NearestPair => 1,
            },
            match self.weight_mode {
                WeightMode::Additive => 0,
                WeightMode::Multiplicative => 1,
            },
            self.tau_plus_ticks,
            self.tau_minus_ticks,
            self.a2_plus,
            self.a2_minus,
            self.w_min,
            self.w_max,
        ]
    }
}

/// OutputBuffer region: downstream neuron-input mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputBufferRegion {
    /// Word address the drained ring slot is copied to each tick
    pub mailbox_address: u32,
}

impl OutputBufferRegion {
    /// Parse the OutputBuffer region payload
    pub fn parse(payload: &[u32]) -> Result<Self> {
        match payload {
            [address] => Ok(Self {
                mailbox_address: *address,
            }),
            _ => Err(StorageError::invalid_format("OutputBuffer region length != 1")),
        }
    }
}

/// SpikeRecording region: diagnostic counter mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordingRegion {
    /// Word address the counters are written to at termination
    pub counter_address: u32,
}

impl RecordingRegion {
    /// Parse the SpikeRecording region payload
    pub fn parse(payload: &[u32]) -> Result<Self> {
        match payload {
            [address] => Ok(Self {
                counter_address: *address,
            }),
            _ => Err(StorageError::invalid_format(
                "SpikeRecording region length != 1",
            )),
        }
    }
}

/// PoissonSource region: stimulus-variant parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoissonRegion {
    /// Routing key of the first stimulated neuron
    pub key_base: u32,
    /// Per-tick spike probability per neuron (Q16)
    pub rate_q16: u32,
    /// RNG seed
    pub seed: u32,
}

impl PoissonRegion {
    /// Parse the PoissonSource region payload
    pub fn parse(payload: &[u32]) -> Result<Self> {
        match payload {
            [key_base, rate_q16, seed] => Ok(Self {
                key_base: *key_base,
                rate_q16: *rate_q16,
                seed: *seed,
            }),
            _ => Err(StorageError::invalid_format(
                "PoissonSource region length != 3",
            )),
        }
    }
}

/// CRC32 over the little-endian byte image of a word slice
pub fn checksum_words(words: &[u32]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for word in words {
        hasher.update(&word.to_le_bytes());
    }
    hasher.finalize()
}
