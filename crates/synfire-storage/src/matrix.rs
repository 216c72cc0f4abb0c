//! Off-line synaptic matrix generation
//!
//! Produces packed fixed-weight rows from a connectivity, delay and weight
//! specification. Connectors and generators are opaque capabilities over an
//! RNG; the generator itself only lays out words. Every row occupies exactly
//! `FIXED_HEADER_WORDS + max_row_synapses` words so the key lookup can use a
//! constant stride; padding slots beyond a row's synapse count are left
//! untouched and readers must honour the header count.

use crate::error::{Result, StorageError};
use crate::row::{SynapseCodec, FIXED_HEADER_WORDS};
use rand::Rng;

/// Upper bound on synapses per generated row
pub const MAX_ROW_SYNAPSES: usize = 1024;

/// Connectivity capability: which post-neurons row `i` drives
pub trait Connector {
    /// Generate the post-neuron indices of one row, at most `max_row_synapses`
    fn generate<R: Rng>(
        &self,
        row: u32,
        max_row_synapses: usize,
        num_post: usize,
        rng: &mut R,
    ) -> Vec<u16>;
}

/// Delay capability: per-synapse dendritic delays in ticks
pub trait DelayGenerator {
    /// Generate `count` delays, each offset by `offset` ticks
    fn generate<R: Rng>(&self, count: usize, offset: u32, rng: &mut R) -> Vec<u32>;
}

/// Weight capability: per-synapse weights in the target fixed-point format
pub trait WeightGenerator {
    /// Generate `count` weights scaled by `2^weight_fixed_point`
    fn generate<R: Rng>(&self, count: usize, weight_fixed_point: u32, rng: &mut R) -> Vec<u32>;
}

/// Connect every row to every post-neuron
#[derive(Debug, Clone, Copy)]
pub struct AllToAllConnector;

impl Connector for AllToAllConnector {
    fn generate<R: Rng>(
        &self,
        _row: u32,
        max_row_synapses: usize,
        num_post: usize,
        _rng: &mut R,
    ) -> Vec<u16> {
        (0..num_post.min(max_row_synapses)).map(|i| i as u16).collect()
    }
}

/// Connect each (row, post) pair independently with probability `p`
#[derive(Debug, Clone, Copy)]
pub struct FixedProbabilityConnector {
    /// Connection probability in `[0, 1]`
    pub p: f32,
}

impl Connector for FixedProbabilityConnector {
    fn generate<R: Rng>(
        &self,
        _row: u32,
        max_row_synapses: usize,
        num_post: usize,
        rng: &mut R,
    ) -> Vec<u16> {
        let mut indices = Vec::new();
        for post in 0..num_post {
            if indices.len() == max_row_synapses {
                break;
            }
            if rng.gen::<f32>() < self.p {
                indices.push(post as u16);
            }
        }
        indices
    }
}

/// The same delay for every synapse
#[derive(Debug, Clone, Copy)]
pub struct ConstantDelay {
    /// Delay in ticks
    pub delay: u32,
}

impl DelayGenerator for ConstantDelay {
    fn generate<R: Rng>(&self, count: usize, offset: u32, _rng: &mut R) -> Vec<u32> {
        vec![self.delay + offset; count]
    }
}

/// Delays drawn uniformly from an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct UniformDelay {
    /// Lowest delay in ticks
    pub low: u32,
    /// Highest delay in ticks
    pub high: u32,
}

impl DelayGenerator for UniformDelay {
    fn generate<R: Rng>(&self, count: usize, offset: u32, rng: &mut R) -> Vec<u32> {
        (0..count)
            .map(|_| rng.gen_range(self.low..=self.high) + offset)
            .collect()
    }
}

/// The same weight for every synapse
#[derive(Debug, Clone, Copy)]
pub struct ConstantWeight {
    /// Weight before fixed-point scaling
    pub value: f32,
}

impl WeightGenerator for ConstantWeight {
    fn generate<R: Rng>(&self, count: usize, weight_fixed_point: u32, _rng: &mut R) -> Vec<u32> {
        let scaled = scale_weight(self.value, weight_fixed_point);
        vec![scaled; count]
    }
}

/// Weights drawn uniformly from a half-open range
#[derive(Debug, Clone, Copy)]
pub struct UniformWeight {
    /// Lowest weight before scaling
    pub low: f32,
    /// Highest weight before scaling
    pub high: f32,
}

impl WeightGenerator for UniformWeight {
    fn generate<R: Rng>(&self, count: usize, weight_fixed_point: u32, rng: &mut R) -> Vec<u32> {
        (0..count)
            .map(|_| scale_weight(rng.gen_range(self.low..self.high), weight_fixed_point))
            .collect()
    }
}

fn scale_weight(value: f32, weight_fixed_point: u32) -> u32 {
    let scaled = value * (1u32 << weight_fixed_point) as f32;
    scaled.round().max(0.0) as u32
}

/// Shape of the matrix to generate
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixConfig {
    /// Number of rows (pre-synaptic neurons)
    pub num_rows: u32,
    /// Synaptic-word slots reserved per row
    pub max_row_synapses: usize,
    /// Fractional bits of the weight fixed-point format
    pub weight_fixed_point: u32,
    /// Number of post-synaptic neurons
    pub num_post: usize,
}

/// Packed-row generator over connector, delay and weight capabilities
#[derive(Debug)]
pub struct MatrixGenerator<C, D, W> {
    config: MatrixConfig,
    connector: C,
    delays: D,
    weights: W,
}

impl<C, D, W> MatrixGenerator<C, D, W>
where
    C: Connector,
    D: DelayGenerator,
    W: WeightGenerator,
{
    /// Create a generator, validating the matrix shape
    pub fn new(config: MatrixConfig, connector: C, delays: D, weights: W) -> Result<Self> {
        if config.max_row_synapses == 0 || config.max_row_synapses > MAX_ROW_SYNAPSES {
            return Err(StorageError::invalid_format(format!(
                "max_row_synapses {} outside 1..={}",
                config.max_row_synapses, MAX_ROW_SYNAPSES
            )));
        }
        Ok(Self {
            config,
            connector,
            delays,
            weights,
        })
    }

    /// Words per row, including header and padding slots
    pub fn row_stride(&self) -> usize {
        FIXED_HEADER_WORDS + self.config.max_row_synapses
    }

    /// Total words the generated matrix occupies
    pub fn matrix_words(&self) -> usize {
        self.config.num_rows as usize * self.row_stride()
    }

    /// Generate all rows into `out`, returning the words advanced
    ///
    /// The output cursor moves by exactly `row_stride()` per row regardless
    /// of how many synapses the connector produced; delay extension is not
    /// emitted by the generator, so header words 1 and 2 are zero.
    pub fn generate_into<R: Rng>(
        &self,
        codec: &SynapseCodec,
        out: &mut [u32],
        rng: &mut R,
    ) -> Result<usize> {
        let stride = self.row_stride();
        let needed = self.matrix_words();
        if out.len() < needed {
            return Err(StorageError::RowTruncated {
                needed,
                available: out.len(),
            });
        }

        let mut cursor = 0usize;
        for row in 0..self.config.num_rows {
            let mut indices = self.connector.generate(
                row,
                self.config.max_row_synapses,
                self.config.num_post,
                rng,
            );
            indices.truncate(self.config.max_row_synapses);
            let n = indices.len();
            let delays = self.delays.generate(n, 0, rng);
            let weights = self
                .weights
                .generate(n, self.config.weight_fixed_point, rng);

            out[cursor] = n as u32;
            out[cursor + 1] = 0;
            out[cursor + 2] = 0;
            for k in 0..n {
                // Ring deposits target tick + delay; delay 0 would hit the
                // slot being drained, so clamp into [1, delay_mask].
                let delay = delays[k].clamp(1, codec.delay_mask());
                let weight = weights[k].min(codec.weight_mask());
                out[cursor + FIXED_HEADER_WORDS + k] =
                    codec.encode(indices[k] as u32, delay, weight);
            }
            cursor += stride;
        }
        log::debug!(
            "generated {} rows, {} words, stride {}",
            self.config.num_rows,
            cursor,
            stride
        );
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::FixedRow;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(num_rows: u32, max_row_synapses: usize, num_post: usize) -> MatrixConfig {
        MatrixConfig {
            num_rows,
            max_row_synapses,
            weight_fixed_point: 8,
            num_post,
        }
    }

    #[test]
    fn test_all_to_all_layout() {
        let codec = SynapseCodec::default();
        let gen = MatrixGenerator::new(
            config(4, 8, 6),
            AllToAllConnector,
            ConstantDelay { delay: 2 },
            ConstantWeight { value: 0.5 },
        )
        .unwrap();
        let mut out = vec![0u32; gen.matrix_words()];
        let mut rng = StdRng::seed_from_u64(1);
        let written = gen.generate_into(&codec, &mut out, &mut rng).unwrap();
        assert_eq!(written, 4 * (3 + 8));

        for row in 0..4 {
            let words = &out[row * gen.row_stride()..];
            let view = FixedRow::new(&words[..gen.row_stride()]).unwrap();
            assert_eq!(view.synapse_count(), 6);
            assert!(view.delay_extension().is_none());
            for (i, &word) in view.synapses().iter().enumerate() {
                assert_eq!(codec.index(word), i as u32);
                assert_eq!(codec.delay(word), 2);
                assert_eq!(codec.weight(word), 128); // 0.5 in Q8
            }
        }
    }

    #[test]
    fn test_fixed_probability_bounds() {
        let gen = FixedProbabilityConnector { p: 0.5 };
        let mut rng = StdRng::seed_from_u64(7);
        let indices = gen.generate(0, 16, 100, &mut rng);
        assert!(indices.len() <= 16);
        assert!(indices.iter().all(|&i| (i as usize) < 100));
        // Sorted by construction
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_delay_clamped_into_native_range() {
        let codec = SynapseCodec::default();
        let gen = MatrixGenerator::new(
            config(1, 4, 4),
            AllToAllConnector,
            ConstantDelay { delay: 0 },
            ConstantWeight { value: 1.0 },
        )
        .unwrap();
        let mut out = vec![0u32; gen.matrix_words()];
        let mut rng = StdRng::seed_from_u64(3);
        gen.generate_into(&codec, &mut out, &mut rng).unwrap();
        let view = FixedRow::new(&out[..gen.row_stride()]).unwrap();
        assert!(view.synapses().iter().all(|&w| codec.delay(w) == 1));
    }

    #[test]
    fn test_output_too_small() {
        let codec = SynapseCodec::default();
        let gen = MatrixGenerator::new(
            config(2, 4, 4),
            AllToAllConnector,
            ConstantDelay { delay: 1 },
            ConstantWeight { value: 1.0 },
        )
        .unwrap();
        let mut out = vec![0u32; gen.matrix_words() - 1];
        let mut rng = StdRng::seed_from_u64(3);
        assert!(gen.generate_into(&codec, &mut out, &mut rng).is_err());
    }

    #[test]
    fn test_uniform_generators_deterministic() {
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        let delays = UniformDelay { low: 1, high: 7 };
        let weights = UniformWeight {
            low: 0.0,
            high: 1.0,
        };
        assert_eq!(
            delays.generate(16, 0, &mut rng_a),
            delays.generate(16, 0, &mut rng_b)
        );
        assert_eq!(
            weights.generate(16, 8, &mut rng_a),
            weights.generate(16, 8, &mut rng_b)
        );
    }
}
