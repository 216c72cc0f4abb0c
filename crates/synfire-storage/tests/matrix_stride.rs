//! Property tests for the row codec and matrix generator

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use synfire_storage::{
    AllToAllConnector, ConstantWeight, FixedProbabilityConnector, FixedRow, MatrixConfig,
    MatrixGenerator, SynapseCodec, UniformDelay, UniformWeight,
};

proptest! {
    // Decoding an encoded word recovers (index, delay, weight) for every
    // in-range triple.
    #[test]
    fn packing_round_trip(index in 0u32..1024, delay in 0u32..8, weight in 0u32..(1 << 19)) {
        let codec = SynapseCodec::new(10, 3);
        let word = codec.encode(index, delay, weight);
        prop_assert_eq!(codec.index(word), index);
        prop_assert_eq!(codec.delay(word), delay);
        prop_assert_eq!(codec.weight(word), weight);
    }

    // Same for control halfwords, which drop the weight field.
    #[test]
    fn control_round_trip(index in 0u32..1024, delay in 0u32..8) {
        let codec = SynapseCodec::new(10, 3);
        let control = codec.encode_control(index, delay);
        prop_assert_eq!(codec.control_index(control), index);
        prop_assert_eq!(codec.control_delay(control), delay);
    }

    // Narrower configurations round-trip as well.
    #[test]
    fn packing_round_trip_narrow(index in 0u32..64, delay in 0u32..16) {
        let codec = SynapseCodec::new(6, 4);
        let weight = codec.weight_mask();
        let word = codec.encode(index, delay, weight);
        prop_assert_eq!(codec.index(word), index);
        prop_assert_eq!(codec.delay(word), delay);
        prop_assert_eq!(codec.weight(word), weight);
    }

    // After generating R rows with max_row_synapses = M, the output cursor
    // advanced by exactly R * (3 + M) words, however many synapses each
    // connector draw produced.
    #[test]
    fn generator_stride(
        num_rows in 1u32..16,
        max_row_synapses in 1usize..32,
        p in 0.0f32..1.0,
        seed in any::<u64>(),
    ) {
        let codec = SynapseCodec::new(10, 3);
        let config = MatrixConfig {
            num_rows,
            max_row_synapses,
            weight_fixed_point: 8,
            num_post: 64,
        };
        let gen = MatrixGenerator::new(
            config,
            FixedProbabilityConnector { p },
            UniformDelay { low: 1, high: 7 },
            UniformWeight { low: 0.0, high: 2.0 },
        ).unwrap();
        let mut out = vec![0u32; gen.matrix_words()];
        let mut rng = StdRng::seed_from_u64(seed);
        let written = gen.generate_into(&codec, &mut out, &mut rng).unwrap();
        prop_assert_eq!(written, num_rows as usize * (3 + max_row_synapses));

        // Every row parses and honours its own header count.
        for row in 0..num_rows as usize {
            let words = &out[row * gen.row_stride()..(row + 1) * gen.row_stride()];
            let view = FixedRow::new(words).unwrap();
            prop_assert!(view.synapse_count() <= max_row_synapses);
        }
    }
}

#[test]
fn generator_full_rows_fill_every_slot() {
    let codec = SynapseCodec::new(10, 3);
    let config = MatrixConfig {
        num_rows: 3,
        max_row_synapses: 5,
        weight_fixed_point: 8,
        num_post: 5,
    };
    let gen = MatrixGenerator::new(
        config,
        AllToAllConnector,
        UniformDelay { low: 1, high: 7 },
        ConstantWeight { value: 1.0 },
    )
    .unwrap();
    let mut out = vec![0u32; gen.matrix_words()];
    let mut rng = StdRng::seed_from_u64(11);
    gen.generate_into(&codec, &mut out, &mut rng).unwrap();
    for row in 0..3 {
        let words = &out[row * gen.row_stride()..(row + 1) * gen.row_stride()];
        assert_eq!(FixedRow::new(words).unwrap().synapse_count(), 5);
    }
}
