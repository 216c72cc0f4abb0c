//! Fixed-weight row kernel

use crate::error::Result;
use synfire_storage::{FixedRow, SynapseCodec, Tick};

/// Apply a fixed-weight row received at `tick`
///
/// Reports any delay extension through `add_delay_row(target_tick,
/// locator_word)`, then hands every synapse to
/// `apply_input(delivery_tick, post_index, weight)`. No row state changes
/// and nothing is written back.
pub fn process_fixed_row<A, D>(
    codec: &SynapseCodec,
    row: &[u32],
    tick: Tick,
    mut apply_input: A,
    mut add_delay_row: D,
) -> Result<()>
where
    A: FnMut(Tick, usize, u32),
    D: FnMut(Tick, u32),
{
    let row = FixedRow::new(row)?;
    if let Some(ext) = row.delay_extension() {
        add_delay_row(tick + ext.tick_offset, ext.locator_word);
    }
    for &word in row.synapses() {
        apply_input(
            tick + codec.delay(word),
            codec.index(word) as usize,
            codec.weight(word),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synapses_delivered_with_delay() {
        let codec = SynapseCodec::default();
        let row = vec![2, 0, 0, codec.encode(5, 1, 100), codec.encode(7, 2, 200)];

        let mut inputs = Vec::new();
        process_fixed_row(
            &codec,
            &row,
            10,
            |tick, post, weight| inputs.push((tick, post, weight)),
            |_, _| panic!("no extension expected"),
        )
        .unwrap();

        assert_eq!(inputs, vec![(11, 5, 100), (12, 7, 200)]);
    }

    #[test]
    fn test_extension_reported_then_synapses_applied() {
        let codec = SynapseCodec::default();
        let row = vec![1, 3, 0xABCD, codec.encode(0, 1, 1)];

        let mut extensions = Vec::new();
        let mut inputs = Vec::new();
        process_fixed_row(
            &codec,
            &row,
            10,
            |tick, post, weight| inputs.push((tick, post, weight)),
            |target, locator| extensions.push((target, locator)),
        )
        .unwrap();

        assert_eq!(extensions, vec![(13, 0xABCD)]);
        assert_eq!(inputs, vec![(11, 0, 1)]);
    }

    #[test]
    fn test_empty_row() {
        let codec = SynapseCodec::default();
        let row = vec![0, 0, 0];
        process_fixed_row(&codec, &row, 1, |_, _, _| panic!(), |_, _| panic!()).unwrap();
    }

    #[test]
    fn test_truncated_row_rejected() {
        let codec = SynapseCodec::default();
        let row = vec![3, 0, 0, 1];
        assert!(process_fixed_row(&codec, &row, 1, |_, _, _| {}, |_, _| {}).is_err());
    }
}
