#![cfg(feature = "lz4")]

use compress::lz4;
use proptest::prelude::*;

proptest! {
    #[test]
    fn round_trips_any_payload(data in proptest::collection::vec(any::<u8>(), 0..8192)) {
        let compressed = lz4::compress(&data);
        let restored = lz4::decompress(&compressed, data.len()).unwrap();
        prop_assert_eq!(restored, data);
    }

    #[test]
    fn compressed_output_has_no_length_prefix_overhead_beyond_lz4(
        data in proptest::collection::vec(0u8..4, 64..8192)
    ) {
        // Highly repetitive input compresses well; this crate's wrapper must
        // not add overhead beyond what lz4_flex's own block format costs.
        let compressed = lz4::compress(&data);
        prop_assert!(compressed.len() < data.len());
    }
}
