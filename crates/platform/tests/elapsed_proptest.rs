//! Property-based tests for wraparound-safe counter arithmetic.
//! Verifies invariants hold for ALL counter values, not just fixed examples.

use platform::elapsed;

proptest::proptest! {
    /// Advancing a 32-bit counter by `d` always measures `d`, wrap or not.
    #[test]
    fn elapsed_32_bit_recovers_distance(start in 0u32..=u32::MAX, d in 0u32..=u32::MAX) {
        let now = start.wrapping_add(d);
        assert_eq!(elapsed(start, now, u32::MAX), d);
    }

    /// On a 16-bit counter only the low half matters, whatever the upper
    /// bits of the register read contain.
    #[test]
    fn elapsed_16_bit_ignores_upper_bits(
        start in 0u32..=0xFFFF,
        d in 0u32..=0xFFFF,
        junk_a in 0u32..=0xFFFF,
        junk_b in 0u32..=0xFFFF,
    ) {
        let now = (start + d) & 0xFFFF;
        let measured = elapsed(start | (junk_a << 16), now | (junk_b << 16), 0xFFFF);
        assert_eq!(measured, d);
    }

    /// The result never exceeds the counter width.
    #[test]
    fn elapsed_fits_counter_width(start in 0u32..=u32::MAX, now in 0u32..=u32::MAX) {
        assert!(elapsed(start, now, 0xFFFF) <= 0xFFFF);
    }
}
