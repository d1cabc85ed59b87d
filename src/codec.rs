//! Conversions from raw register contents to signed acceleration values.
//!
//! Two distinct scalings exist and are kept apart:
//! - [`scale_axis`] is what the axis readers report: the decoded raw value
//!   multiplied by `full_scale / 4` (integer, floored). It is not in g.
//! - [`to_g`] turns an unscaled raw reading into g: `2 * full_scale * raw / 65536`.
//!
//! Feeding an axis reader's output into [`to_g`] mixes the two and is wrong.

use crate::config::FullScale;

/// Number of distinct 16-bit values.
pub const TOP_16BIT: u32 = 1 << 16;

/// Signed value of the `width`-bit two's-complement pattern in `raw`.
///
/// Bits of `raw` above `width` are ignored. `width` must be within 1..=32.
pub fn twos_complement(raw: u32, width: u32) -> i64 {
    debug_assert!((1..=32).contains(&width), "invalid bit width {width}");
    let range = 1i64 << width;
    let value = i64::from(raw) & (range - 1);
    if value >= range >> 1 {
        value - range
    } else {
        value
    }
}

/// Signed value of a 16-bit register pair.
pub fn decode16(raw: u16) -> i32 {
    twos_complement(raw.into(), 16) as i32
}

/// Axis-reader scaling: `decode16(raw) * full_scale / 4`, floored.
pub fn scale_axis(raw: u16, full_scale: FullScale) -> i32 {
    (decode16(raw) * i32::from(full_scale.g())).div_euclid(4)
}

/// Convert an unscaled signed 16-bit reading to g.
pub fn to_g(raw: i32, full_scale: FullScale) -> f32 {
    2.0 * f32::from(full_scale.g()) * raw as f32 / TOP_16BIT as f32
}
