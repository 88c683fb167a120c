// Color / normal byte encoding
//
// Both conversions truncate toward zero (never round) and then wrap into a
// signed byte. Float-to-int narrowing saturates at the i32 range and maps
// NaN to 0 before the wrap.

use glam::{Vec3, Vec4};

/// Convert a color channel in `[0, 1]` to a byte.
///
/// Computes `min(c * 256, 255)` and truncates. Read the result as `u8` to get
/// the channel value: `1.0 -> 255`, `0.5 -> 128`, `0.0 -> 0`.
#[inline]
pub fn color_float_to_byte(c: f32) -> i8 {
    (c * 256.0).min(255.0) as i32 as i8
}

/// Convert a normal component in `[-1, 1]` to a signed byte.
///
/// Affine map `(255 * n - 1) / 2`, truncated: `1.0 -> 127`, `-1.0 -> -128`.
#[inline]
pub fn normal_float_to_byte(n: f32) -> i8 {
    ((255.0 * n - 1.0) * 0.5) as i32 as i8
}

/// Pack an RGBA color.
pub fn pack_color(color: Vec4) -> [i8; 4] {
    color.to_array().map(color_float_to_byte)
}

/// Pack a normal vector. The vector is not normalized first.
pub fn pack_normal(normal: Vec3) -> [i8; 3] {
    normal.to_array().map(normal_float_to_byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_reference_values() {
        assert_eq!(color_float_to_byte(0.0) as u8, 0);
        assert_eq!(color_float_to_byte(0.5) as u8, 128);
        assert_eq!(color_float_to_byte(1.0) as u8, 255);
        assert_eq!(color_float_to_byte(1.0), -1);
    }

    #[test]
    fn color_matches_floor_over_unit_range() {
        for i in 0..=1000 {
            let c = i as f32 / 1000.0;
            let expected = (c * 256.0).min(255.0).floor() as u8;
            assert_eq!(color_float_to_byte(c) as u8, expected, "c = {}", c);
        }
    }

    #[test]
    fn color_saturates_above_one() {
        assert_eq!(color_float_to_byte(1.5) as u8, 255);
        assert_eq!(color_float_to_byte(1000.0) as u8, 255);
        assert_eq!(color_float_to_byte(f32::INFINITY) as u8, 255);
    }

    #[test]
    fn color_below_zero_truncates_then_wraps() {
        // -0.5 * 256 = -128 fits the signed byte exactly
        assert_eq!(color_float_to_byte(-0.5), -128);
        // -256 wraps to 0
        assert_eq!(color_float_to_byte(-1.0), 0);
        // -0.001 * 256 = -0.256, truncates to 0 rather than flooring to -1
        assert_eq!(color_float_to_byte(-0.001), 0);
    }

    #[test]
    fn color_nan_takes_the_clamp() {
        assert_eq!(color_float_to_byte(f32::NAN) as u8, 255);
    }

    #[test]
    fn normal_reference_values() {
        assert_eq!(normal_float_to_byte(1.0), 127);
        assert_eq!(normal_float_to_byte(-1.0), -128);
        // -0.5 truncates toward zero
        assert_eq!(normal_float_to_byte(0.0), 0);
        assert_eq!(normal_float_to_byte(0.5), 63);
        assert_eq!(normal_float_to_byte(-0.5), -64);
    }

    #[test]
    fn normal_out_of_domain_wraps() {
        // (510 - 1) * 0.5 = 254.5 -> 254 -> -2
        assert_eq!(normal_float_to_byte(2.0), -2);
        assert_eq!(normal_float_to_byte(f32::NAN), 0);
    }

    #[test]
    fn packers_apply_per_component() {
        assert_eq!(
            pack_color(Vec4::new(1.0, 0.5, 0.0, 1.0)).map(|b| b as u8),
            [255, 128, 0, 255]
        );
        assert_eq!(pack_normal(Vec3::new(0.0, 1.0, -1.0)), [0, 127, -128]);
    }
}
