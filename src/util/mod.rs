pub mod math;

pub use math::{color_float_to_byte, normal_float_to_byte, pack_color, pack_normal};
