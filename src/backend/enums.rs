// GL enumerations
//
// Raw values follow the OpenGL numbering and must never be renumbered:
// they are passed straight through to whatever native backend sits below.

/// Declares a `#[repr(u32)]` enum whose discriminants are GL enum values,
/// together with `from_raw`/`to_raw` conversions.
macro_rules! gl_enum {
    (
        $(#[$meta_outer:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$meta_inner:meta])*
                $variant:ident = $raw:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta_outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        $vis enum $name {
            $(
                $(#[$meta_inner])*
                $variant = $raw,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $(x if x == $raw => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub const fn to_raw(self) -> u32 {
                self as u32
            }
        }
    };
}

gl_enum! {
    /// Component / index data types.
    pub enum DataType {
        Byte = 0x1400,
        UnsignedByte = 0x1401,
        Short = 0x1402,
        UnsignedShort = 0x1403,
        Int = 0x1404,
        UnsignedInt = 0x1405,
        Float = 0x1406,
        Double = 0x140A,
    }
}

impl DataType {
    /// Size of one component in bytes.
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// Whether the type can be used for `draw_elements` indices.
    pub const fn is_index_type(self) -> bool {
        matches!(self, Self::UnsignedByte | Self::UnsignedShort | Self::UnsignedInt)
    }
}

gl_enum! {
    /// Primitive topologies.
    pub enum DrawMode {
        Points = 0x0,
        Lines = 0x1,
        LineLoop = 0x2,
        LineStrip = 0x3,
        Triangles = 0x4,
        TriangleStrip = 0x5,
        TriangleFan = 0x6,
    }
}

gl_enum! {
    /// Buffer binding points.
    pub enum BufferTarget {
        Array = 0x8892,
        ElementArray = 0x8893,
        Uniform = 0x8A11,
    }
}

gl_enum! {
    /// Shader stage types.
    pub enum ShaderType {
        Fragment = 0x8B30,
        Vertex = 0x8B31,
        Geometry = 0x8DD9,
        Compute = 0x91B9,
    }
}

impl ShaderType {
    /// Guess a stage from a shader file extension (`vert`, `frag`, `geom`, `comp`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "vert" | "vs" => Some(Self::Vertex),
            "frag" | "fs" => Some(Self::Fragment),
            "geom" | "gs" => Some(Self::Geometry),
            "comp" | "cs" => Some(Self::Compute),
            _ => None,
        }
    }
}

gl_enum! {
    /// `glGetError` codes.
    pub enum GlError {
        InvalidEnum = 0x0500,
        InvalidValue = 0x0501,
        InvalidOperation = 0x0502,
        OutOfMemory = 0x0505,
    }
}

/// Bitmask of framebuffer buffers to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClearFlags {
    bits: u32,
}

impl ClearFlags {
    pub const NONE: Self = Self { bits: 0 };
    pub const DEPTH: Self = Self { bits: 0x100 };
    pub const STENCIL: Self = Self { bits: 0x400 };
    pub const COLOR: Self = Self { bits: 0x4000 };
    pub const ALL: Self = Self {
        bits: Self::DEPTH.bits | Self::STENCIL.bits | Self::COLOR.bits,
    };

    /// Wraps raw bits without validation; backends reject unknown bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    pub const fn bits(self) -> u32 {
        self.bits
    }

    pub const fn union(self, other: Self) -> Self {
        Self { bits: self.bits | other.bits }
    }

    pub const fn contains(self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// True if no bits outside depth/stencil/color are set.
    pub const fn is_valid(self) -> bool {
        (self.bits & !Self::ALL.bits) == 0
    }
}

impl std::ops::BitOr for ClearFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ClearFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_values_match_gl() {
        assert_eq!(DataType::Byte.to_raw(), 0x1400);
        assert_eq!(DataType::UnsignedByte.to_raw(), 0x1401);
        assert_eq!(DataType::Short.to_raw(), 0x1402);
        assert_eq!(DataType::UnsignedShort.to_raw(), 0x1403);
        assert_eq!(DataType::Int.to_raw(), 0x1404);
        assert_eq!(DataType::UnsignedInt.to_raw(), 0x1405);
        assert_eq!(DataType::Float.to_raw(), 0x1406);
        assert_eq!(DataType::Double.to_raw(), 0x140A);
    }

    #[test]
    fn draw_mode_values_match_gl() {
        let raw: Vec<u32> = DrawMode::ALL.iter().map(|m| m.to_raw()).collect();
        assert_eq!(raw, vec![0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x6]);
        assert_eq!(DrawMode::Triangles as u32, 0x4);
    }

    #[test]
    fn clear_bits_match_gl() {
        assert_eq!(ClearFlags::DEPTH.bits(), 0x100);
        assert_eq!(ClearFlags::STENCIL.bits(), 0x400);
        assert_eq!(ClearFlags::COLOR.bits(), 0x4000);
        assert_eq!((ClearFlags::COLOR | ClearFlags::DEPTH).bits(), 0x4100);
    }

    #[test]
    fn from_raw_rejects_unknown_values() {
        assert_eq!(DataType::from_raw(0x1406), Some(DataType::Float));
        assert_eq!(DataType::from_raw(0x1407), None);
        assert_eq!(DrawMode::from_raw(0x7), None);
        assert_eq!(ShaderType::from_raw(0x8B31), Some(ShaderType::Vertex));
        assert_eq!(BufferTarget::from_raw(0x8893), Some(BufferTarget::ElementArray));
        assert_eq!(GlError::from_raw(0x0502), Some(GlError::InvalidOperation));
    }

    #[test]
    fn shader_type_from_extension() {
        assert_eq!(ShaderType::from_extension("vert"), Some(ShaderType::Vertex));
        assert_eq!(ShaderType::from_extension("frag"), Some(ShaderType::Fragment));
        assert_eq!(ShaderType::from_extension("txt"), None);
    }

    #[test]
    fn clear_flags_validity() {
        assert!(ClearFlags::ALL.is_valid());
        assert!(!ClearFlags::from_bits(0x1).is_valid());
        assert!(ClearFlags::ALL.contains(ClearFlags::STENCIL));
        assert!(!ClearFlags::COLOR.contains(ClearFlags::DEPTH));
        assert!(ClearFlags::NONE.is_empty());
    }
}
