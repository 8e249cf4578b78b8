use serde::{Deserialize, Serialize};

/// Primitive scalar kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float16,
    BFloat16,
    Float32,
    Float64,
    Complex32,
    Complex64,
    Complex128,
}

impl PrimitiveKind {
    /// Natural size in bytes.
    pub const fn size(self) -> usize {
        use PrimitiveKind::*;
        match self {
            Bool | Int8 | Uint8 => 1,
            Int16 | Uint16 | Float16 | BFloat16 => 2,
            Int32 | Uint32 | Float32 | Complex32 => 4,
            Int64 | Uint64 | Float64 | Complex64 => 8,
            Complex128 => 16,
        }
    }

    /// Natural alignment in bytes; equal to size for all current primitives.
    pub const fn align(self) -> usize {
        self.size()
    }

    pub const fn is_float(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Float16 | PrimitiveKind::BFloat16 | PrimitiveKind::Float32 | PrimitiveKind::Float64
        )
    }

    pub const fn is_reduced_precision_float(self) -> bool {
        matches!(self, PrimitiveKind::Float16 | PrimitiveKind::BFloat16)
    }

    pub const fn is_complex(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Complex32 | PrimitiveKind::Complex64 | PrimitiveKind::Complex128
        )
    }

    pub const fn is_signed_int(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8 | PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64
        )
    }

    pub const fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Uint8 | PrimitiveKind::Uint16 | PrimitiveKind::Uint32 | PrimitiveKind::Uint64
        )
    }

    /// Two's-complement bounds for signed/unsigned integer kinds, as `i128` so
    /// both signed and unsigned ranges fit.
    pub const fn int_bounds(self) -> Option<(i128, i128)> {
        use PrimitiveKind::*;
        Some(match self {
            Int8 => (i8::MIN as i128, i8::MAX as i128),
            Int16 => (i16::MIN as i128, i16::MAX as i128),
            Int32 => (i32::MIN as i128, i32::MAX as i128),
            Int64 => (i64::MIN as i128, i64::MAX as i128),
            Uint8 => (0, u8::MAX as i128),
            Uint16 => (0, u16::MAX as i128),
            Uint32 => (0, u32::MAX as i128),
            Uint64 => (0, u64::MAX as i128),
            _ => return None,
        })
    }

    pub fn display_name(self) -> &'static str {
        use PrimitiveKind::*;
        match self {
            Bool => "bool",
            Int8 => "int8",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            Uint8 => "uint8",
            Uint16 => "uint16",
            Uint32 => "uint32",
            Uint64 => "uint64",
            Float16 => "float16",
            BFloat16 => "bfloat16",
            Float32 => "float32",
            Float64 => "float64",
            Complex32 => "complex32",
            Complex64 => "complex64",
            Complex128 => "complex128",
        }
    }
}

/// String/bytes fixed-width encodings.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum StringEncoding {
    Ascii,
    Utf8,
    Utf16,
    Utf32,
}

impl StringEncoding {
    /// Bytes per code unit for a fixed-string of this encoding.
    pub const fn code_unit_size(self) -> usize {
        match self {
            StringEncoding::Ascii | StringEncoding::Utf8 => 1,
            StringEncoding::Utf16 => 2,
            StringEncoding::Utf32 => 4,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StringEncoding::Ascii => "ascii",
            StringEncoding::Utf8 => "utf8",
            StringEncoding::Utf16 => "utf16",
            StringEncoding::Utf32 => "utf32",
        }
    }
}

/// Dimension layout flag : how a dim's children are laid out in the
/// arena relative to each other.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DimLayout {
    CContiguous,
    FContiguous,
    ArrayOfPointers,
}

impl Default for DimLayout {
    fn default() -> Self {
        DimLayout::CContiguous
    }
}
