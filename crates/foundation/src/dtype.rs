//! Element dtype register.
//!
//! Every data carrier and every generated kernel parameter carries one of
//! these dtypes. The register is closed: carriers are numeric arrays, and
//! the generated dialect only ever names these five C types.

use serde::{Deserialize, Serialize};

/// Element type of a carrier buffer or kernel scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 32-bit float, the default carrier dtype.
    F32,
    /// 64-bit float.
    F64,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// Unsigned byte. Doubles as the boolean carrier type.
    U8,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F64 | DType::I64 => 8,
            DType::U8 => 1,
        }
    }

    /// C type name used in generated kernel signatures.
    pub fn c_name(self) -> &'static str {
        match self {
            DType::F32 => "float",
            DType::F64 => "double",
            DType::I32 => "int",
            DType::I64 => "long",
            DType::U8 => "unsigned char",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// Decode one element from little-endian bytes.
    ///
    /// `bytes` must be exactly [`DType::size_of`] long. All element values
    /// travel through an f64 channel; integer dtypes are exact within the
    /// 53-bit mantissa, which covers every index and counter the kernels
    /// produce.
    pub fn read_scalar(self, bytes: &[u8]) -> f64 {
        debug_assert_eq!(bytes.len(), self.size_of());
        match self {
            DType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            DType::F64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
            DType::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            DType::I64 => i64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as f64,
            DType::U8 => bytes[0] as f64,
        }
    }

    /// Encode one element into little-endian bytes.
    ///
    /// Float dtypes round to their width; integer dtypes truncate toward
    /// zero, matching C assignment semantics.
    pub fn write_scalar(self, bytes: &mut [u8], value: f64) {
        debug_assert_eq!(bytes.len(), self.size_of());
        match self {
            DType::F32 => bytes.copy_from_slice(&(value as f32).to_le_bytes()),
            DType::F64 => bytes.copy_from_slice(&value.to_le_bytes()),
            DType::I32 => bytes.copy_from_slice(&(value as i32).to_le_bytes()),
            DType::I64 => bytes.copy_from_slice(&(value as i64).to_le_bytes()),
            DType::U8 => bytes[0] = value as u8,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.c_name())
    }
}
