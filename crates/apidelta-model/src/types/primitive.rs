//! Primitive (scalar) types.

use super::name::TypeName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar data types that can appear in an API schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// The JSON `null` value.
    Null,
    /// Boolean value.
    Bool,
    /// Platform-width signed integer.
    Int,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Platform-width unsigned integer.
    UInt,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// UTF-8 string.
    String,
    /// UUID, encoded as a string.
    #[serde(rename = "UUID")]
    Uuid,
    /// Point in time, encoded per the exporter's date strategy.
    Date,
    /// URL, encoded as a string.
    #[serde(rename = "URL")]
    Url,
    /// Binary data, encoded per the exporter's data strategy.
    Data,
}

impl PrimitiveType {
    /// Every primitive, in declaration order.
    pub const ALL: [PrimitiveType; 19] = [
        PrimitiveType::Null,
        PrimitiveType::Bool,
        PrimitiveType::Int,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::UInt,
        PrimitiveType::UInt8,
        PrimitiveType::UInt16,
        PrimitiveType::UInt32,
        PrimitiveType::UInt64,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::String,
        PrimitiveType::Uuid,
        PrimitiveType::Date,
        PrimitiveType::Url,
        PrimitiveType::Data,
    ];

    /// Canonical schema name of the primitive.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Null => "Null",
            PrimitiveType::Bool => "Bool",
            PrimitiveType::Int => "Int",
            PrimitiveType::Int8 => "Int8",
            PrimitiveType::Int16 => "Int16",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::UInt => "UInt",
            PrimitiveType::UInt8 => "UInt8",
            PrimitiveType::UInt16 => "UInt16",
            PrimitiveType::UInt32 => "UInt32",
            PrimitiveType::UInt64 => "UInt64",
            PrimitiveType::Float => "Float",
            PrimitiveType::Double => "Double",
            PrimitiveType::String => "String",
            PrimitiveType::Uuid => "UUID",
            PrimitiveType::Date => "Date",
            PrimitiveType::Url => "URL",
            PrimitiveType::Data => "Data",
        }
    }

    /// Look up a primitive by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// The type name of the primitive.
    pub fn type_name(&self) -> TypeName {
        TypeName::new(self.name())
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating_point()
    }

    /// Check if this type is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Int
                | PrimitiveType::Int8
                | PrimitiveType::Int16
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::UInt
                | PrimitiveType::UInt8
                | PrimitiveType::UInt16
                | PrimitiveType::UInt32
                | PrimitiveType::UInt64
        )
    }

    /// Check if this type is a floating point type.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, PrimitiveType::Float | PrimitiveType::Double)
    }

    /// Check if this is a signed numeric type. Floats count as signed.
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Int
                | PrimitiveType::Int8
                | PrimitiveType::Int16
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::Float
                | PrimitiveType::Double
        )
    }

    /// Width in bits of numeric types. Platform-width integers are 64 bits.
    pub fn bit_width(&self) -> Option<u8> {
        match self {
            PrimitiveType::Int8 | PrimitiveType::UInt8 => Some(8),
            PrimitiveType::Int16 | PrimitiveType::UInt16 => Some(16),
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float => Some(32),
            PrimitiveType::Int
            | PrimitiveType::Int64
            | PrimitiveType::UInt
            | PrimitiveType::UInt64
            | PrimitiveType::Double => Some(64),
            _ => None,
        }
    }

    /// Inclusive value range of integer types.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            PrimitiveType::Int8 => (i8::MIN as i128, i8::MAX as i128),
            PrimitiveType::Int16 => (i16::MIN as i128, i16::MAX as i128),
            PrimitiveType::Int32 => (i32::MIN as i128, i32::MAX as i128),
            PrimitiveType::Int | PrimitiveType::Int64 => (i64::MIN as i128, i64::MAX as i128),
            PrimitiveType::UInt8 => (0, u8::MAX as i128),
            PrimitiveType::UInt16 => (0, u16::MAX as i128),
            PrimitiveType::UInt32 => (0, u32::MAX as i128),
            PrimitiveType::UInt | PrimitiveType::UInt64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    /// Check if values of this type travel as JSON strings.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            PrimitiveType::String | PrimitiveType::Uuid | PrimitiveType::Url
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
