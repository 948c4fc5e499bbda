//! Element Type Descriptors
//!
//! Describes the scalar element kind stored in a buffer. The descriptor is
//! forwarded as-is across the native boundary; whether a combination is
//! meaningful is decided by the native runtime, not here.

use std::fmt;
use std::str::FromStr;

use crate::error::BufferError;

/// Scalar kind of a buffer element.
///
/// The discriminants are the values passed across the native boundary.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    /// Signed integer
    Int = 0,
    /// Unsigned integer
    UInt = 1,
    /// IEEE floating point
    Float = 2,
    /// Opaque pointer-sized handle
    Handle = 3,
}

impl TypeCode {
    /// Wire value of this code
    pub fn as_raw(self) -> u8 {
        self as u8
    }

    /// Decode a wire value
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(TypeCode::Int),
            1 => Some(TypeCode::UInt),
            2 => Some(TypeCode::Float),
            3 => Some(TypeCode::Handle),
            _ => None,
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCode::Int => write!(f, "int"),
            TypeCode::UInt => write!(f, "uint"),
            TypeCode::Float => write!(f, "float"),
            TypeCode::Handle => write!(f, "handle"),
        }
    }
}

/// Element type of a buffer: kind, bit width and vector lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementType {
    pub code: TypeCode,
    /// Interpreted as unsigned by the native runtime
    pub bits: u8,
    /// Interpreted as unsigned by the native runtime; 1 means scalar
    pub lanes: u16,
}

impl ElementType {
    pub const INT8: ElementType = ElementType::new(TypeCode::Int, 8);
    pub const INT16: ElementType = ElementType::new(TypeCode::Int, 16);
    pub const INT32: ElementType = ElementType::new(TypeCode::Int, 32);
    pub const INT64: ElementType = ElementType::new(TypeCode::Int, 64);
    pub const UINT8: ElementType = ElementType::new(TypeCode::UInt, 8);
    pub const UINT16: ElementType = ElementType::new(TypeCode::UInt, 16);
    pub const UINT32: ElementType = ElementType::new(TypeCode::UInt, 32);
    pub const UINT64: ElementType = ElementType::new(TypeCode::UInt, 64);
    pub const FLOAT16: ElementType = ElementType::new(TypeCode::Float, 16);
    pub const FLOAT32: ElementType = ElementType::new(TypeCode::Float, 32);
    pub const FLOAT64: ElementType = ElementType::new(TypeCode::Float, 64);
    pub const HANDLE: ElementType = ElementType::new(TypeCode::Handle, 64);

    /// Create a scalar element type
    pub const fn new(code: TypeCode, bits: u8) -> Self {
        Self::with_lanes(code, bits, 1)
    }

    /// Create a vector element type
    pub const fn with_lanes(code: TypeCode, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    /// Storage bytes taken by one element, all lanes included
    pub fn bytes(&self) -> usize {
        (self.bits as usize).div_ceil(8) * self.lanes as usize
    }

    /// Check if this is a scalar (single lane) type
    pub fn is_scalar(&self) -> bool {
        self.lanes == 1
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            TypeCode::Handle => write!(f, "handle")?,
            code => write!(f, "{}{}", code, self.bits)?,
        }
        if self.lanes != 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

impl FromStr for ElementType {
    type Err = BufferError;

    /// Parse names like `u8`, `uint16`, `f32`, `float32x4`, `handle`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BufferError::InvalidElementType(s.to_string());
        let lower = s.trim().to_lowercase();

        let (scalar, lanes) = match lower.split_once('x') {
            Some((scalar, lanes)) => (scalar, lanes.parse::<u16>().map_err(|_| invalid())?),
            None => (lower.as_str(), 1),
        };
        if lanes == 0 {
            return Err(invalid());
        }

        if scalar == "handle" || scalar == "ptr" {
            return Ok(ElementType::with_lanes(TypeCode::Handle, 64, lanes));
        }
        if scalar == "bool" {
            return Ok(ElementType::with_lanes(TypeCode::UInt, 1, lanes));
        }

        let (code, digits) = ["uint", "int", "float", "u", "i", "f"]
            .iter()
            .find_map(|prefix| scalar.strip_prefix(prefix).map(|rest| (*prefix, rest)))
            .ok_or_else(invalid)?;
        let code = match code {
            "uint" | "u" => TypeCode::UInt,
            "int" | "i" => TypeCode::Int,
            _ => TypeCode::Float,
        };
        let bits = digits.parse::<u8>().map_err(|_| invalid())?;

        Ok(ElementType::with_lanes(code, bits, lanes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_wire_values() {
        assert_eq!(TypeCode::Int.as_raw(), 0);
        assert_eq!(TypeCode::UInt.as_raw(), 1);
        assert_eq!(TypeCode::Float.as_raw(), 2);
        assert_eq!(TypeCode::Handle.as_raw(), 3);
        assert_eq!(TypeCode::from_raw(2), Some(TypeCode::Float));
        assert_eq!(TypeCode::from_raw(4), None);
    }

    #[test]
    fn test_element_bytes() {
        assert_eq!(ElementType::UINT8.bytes(), 1);
        assert_eq!(ElementType::FLOAT16.bytes(), 2);
        assert_eq!(ElementType::INT64.bytes(), 8);
        assert_eq!(ElementType::with_lanes(TypeCode::Float, 32, 4).bytes(), 16);
        assert_eq!(ElementType::new(TypeCode::UInt, 1).bytes(), 1);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("u8".parse::<ElementType>().unwrap(), ElementType::UINT8);
        assert_eq!("int32".parse::<ElementType>().unwrap(), ElementType::INT32);
        assert_eq!("F64".parse::<ElementType>().unwrap(), ElementType::FLOAT64);
        assert_eq!("handle".parse::<ElementType>().unwrap(), ElementType::HANDLE);

        let vec4 = "float32x4".parse::<ElementType>().unwrap();
        assert_eq!(vec4.lanes, 4);
        assert!(!vec4.is_scalar());
        assert_eq!(vec4.to_string(), "float32x4");
        assert_eq!(ElementType::UINT16.to_string(), "uint16");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<ElementType>().is_err());
        assert!("q8".parse::<ElementType>().is_err());
        assert!("u8x0".parse::<ElementType>().is_err());
        assert!("u999".parse::<ElementType>().is_err());
    }
}
