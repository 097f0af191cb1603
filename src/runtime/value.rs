//! VM value representation and function signatures

use fhex::ToHex;
use std::fmt;

/// The four numeric types a value can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Runtime representation of VM values
///
/// Used uniformly as stack operands, syscall arguments and syscall results.
/// Values are `Copy`: a copy keeps both tag and payload bit-for-bit, NaN
/// payloads included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// Get the type tag of this value
    pub fn typ(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// Convert to i32, returning None if wrong type
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to i64, returning None if wrong type
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to f32, returning None if wrong type
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to f64, returning None if wrong type
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Raw payload bits, zero-extended to 64 bits for the 32-bit kinds
    pub fn to_bits(&self) -> u64 {
        match self {
            Value::I32(v) => *v as u32 as u64,
            Value::I64(v) => *v as u64,
            Value::F32(v) => v.to_bits() as u64,
            Value::F64(v) => v.to_bits(),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(v) => write!(f, "f32:{}", v.to_hex()),
            Value::F64(v) => write!(f, "f64:{}", v.to_hex()),
        }
    }
}

/// A function signature
///
/// Two signatures are equal only when their parameter lists and their result
/// lists match element-wise, in order and in length. There is no widening
/// between distinct value types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub parameters: Vec<ValueType>,
    pub return_types: Vec<ValueType>,
}

impl FunctionType {
    pub fn new(parameters: Vec<ValueType>, return_types: Vec<ValueType>) -> Self {
        FunctionType {
            parameters,
            return_types,
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[ValueType]| types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(" ");
        write!(
            f,
            "(func (param {}) (result {}))",
            join(&self.parameters),
            join(&self.return_types)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type() {
        assert_eq!(Value::I32(42).typ(), ValueType::I32);
        assert_eq!(Value::I64(42).typ(), ValueType::I64);
        assert_eq!(Value::F32(42.0).typ(), ValueType::F32);
        assert_eq!(Value::F64(42.0).typ(), ValueType::F64);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::I32(42).as_i32(), Some(42));
        assert_eq!(Value::I32(42).as_i64(), None);
        assert_eq!(Value::I64(42).as_i64(), Some(42));
        assert_eq!(Value::F32(42.0).as_f32(), Some(42.0));
        assert_eq!(Value::F64(42.0).as_f64(), Some(42.0));
        assert_eq!(Value::F64(42.0).as_i32(), None);
    }

    #[test]
    fn test_from_native() {
        assert_eq!(Value::from(-7i32), Value::I32(-7));
        assert_eq!(Value::from(i64::MIN), Value::I64(i64::MIN));
        assert_eq!(Value::from(1.5f32), Value::F32(1.5));
        assert_eq!(Value::from(2.5f64), Value::F64(2.5));
    }

    #[test]
    fn test_copy_is_bit_identical() {
        // A NaN with a non-canonical payload must survive copying untouched
        let f32_nan = Value::F32(f32::from_bits(0x7fa0_0001));
        let f64_nan = Value::F64(f64::from_bits(0x7ff4_0000_0000_0001));
        let copied = (f32_nan, f64_nan);
        assert_eq!(copied.0.to_bits(), 0x7fa0_0001);
        assert_eq!(copied.1.to_bits(), 0x7ff4_0000_0000_0001);

        let neg = Value::I32(-1);
        let copy = neg;
        assert_eq!(copy.to_bits(), 0xffff_ffff);
        assert_eq!(copy.typ(), ValueType::I32);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Value::I32(42)), "i32:42");
        assert_eq!(format!("{}", Value::I64(42)), "i64:42");
        // fhex uses a different format, just check it contains the value
        let f32_str = format!("{}", Value::F32(42.0));
        assert!(f32_str.starts_with("f32:"));
        let f64_str = format!("{}", Value::F64(42.0));
        assert!(f64_str.starts_with("f64:"));
    }

    #[test]
    fn test_function_type_equality() {
        let a = FunctionType::new(vec![ValueType::I32, ValueType::I64], vec![ValueType::I32]);
        let b = FunctionType::new(vec![ValueType::I32, ValueType::I64], vec![ValueType::I32]);
        assert_eq!(a, b);

        // Order matters
        let swapped = FunctionType::new(vec![ValueType::I64, ValueType::I32], vec![ValueType::I32]);
        assert_ne!(a, swapped);

        // Length matters, for both lists
        let shorter = FunctionType::new(vec![ValueType::I32], vec![ValueType::I32]);
        assert_ne!(a, shorter);
        let no_result = FunctionType::new(vec![ValueType::I32, ValueType::I64], vec![]);
        assert_ne!(a, no_result);

        // No widening between distinct types
        let widened = FunctionType::new(vec![ValueType::I64, ValueType::I64], vec![ValueType::I32]);
        assert_ne!(a, widened);
    }

    #[test]
    fn test_function_type_display() {
        let ty = FunctionType::new(vec![ValueType::I32, ValueType::F64], vec![ValueType::I64]);
        assert_eq!(ty.to_string(), "(func (param i32 f64) (result i64))");
    }
}
