//! Register numbers and value widths

use std::fmt;

/// Allocator register number.
///
/// Wide values occupy `r` and `r + 1`.
pub type Register = u32;

/// Width/kind classification of a value held in registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    // Single-width primitives
    Int,
    Float,

    // Wide primitives (two registers)
    Long,
    Double,

    // References
    Object,
}

impl ValueType {
    pub fn is_wide(self) -> bool {
        matches!(self, ValueType::Long | ValueType::Double)
    }

    pub fn is_reference(self) -> bool {
        matches!(self, ValueType::Object)
    }

    pub fn is_primitive(self) -> bool {
        !self.is_reference()
    }

    pub fn is_single_primitive(self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }

    /// Number of consecutive registers a value of this type occupies
    pub fn required_registers(self) -> u32 {
        if self.is_wide() {
            2
        } else {
            1
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Long => write!(f, "long"),
            ValueType::Double => write!(f, "double"),
            ValueType::Object => write!(f, "object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(ValueType::Int.required_registers(), 1);
        assert_eq!(ValueType::Object.required_registers(), 1);
        assert_eq!(ValueType::Long.required_registers(), 2);
        assert_eq!(ValueType::Double.required_registers(), 2);
        assert!(ValueType::Float.is_single_primitive());
        assert!(!ValueType::Object.is_single_primitive());
        assert!(!ValueType::Double.is_single_primitive());
    }

    #[test]
    fn test_order_puts_single_before_wide_before_reference() {
        assert!(ValueType::Int < ValueType::Long);
        assert!(ValueType::Double < ValueType::Object);
    }
}
