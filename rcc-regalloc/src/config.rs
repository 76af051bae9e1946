//! Resolver configuration and frame layout

use crate::types::Register;
use serde::{Deserialize, Serialize};

/// Options that change which instructions the resolver emits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// The target runtime may drop the definition of an array index that was
    /// produced by a register copy. Constant indices are then always
    /// materialized with a constant load.
    pub can_have_bounds_check_elimination_bug: bool,
}

/// Register numbering of the frame being allocated.
///
/// The allocator numbers argument registers from zero; in the final frame
/// they sit at the top, above every other register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFrame {
    pub number_of_argument_registers: u32,
    /// Highest real register number used by the frame
    pub max_register_number: Register,
}

impl RegisterFrame {
    pub fn new(number_of_argument_registers: u32, max_register_number: Register) -> Self {
        assert!(
            number_of_argument_registers <= max_register_number + 1,
            "{} argument registers do not fit below r{}",
            number_of_argument_registers,
            max_register_number
        );
        Self {
            number_of_argument_registers,
            max_register_number,
        }
    }

    /// Frame register number of an allocator register number
    pub fn unadjusted_real_register(&self, allocated: Register) -> Register {
        if allocated < self.number_of_argument_registers {
            self.max_register_number - (self.number_of_argument_registers - allocated - 1)
        } else {
            allocated - self.number_of_argument_registers
        }
    }

    pub fn is_argument_register(&self, allocated: Register) -> bool {
        allocated < self.number_of_argument_registers
    }
}
