//! Error types for program loading
//!
//! Instruction execution itself never fails; the only fallible step is
//! validating an externally assembled program image before it is loaded.

use thiserror::Error;

/// Reasons a program image cannot be loaded
#[derive(Debug, Error)]
pub enum ProgramError {
    /// More instructions than a processor may hold
    #[error("program has {count} instructions, maximum is {max}")]
    TooManyInstructions { count: usize, max: usize },

    /// Fewer variables than the reserved leading slots
    #[error("program declares {0} variables, the 4 reserved slots are required")]
    MissingReservedSlots(usize),

    /// An instruction references a slot past the variable table
    #[error("instruction {instruction} references slot {slot}, but only {len} variables exist")]
    SlotOutOfRange {
        instruction: usize,
        slot: usize,
        len: usize,
    },

    /// Malformed JSON image
    #[error("invalid program image: {0}")]
    Image(#[from] serde_json::Error),
}
