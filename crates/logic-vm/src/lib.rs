//! Logic Processor Virtual Machine
//!
//! This crate implements the tick-driven executor behind in-world programmable
//! processors. A program is assembled elsewhere into a fixed instruction
//! sequence plus a variable table; the executor advances it by exactly one
//! instruction per simulation tick, persisting the program counter and every
//! variable between ticks.
//!
//! # Architecture
//!
//! - Every variable slot holds a tagged [`Value`]: a number or an object
//!   reference (null included)
//! - Instructions carry slot indices only, plus small enum configuration and,
//!   for radar and unit binding, private cache state
//! - The simulation is reached exclusively through the capability traits in
//!   [`capability`], so the VM runs against stub worlds in tests
//! - Execution never fails: bad operands and missing capabilities degrade to
//!   no-ops or default outputs
//!
//! # Modules
//!
//! - `value`: Slot values, content references, sensor properties
//! - `variables`: The variable bank and its reserved slots
//! - `instruction`: Instruction set definitions
//! - `program`: Program image format and load-time validation
//! - `vm`: Executor, dispatch loop and instruction handlers
//! - `capability`: Traits implemented by the host simulation
//! - `logic_ai`: Controller state for logic-driven units
//! - `config`: Executor tunables
//! - `error`: Program loading errors

pub mod capability;
pub mod config;
pub mod error;
pub mod instruction;
pub mod logic_ai;
pub mod program;
pub mod value;
pub mod variables;
pub mod vm;

// Re-export main types
pub use capability::{BuildingRef, UnitRef, World};
pub use config::ExecutorConfig;
pub use error::ProgramError;
pub use instruction::Instruction;
pub use program::{Literal, Program, ProgramImage, VariableSpec};
pub use value::{Content, Object, Property, Team, Value};
pub use vm::{DrawCommand, LogicExecutor};
