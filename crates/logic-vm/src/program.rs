//! Program image format and validation
//!
//! An assembler hands the VM a [`ProgramImage`]: the variable table with its
//! literal initializers and the instruction sequence. [`Program::from_image`]
//! performs the assembly-time checks once, so the executor can index slots
//! without re-validating on every dispatch.

use crate::error::ProgramError;
use crate::instruction::Instruction;
use crate::value::{Content, Object, Property, Value};
use crate::variables::{Var, VariableBank, RESERVED_SLOTS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Maximum number of instructions a processor may hold
pub const MAX_INSTRUCTIONS: usize = 1000;

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// Compiled initializer of a variable slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Literal {
    Number(f64),
    Null,
    Text(String),
    Content(Content),
    Property(Property),
}

impl Literal {
    /// Initial slot value; numbers go to the numeric payload, everything
    /// else to the object payload
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Number(n) => Value::from(*n),
            Literal::Null => Value::NULL,
            Literal::Text(text) => Value::from(Object::Text(text.as_str().into())),
            Literal::Content(content) => Value::from(Object::Content(*content)),
            Literal::Property(property) => Value::from(Object::Property(*property)),
        }
    }
}

impl Default for Literal {
    fn default() -> Self {
        Literal::Number(0.0)
    }
}

/// One entry of the variable table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default)]
    pub literal: Literal,
    #[serde(default)]
    pub constant: bool,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, literal: Literal, constant: bool) -> Self {
        Self {
            name: name.into(),
            literal,
            constant,
        }
    }

    /// Mutable slot starting at numeric zero
    pub fn var(name: impl Into<String>) -> Self {
        Self::new(name, Literal::Number(0.0), false)
    }

    /// Constant slot holding a literal
    pub fn constant(name: impl Into<String>, literal: Literal) -> Self {
        Self::new(name, literal, true)
    }
}

/// Serialized program, as produced by an assembler
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProgramImage {
    pub variables: Vec<VariableSpec>,
    pub instructions: Vec<Instruction>,
}

impl ProgramImage {
    /// Empty image with the four reserved slots declared
    pub fn with_reserved() -> Self {
        Self {
            variables: vec![
                VariableSpec::var("@counter"),
                VariableSpec::var("@time"),
                VariableSpec::new("@unit", Literal::Null, false),
                VariableSpec::new("@this", Literal::Null, true),
            ],
            instructions: Vec::new(),
        }
    }

    /// Append a variable and return its slot
    pub fn add_variable(&mut self, spec: VariableSpec) -> usize {
        self.variables.push(spec);
        self.variables.len() - 1
    }

    /// Append an instruction and return its address
    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }
}

/// A validated program, ready to load
#[derive(Debug)]
pub struct Program {
    pub(crate) id: u64,
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) variables: VariableBank,
}

impl Program {
    /// Validate an image and build its variable bank
    pub fn from_image(image: ProgramImage) -> Result<Self, ProgramError> {
        let ProgramImage {
            variables,
            instructions,
        } = image;

        if instructions.len() > MAX_INSTRUCTIONS {
            return Err(ProgramError::TooManyInstructions {
                count: instructions.len(),
                max: MAX_INSTRUCTIONS,
            });
        }

        if variables.len() < RESERVED_SLOTS {
            return Err(ProgramError::MissingReservedSlots(variables.len()));
        }

        let len = variables.len();
        for (idx, instruction) in instructions.iter().enumerate() {
            if let Some(&slot) = instruction.slots().iter().find(|&&slot| slot >= len) {
                return Err(ProgramError::SlotOutOfRange {
                    instruction: idx,
                    slot,
                    len,
                });
            }
        }

        let variables = VariableBank::new(
            variables
                .into_iter()
                .map(|spec| Var::new(spec.name, spec.literal.to_value(), spec.constant))
                .collect(),
        );

        let id = NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed);
        debug!(
            program = id,
            instructions = instructions.len(),
            variables = variables.len(),
            "program assembled"
        );

        Ok(Self {
            id,
            instructions,
            variables,
        })
    }

    /// Parse and validate a JSON image
    pub fn from_json(json: &str) -> Result<Self, ProgramError> {
        let image: ProgramImage = serde_json::from_str(json)?;
        Self::from_image(image)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn variables(&self) -> &VariableBank {
        &self.variables
    }
}
