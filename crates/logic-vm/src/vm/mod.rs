//! Logic executor
//!
//! One [`LogicExecutor`] runs one loaded program. The driver calls
//! [`LogicExecutor::advance`] once per simulation tick; each call executes at
//! most one instruction, so a program never costs more than a single
//! instruction per tick regardless of what it does.

use crate::capability::{BuildingRef, World};
use crate::config::ExecutorConfig;
use crate::instruction::Instruction;
use crate::logic_ai::InstructionKey;
use crate::program::Program;
use crate::value::{Object, Team, Value};
use crate::variables::{VariableBank, VAR_COUNTER, VAR_THIS, VAR_TIME};
use tracing::{debug, trace};

// Module structure
mod buffers;
mod execution;
mod ops;

pub use buffers::{DrawCommand, OutputBuffers};
pub use ops::EQUALITY_EPSILON;

/// Executes a loaded program one instruction at a time
#[derive(Debug)]
pub struct LogicExecutor {
    pub(crate) config: ExecutorConfig,

    /// Identity of the loaded program, for per-instruction keys
    pub(crate) program_id: u64,

    pub(crate) instructions: Vec<Instruction>,

    /// Instruction count; stays valid while `instructions` is lent out
    pub(crate) length: usize,

    pub(crate) vars: VariableBank,

    /// Statically wired neighbor buildings
    pub(crate) links: Vec<Option<BuildingRef>>,

    /// Team the owning processor belongs to
    pub(crate) team: Team,

    /// Owning processor, reinstalled into `@this` on every load
    owner: Option<BuildingRef>,

    pub(crate) buffers: OutputBuffers,
}

impl LogicExecutor {
    /// Create an executor with no program loaded
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            program_id: 0,
            instructions: Vec::new(),
            length: 0,
            vars: VariableBank::default(),
            links: Vec::new(),
            team: Team::DERELICT,
            owner: None,
            buffers: OutputBuffers::new(),
        }
    }

    /// Replace the running program. All variables, caches, timers and
    /// buffered output of the previous program are discarded.
    pub fn load(&mut self, program: Program) {
        let Program {
            id,
            instructions,
            variables,
        } = program;

        debug!(
            program = id,
            instructions = instructions.len(),
            variables = variables.len(),
            "loading program"
        );

        self.program_id = id;
        self.length = instructions.len();
        self.instructions = instructions;
        self.vars = variables;
        self.buffers.clear();

        if let Some(owner) = &self.owner {
            self.vars.force_obj(VAR_THIS, Some(Object::Building(owner.clone())));
        }
    }

    /// Whether a program with at least one instruction is loaded
    pub fn initialized(&self) -> bool {
        self.length > 0
    }

    /// Execute one instruction
    pub fn advance(&mut self, world: &mut dyn World) {
        self.vars.set_num(VAR_TIME, world.millis());

        if self.length == 0 {
            return;
        }

        let mut counter = self.vars.num(VAR_COUNTER);
        if counter < 0.0 || counter >= self.length as f64 {
            counter = 0.0;
        }

        let index = counter as usize;
        self.vars.set_num(VAR_COUNTER, counter + 1.0);

        // Lend the instruction out so it can mutate its own cache while the
        // handlers borrow the rest of the executor.
        let mut instructions = std::mem::take(&mut self.instructions);
        if let Some(instruction) = instructions.get_mut(index) {
            trace!(counter = index, instruction = %instruction, "dispatch");
            self.execute_instruction(index, instruction, world);
        }
        self.instructions = instructions;
    }

    /// Route an instruction to its family handler
    fn execute_instruction(
        &mut self,
        index: usize,
        instruction: &mut Instruction,
        world: &mut dyn World,
    ) {
        match instruction {
            // Flow control
            Instruction::Noop | Instruction::End | Instruction::Jump { .. } => {
                self.execute_control(instruction)
            }

            // Operations
            Instruction::Set { .. } | Instruction::Op { .. } => self.execute_arithmetic(instruction),

            // Memory and links
            Instruction::GetLink { .. } | Instruction::Read { .. } | Instruction::Write { .. } => {
                self.execute_memory(instruction)
            }

            // Building sensing and control
            Instruction::Sense { .. } | Instruction::Control { .. } => {
                self.execute_sensing(instruction)
            }

            // Targeting
            Instruction::Radar { .. } => {
                let key = self.key(index);
                self.execute_radar(key, instruction, world)
            }

            // Units
            Instruction::UnitBind { .. }
            | Instruction::UnitLocate { .. }
            | Instruction::UnitControl { .. } => {
                let key = self.key(index);
                self.execute_units(key, instruction, world)
            }

            // Output
            Instruction::Draw { .. }
            | Instruction::DrawFlush { .. }
            | Instruction::Print { .. }
            | Instruction::PrintFlush { .. } => self.execute_output(instruction),
        }
    }

    // ===== Driver interface =====

    /// Wire the neighbor buildings addressable through `GetLink`
    pub fn set_links(&mut self, links: Vec<Option<BuildingRef>>) {
        debug!(count = links.len(), "links updated");
        self.links = links;
    }

    pub fn links(&self) -> &[Option<BuildingRef>] {
        &self.links
    }

    pub fn set_team(&mut self, team: Team) {
        debug!(team = team.0, "team updated");
        self.team = team;
    }

    pub fn team(&self) -> Team {
        self.team
    }

    /// Record the owning processor and expose it through `@this`
    pub fn bind_self(&mut self, building: BuildingRef) {
        self.vars
            .force_obj(VAR_THIS, Some(Object::Building(building.clone())));
        self.owner = Some(building);
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn variables(&self) -> &VariableBank {
        &self.vars
    }

    /// Direct slot access for drivers and debuggers
    pub fn variables_mut(&mut self) -> &mut VariableBank {
        &mut self.vars
    }

    pub fn buffers(&self) -> &OutputBuffers {
        &self.buffers
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Current program counter
    pub fn counter(&self) -> f64 {
        self.vars.num(VAR_COUNTER)
    }

    pub fn set_counter(&mut self, counter: f64) {
        self.vars.set_num(VAR_COUNTER, counter);
    }

    // ===== Helper methods =====

    /// Identity of the instruction at `index` in the loaded program
    pub(crate) fn key(&self, index: usize) -> InstructionKey {
        InstructionKey {
            program: self.program_id,
            index,
        }
    }

    /// Value of a slot, or the default for an invalid index
    pub(crate) fn value(&self, idx: usize) -> Value {
        self.vars.value(idx).cloned().unwrap_or_default()
    }
}

impl Default for LogicExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}
