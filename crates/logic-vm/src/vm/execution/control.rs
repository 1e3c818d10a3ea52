//! Control flow instruction execution

use crate::instruction::Instruction;
use crate::variables::VAR_COUNTER;
use crate::vm::ops::ValueOperations;
use crate::vm::LogicExecutor;
use tracing::trace;

impl LogicExecutor {
    /// Execute control flow instructions
    pub(crate) fn execute_control(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Noop => {}

            Instruction::End => {
                // Out of range on purpose: the next dispatch wraps to 0
                self.vars.set_num(VAR_COUNTER, self.length as f64);
            }

            Instruction::Jump {
                cond,
                value,
                compare,
                address,
            } => {
                let Some(address) = *address else {
                    trace!("unresolved jump skipped");
                    return;
                };

                let left = self.value(*value);
                let right = self.value(*compare);
                if ValueOperations::condition(*cond, &left, &right) {
                    self.vars.set_num(VAR_COUNTER, address as f64);
                }
            }

            _ => unreachable!("Non-control instruction in control handler"),
        }
    }
}
