//! Assignment and operator instruction execution

use crate::instruction::Instruction;
use crate::vm::ops::ValueOperations;
use crate::vm::LogicExecutor;

impl LogicExecutor {
    /// Execute `Set` and `Op`
    pub(crate) fn execute_arithmetic(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Set { from, to } => {
                let value = self.value(*from);
                self.vars.set_value(*to, value);
            }

            Instruction::Op { op, a, b, dest } => {
                let left = self.value(*a);
                let right = self.value(*b);
                let result = ValueOperations::apply(*op, &left, &right);
                self.vars.set_num(*dest, result);
            }

            _ => unreachable!("Non-arithmetic instruction in arithmetic handler"),
        }
    }
}
