//! Link lookup and memory cell instruction execution

use crate::capability::MemoryCell;
use crate::instruction::Instruction;
use crate::value::Object;
use crate::vm::LogicExecutor;
use tracing::trace;

impl LogicExecutor {
    /// Execute `GetLink`, `Read` and `Write`
    pub(crate) fn execute_memory(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::GetLink { output, index } => {
                let link = usize::try_from(self.vars.numi(*index))
                    .ok()
                    .and_then(|i| self.links.get(i).cloned().flatten());
                self.vars.set_obj(*output, link.map(Object::Building));
            }

            Instruction::Read {
                target,
                address,
                output,
            } => {
                let value = self
                    .memory_slot(*target, *address)
                    .map_or(0.0, |(cell, addr)| cell.read(addr));
                self.vars.set_num(*output, value);
            }

            Instruction::Write {
                target,
                address,
                value,
            } => {
                let number = self.vars.num(*value);
                match self.memory_slot(*target, *address) {
                    Some((cell, addr)) => cell.write(addr, number),
                    None => trace!(target = *target, "memory write dropped"),
                }
            }

            _ => unreachable!("Non-memory instruction in memory handler"),
        }
    }

    /// Memory capability of the building in `target`, with the address in
    /// `address` checked against its capacity
    fn memory_slot(&self, target: usize, address: usize) -> Option<(&dyn MemoryCell, usize)> {
        let cell = self.vars.building(target)?.memory()?;
        let addr = usize::try_from(self.vars.numi(address)).ok()?;
        (addr < cell.capacity()).then_some((cell, addr))
    }
}
