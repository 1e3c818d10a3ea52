//! Sensor and building control instruction execution

use crate::capability::{Senseable, Sensed};
use crate::instruction::Instruction;
use crate::value::{Object, Value};
use crate::vm::LogicExecutor;
use tracing::trace;

impl LogicExecutor {
    /// Execute `Sense` and building `Control`
    pub(crate) fn execute_sensing(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Sense {
                target,
                property,
                output,
            } => {
                let Some(sensor) = self.senseable(*target) else {
                    self.vars.set_num(*output, 0.0);
                    return;
                };

                let sensed = match self.vars.obj(*property) {
                    Some(Object::Content(content)) => Some(Sensed::Number(sensor.sense(*content))),
                    Some(Object::Property(prop)) => Some(sensor.sense_property(*prop)),
                    _ => None,
                };

                match sensed {
                    Some(Sensed::Number(n)) => self.vars.set_num(*output, n),
                    Some(Sensed::Object(obj)) => self.vars.set_obj(*output, obj),
                    None => trace!(property = *property, "sense key is not content or property"),
                }
            }

            Instruction::Control {
                kind,
                target,
                p1,
                p2,
                p3,
                p4,
            } => {
                let Some(building) = self.vars.building(*target) else {
                    return;
                };
                let Some(controllable) = building.controllable() else {
                    trace!(?kind, "control target is not controllable");
                    return;
                };

                let first = if kind.takes_object() {
                    Value::Object(self.vars.obj(*p1).cloned())
                } else {
                    Value::Number(self.vars.num(*p1))
                };
                controllable.control(
                    *kind,
                    first,
                    self.vars.num(*p2),
                    self.vars.num(*p3),
                    self.vars.num(*p4),
                );
            }

            _ => unreachable!("Non-sensing instruction in sensing handler"),
        }
    }

    /// Sensing capability of the building or unit in `target`
    fn senseable(&self, target: usize) -> Option<&dyn Senseable> {
        match self.vars.obj(target)? {
            Object::Building(building) => building.senseable(),
            Object::Unit(unit) => unit.senseable(),
            _ => None,
        }
    }
}
