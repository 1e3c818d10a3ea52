//! Draw and print instruction execution

use crate::instruction::Instruction;
use crate::value::Value;
use crate::variables::VAR_COUNTER;
use crate::vm::buffers::DrawCommand;
use crate::vm::LogicExecutor;
use tracing::trace;

impl LogicExecutor {
    /// Execute `Draw`, `DrawFlush`, `Print` and `PrintFlush`
    pub(crate) fn execute_output(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Draw {
                draw,
                x,
                y,
                p1,
                p2,
                p3,
                p4,
            } => {
                if self.config.headless {
                    return;
                }

                let command = DrawCommand {
                    op: *draw,
                    x: self.vars.numi(*x),
                    y: self.vars.numi(*y),
                    p1: self.vars.numi(*p1),
                    p2: self.vars.numi(*p2),
                    p3: self.vars.numi(*p3),
                    p4: self.vars.numi(*p4),
                };
                if !self
                    .buffers
                    .push_graphics(command, self.config.graphics_capacity)
                {
                    trace!("graphics buffer full, draw dropped");
                }
            }

            Instruction::DrawFlush { target } => {
                if self.config.headless {
                    return;
                }

                let Some(display) = self
                    .vars
                    .building(*target)
                    .and_then(|building| building.graphics_display())
                else {
                    return;
                };

                let room = display.capacity().saturating_sub(display.queued());
                let commands = self.buffers.take_graphics();
                if commands.len() > room {
                    trace!(dropped = commands.len() - room, "display full");
                }
                for command in commands.into_iter().take(room) {
                    display.push(command);
                }
            }

            Instruction::Print { value } => {
                if self.buffers.text_len() >= self.config.text_capacity {
                    trace!("text buffer full, print dropped");
                    return;
                }

                let text = match self.vars.value(*value) {
                    Some(Value::Object(obj)) if *value != VAR_COUNTER => match obj {
                        None => "null".to_string(),
                        Some(obj) => obj.type_tag().to_string(),
                    },
                    _ => format_number(self.vars.num(*value)),
                };
                self.buffers.push_text(&text);
            }

            Instruction::PrintFlush { target } => {
                let Some(display) = self
                    .vars
                    .building(*target)
                    .and_then(|building| building.text_display())
                else {
                    return;
                };

                display.set_message(self.buffers.text_prefix(self.config.text_capacity));
                self.buffers.clear_text();
            }

            _ => unreachable!("Non-output instruction in output handler"),
        }
    }
}

/// Integers print without a fractional part, everything else as a decimal
fn format_number(n: f64) -> String {
    let whole = n as i64;
    if (n - whole as f64).abs() < 0.000001 {
        whole.to_string()
    } else {
        n.to_string()
    }
}
