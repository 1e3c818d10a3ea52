//! Bounded output accumulators shared by the output instructions

use crate::instruction::DrawOp;
use serde::{Deserialize, Serialize};

/// Encoded draw command: opcode plus six integer operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub op: DrawOp,
    pub x: i32,
    pub y: i32,
    pub p1: i32,
    pub p2: i32,
    pub p3: i32,
    pub p4: i32,
}

/// Graphics queue and text builder of one executor
#[derive(Debug, Clone, Default)]
pub struct OutputBuffers {
    graphics: Vec<DrawCommand>,
    text: String,
    text_chars: usize,
}

impl OutputBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graphics(&self) -> &[DrawCommand] {
        &self.graphics
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text buffer in characters
    pub fn text_len(&self) -> usize {
        self.text_chars
    }

    /// Queue a command unless `capacity` is reached. Returns whether it was kept.
    pub(crate) fn push_graphics(&mut self, command: DrawCommand, capacity: usize) -> bool {
        if self.graphics.len() < capacity {
            self.graphics.push(command);
            true
        } else {
            false
        }
    }

    pub(crate) fn take_graphics(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.graphics)
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.text_chars += text.chars().count();
    }

    /// First `limit` characters of the text buffer
    pub(crate) fn text_prefix(&self, limit: usize) -> &str {
        match self.text.char_indices().nth(limit) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    pub(crate) fn clear_text(&mut self) {
        self.text.clear();
        self.text_chars = 0;
    }

    pub(crate) fn clear(&mut self) {
        self.graphics.clear();
        self.clear_text();
    }
}
