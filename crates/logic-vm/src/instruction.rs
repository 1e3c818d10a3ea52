//! Instruction set for the logic VM
//!
//! A program is a fixed sequence of [`Instruction`] values. Operands are
//! always slot indices into the variable bank; configuration is carried as
//! small enums. A few instructions also own private cache/timer state that
//! persists across dispatches and is never serialized.

use crate::capability::{BlockFlag, UnitRef};
use crate::value::Property;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single VM instruction
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "instruction", rename_all = "camelCase")]
pub enum Instruction {
    // ===== Flow control =====
    /// Placeholder for elided or invalid instructions
    Noop,
    /// Restart: counter = instruction count, wraps to 0 on the next dispatch
    End,
    /// if op(R[value], R[compare]) then counter = address
    Jump {
        cond: ConditionOp,
        value: usize,
        compare: usize,
        /// `None` when the assembler could not resolve the label
        address: Option<usize>,
    },

    // ===== Operations =====
    /// R[to] = R[from]
    Set { from: usize, to: usize },
    /// R[dest] = op(R[a], R[b])
    Op {
        op: LogicOp,
        a: usize,
        b: usize,
        dest: usize,
    },

    // ===== Memory =====
    /// R[output] = links[R[index]]
    GetLink { output: usize, index: usize },
    /// R[output] = R[target].memory[R[address]]
    Read {
        target: usize,
        address: usize,
        output: usize,
    },
    /// R[target].memory[R[address]] = R[value]
    Write {
        target: usize,
        address: usize,
        value: usize,
    },

    // ===== World =====
    /// R[output] = R[target].sense(R[property])
    Sense {
        target: usize,
        property: usize,
        output: usize,
    },
    /// R[target].control(kind, R[p1..p4])
    Control {
        kind: Property,
        target: usize,
        p1: usize,
        p2: usize,
        p3: usize,
        p4: usize,
    },
    /// R[output] = best unit around R[base] passing all three filters
    Radar {
        filters: [RadarTarget; 3],
        sort: RadarSort,
        base: usize,
        order: usize,
        output: usize,
        #[serde(skip)]
        cache: RadarCache,
    },

    // ===== Units =====
    /// @unit = next unit of type R[unit_type]
    UnitBind {
        unit_type: usize,
        #[serde(skip)]
        cursor: usize,
    },
    /// Locate something for the bound unit, writing (x, y, found)
    UnitLocate {
        kind: LocateKind,
        flag: BlockFlag,
        enemy: usize,
        ore: usize,
        out_x: usize,
        out_y: usize,
        out_found: usize,
    },
    /// Issue a command to the bound unit
    UnitControl {
        command: UnitCommand,
        p1: usize,
        p2: usize,
        p3: usize,
        p4: usize,
    },

    // ===== Output =====
    /// Queue a draw command
    Draw {
        draw: DrawOp,
        x: usize,
        y: usize,
        p1: usize,
        p2: usize,
        p3: usize,
        p4: usize,
    },
    /// Move queued draw commands into the display at R[target]
    DrawFlush { target: usize },
    /// Append R[value] to the text buffer
    Print { value: usize },
    /// Replace the message at R[target] with the text buffer
    PrintFlush { target: usize },
}

impl Instruction {
    /// Every slot index this instruction reads or writes
    pub fn slots(&self) -> Vec<usize> {
        match self {
            Instruction::Noop | Instruction::End => vec![],
            Instruction::Jump { value, compare, .. } => vec![*value, *compare],
            Instruction::Set { from, to } => vec![*from, *to],
            Instruction::Op { a, b, dest, .. } => vec![*a, *b, *dest],
            Instruction::GetLink { output, index } => vec![*output, *index],
            Instruction::Read {
                target,
                address,
                output,
            } => vec![*target, *address, *output],
            Instruction::Write {
                target,
                address,
                value,
            } => vec![*target, *address, *value],
            Instruction::Sense {
                target,
                property,
                output,
            } => vec![*target, *property, *output],
            Instruction::Control {
                target,
                p1,
                p2,
                p3,
                p4,
                ..
            } => vec![*target, *p1, *p2, *p3, *p4],
            Instruction::Radar {
                base,
                order,
                output,
                ..
            } => vec![*base, *order, *output],
            Instruction::UnitBind { unit_type, .. } => vec![*unit_type],
            Instruction::UnitLocate {
                enemy,
                ore,
                out_x,
                out_y,
                out_found,
                ..
            } => vec![*enemy, *ore, *out_x, *out_y, *out_found],
            Instruction::UnitControl { p1, p2, p3, p4, .. } => vec![*p1, *p2, *p3, *p4],
            Instruction::Draw {
                x,
                y,
                p1,
                p2,
                p3,
                p4,
                ..
            } => vec![*x, *y, *p1, *p2, *p3, *p4],
            Instruction::DrawFlush { target } => vec![*target],
            Instruction::Print { value } => vec![*value],
            Instruction::PrintFlush { target } => vec![*target],
        }
    }

    /// Short mnemonic, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Noop => "noop",
            Instruction::End => "end",
            Instruction::Jump { .. } => "jump",
            Instruction::Set { .. } => "set",
            Instruction::Op { .. } => "op",
            Instruction::GetLink { .. } => "getlink",
            Instruction::Read { .. } => "read",
            Instruction::Write { .. } => "write",
            Instruction::Sense { .. } => "sensor",
            Instruction::Control { .. } => "control",
            Instruction::Radar { .. } => "radar",
            Instruction::UnitBind { .. } => "ubind",
            Instruction::UnitLocate { .. } => "ulocate",
            Instruction::UnitControl { .. } => "ucontrol",
            Instruction::Draw { .. } => "draw",
            Instruction::DrawFlush { .. } => "drawflush",
            Instruction::Print { .. } => "print",
            Instruction::PrintFlush { .. } => "printflush",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ===== Operators =====

/// Comparison used by `Jump`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
    StrictEqual,
    Always,
}

/// Operator used by `Op`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicOp {
    Add,
    Sub,
    Mul,
    Div,
    Idiv,
    Mod,
    Pow,
    Equal,
    NotEqual,
    Land,
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
    StrictEqual,
    Shl,
    Shr,
    Or,
    And,
    Xor,
    Not,
    Max,
    Min,
    Angle,
    Len,
    Noise,
    Abs,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Floor,
    Ceil,
    Sqrt,
    Rand,
}

impl LogicOp {
    /// Operators that only read their first operand
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            LogicOp::Not
                | LogicOp::Abs
                | LogicOp::Log
                | LogicOp::Log10
                | LogicOp::Sin
                | LogicOp::Cos
                | LogicOp::Tan
                | LogicOp::Floor
                | LogicOp::Ceil
                | LogicOp::Sqrt
                | LogicOp::Rand
        )
    }

    /// Operators with a dedicated object comparison
    pub fn has_object_variant(&self) -> bool {
        matches!(
            self,
            LogicOp::Equal | LogicOp::NotEqual | LogicOp::StrictEqual
        )
    }
}

// ===== Targeting =====

/// Unit filter applied by `Radar`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RadarTarget {
    Any,
    Enemy,
    Ally,
    Player,
    Attacker,
    Flying,
    Boss,
    Ground,
}

/// Ranking applied by `Radar`; the highest score (times direction) wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RadarSort {
    Distance,
    Health,
    Shield,
    Armor,
    MaxHealth,
}

/// Target kind searched by `UnitLocate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocateKind {
    Ore,
    Building,
    Spawn,
    Damaged,
}

/// Command kinds accepted by `UnitControl`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitCommand {
    Idle,
    Stop,
    Move,
    Approach,
    Pathfind,
    Target,
    Targetp,
    ItemDrop,
    ItemTake,
    PayDrop,
    PayTake,
    Mine,
    Flag,
    Build,
    GetBlock,
    Within,
    Boost,
}

/// Draw command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawOp {
    Clear,
    Color,
    Stroke,
    Line,
    Rect,
    LineRect,
    Poly,
    LinePoly,
    Triangle,
    Image,
}

// ===== Instance state =====

/// Fixed-interval gate; fires on first use, then once per interval
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RefreshTimer {
    last: Option<f64>,
}

impl RefreshTimer {
    pub fn get(&mut self, now: f64, interval: f64) -> bool {
        match self.last {
            Some(last) if now - last < interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Last radar result, held between refreshes
#[derive(Debug, Clone, Default)]
pub struct RadarCache {
    pub timer: RefreshTimer,
    pub last_target: Option<UnitRef>,
}
