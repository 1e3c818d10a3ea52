//! Variable bank
//!
//! A fixed, indexed array of named slots. Slots 0-3 are reserved:
//!
//! | slot | name      | meaning                               |
//! |------|-----------|---------------------------------------|
//! | 0    | `@counter`| program counter                       |
//! | 1    | `@time`   | milliseconds, refreshed every dispatch |
//! | 2    | `@unit`   | currently bound unit                  |
//! | 3    | `@this`   | owning processor (constant)           |
//!
//! All accessors are total: a slot index past the end reads as the default
//! and writes to it are dropped, and writes to constant slots are dropped.

use crate::capability::{BuildingRef, UnitRef};
use crate::value::{sanitize, Object, Value};
use tracing::trace;

/// Program counter slot
pub const VAR_COUNTER: usize = 0;
/// Elapsed-time slot
pub const VAR_TIME: usize = 1;
/// Bound unit slot
pub const VAR_UNIT: usize = 2;
/// Self-reference slot
pub const VAR_THIS: usize = 3;
/// Number of reserved leading slots
pub const RESERVED_SLOTS: usize = 4;

/// Named variable slot
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub name: String,
    pub value: Value,
    pub constant: bool,
}

impl Var {
    pub fn new(name: impl Into<String>, value: Value, constant: bool) -> Self {
        Self {
            name: name.into(),
            value,
            constant,
        }
    }
}

/// Slot storage for one loaded program
#[derive(Debug, Clone, Default)]
pub struct VariableBank {
    vars: Vec<Var>,
}

impl VariableBank {
    pub fn new(vars: Vec<Var>) -> Self {
        Self { vars }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Var> {
        self.vars.get(idx)
    }

    /// Look a slot up by name
    pub fn by_name(&self, name: &str) -> Option<&Var> {
        self.vars.iter().find(|v| v.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Var> {
        self.vars.iter()
    }

    /// Raw value of a slot
    #[inline]
    pub fn value(&self, idx: usize) -> Option<&Value> {
        self.vars.get(idx).map(|v| &v.value)
    }

    pub fn is_object(&self, idx: usize) -> bool {
        self.value(idx).map_or(false, Value::is_object)
    }

    // ===== Reads =====

    /// Object payload, if the slot holds a non-null object
    #[inline]
    pub fn obj(&self, idx: usize) -> Option<&Object> {
        self.value(idx).and_then(Value::object)
    }

    pub fn building(&self, idx: usize) -> Option<&BuildingRef> {
        self.obj(idx).and_then(Object::as_building)
    }

    pub fn unit(&self, idx: usize) -> Option<&UnitRef> {
        self.obj(idx).and_then(Object::as_unit)
    }

    #[inline]
    pub fn bool(&self, idx: usize) -> bool {
        self.value(idx).map_or(false, Value::truthy)
    }

    #[inline]
    pub fn num(&self, idx: usize) -> f64 {
        self.value(idx).map_or(0.0, Value::num)
    }

    #[inline]
    pub fn numf(&self, idx: usize) -> f32 {
        self.num(idx) as f32
    }

    #[inline]
    pub fn numi(&self, idx: usize) -> i32 {
        self.num(idx) as i32
    }

    // ===== Writes =====

    fn writable(&mut self, idx: usize) -> Option<&mut Var> {
        match self.vars.get_mut(idx) {
            Some(var) if var.constant => {
                trace!(slot = idx, name = %var.name, "write to constant dropped");
                None
            }
            other => other,
        }
    }

    /// Store a number, sanitizing NaN/infinite to 0
    pub fn set_num(&mut self, idx: usize, value: f64) {
        if let Some(var) = self.writable(idx) {
            var.value = Value::Number(sanitize(value));
        }
    }

    pub fn set_bool(&mut self, idx: usize, value: bool) {
        self.set_num(idx, if value { 1.0 } else { 0.0 });
    }

    /// Store an object (possibly null)
    pub fn set_obj(&mut self, idx: usize, value: Option<Object>) {
        if let Some(var) = self.writable(idx) {
            var.value = Value::Object(value);
        }
    }

    /// Store any value, keeping its tag
    pub fn set_value(&mut self, idx: usize, value: Value) {
        match value {
            Value::Number(n) => self.set_num(idx, n),
            Value::Object(obj) => self.set_obj(idx, obj),
        }
    }

    /// Privileged write that ignores the constant flag
    pub fn force(&mut self, idx: usize, value: Value) {
        if let Some(var) = self.vars.get_mut(idx) {
            var.value = match value {
                Value::Number(n) => Value::Number(sanitize(n)),
                obj => obj,
            };
        }
    }

    /// Privileged object write, used for unit binding
    pub fn force_obj(&mut self, idx: usize, value: Option<Object>) {
        self.force(idx, Value::Object(value));
    }
}
