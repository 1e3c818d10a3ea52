//! Value types for the logic VM
//!
//! Every variable slot holds a [`Value`]: either a number or an object
//! reference. A null object is still an object; there is no third "empty" state.

use crate::capability::{BuildingRef, UnitRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Tagged slot value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numeric scalar. Never NaN or infinite once stored through the bank.
    Number(f64),
    /// Object reference; `None` is the null object.
    Object(Option<Object>),
}

impl Value {
    /// The null object
    pub const NULL: Value = Value::Object(None);

    /// Whether the object payload is the meaningful one
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Object payload, if this value is an object
    pub fn object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => obj.as_ref(),
            Value::Number(_) => None,
        }
    }

    /// Numeric view: objects read as 1 when non-null, 0 when null;
    /// degenerate numbers read as 0.
    pub fn num(&self) -> f64 {
        match self {
            Value::Object(obj) => {
                if obj.is_some() {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => sanitize(*n),
        }
    }

    /// Truthiness: non-null objects, or numbers at least 1e-5 away from zero
    pub fn truthy(&self) -> bool {
        match self {
            Value::Object(obj) => obj.is_some(),
            Value::Number(n) => n.abs() >= 0.00001,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(0.0)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(sanitize(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Number(if b { 1.0 } else { 0.0 })
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(Some(obj))
    }
}

impl From<Option<Object>> for Value {
    fn from(obj: Option<Object>) -> Self {
        Value::Object(obj)
    }
}

/// Replace NaN and infinities with zero
#[inline]
pub fn sanitize(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Non-null object payload
#[derive(Clone)]
pub enum Object {
    /// String literal
    Text(Rc<str>),
    /// Static game content (items, blocks, liquids, unit types)
    Content(Content),
    /// Named sensor property tag
    Property(Property),
    /// A placed building
    Building(BuildingRef),
    /// A live unit
    Unit(UnitRef),
}

impl Object {
    /// Bracketed tag used when printing non-text objects
    pub fn type_tag(&self) -> &str {
        match self {
            Object::Text(text) => text,
            Object::Content(_) => "[content]",
            Object::Building(_) => "[building]",
            Object::Unit(_) => "[unit]",
            Object::Property(_) => "[object]",
        }
    }

    pub fn as_building(&self) -> Option<&BuildingRef> {
        match self {
            Object::Building(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<&UnitRef> {
        match self {
            Object::Unit(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<Content> {
        match self {
            Object::Content(c) => Some(*c),
            _ => None,
        }
    }
}

// Buildings and units compare by identity, everything else by value.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Text(a), Object::Text(b)) => a == b,
            (Object::Content(a), Object::Content(b)) => a == b,
            (Object::Property(a), Object::Property(b)) => a == b,
            (Object::Building(a), Object::Building(b)) => a == b,
            (Object::Unit(a), Object::Unit(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Text(text) => write!(f, "Text({:?})", text),
            Object::Content(c) => write!(f, "{:?}", c),
            Object::Property(p) => write!(f, "Property({:?})", p),
            Object::Building(b) => write!(f, "{:?}", b),
            Object::Unit(u) => write!(f, "{:?}", u),
        }
    }
}

/// Content category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Item,
    Block,
    Liquid,
    Unit,
}

/// Reference to a piece of static content, by category and numeric id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Content {
    pub kind: ContentKind,
    pub id: u16,
}

impl Content {
    pub const fn new(kind: ContentKind, id: u16) -> Self {
        Self { kind, id }
    }

    pub const fn item(id: u16) -> Self {
        Self::new(ContentKind::Item, id)
    }

    pub const fn block(id: u16) -> Self {
        Self::new(ContentKind::Block, id)
    }

    pub const fn unit(id: u16) -> Self {
        Self::new(ContentKind::Unit, id)
    }

    pub fn is_item(&self) -> bool {
        self.kind == ContentKind::Item
    }

    pub fn is_block(&self) -> bool {
        self.kind == ContentKind::Block
    }

    pub fn is_unit_type(&self) -> bool {
        self.kind == ContentKind::Unit
    }
}

/// Team identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Team(pub u8);

impl Team {
    /// Neutral team owning unclaimed structures
    pub const DERELICT: Team = Team(0);
}

/// Named properties a senseable object can be queried for, and the
/// command kinds a controllable building accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    TotalItems,
    FirstItem,
    TotalLiquids,
    TotalPower,
    ItemCapacity,
    LiquidCapacity,
    PowerCapacity,
    PowerNetStored,
    PowerNetCapacity,
    PowerNetIn,
    PowerNetOut,
    Ammo,
    AmmoCapacity,
    Health,
    MaxHealth,
    Heat,
    Efficiency,
    Rotation,
    X,
    Y,
    ShootX,
    ShootY,
    Shooting,
    MineX,
    MineY,
    Mining,
    Team,
    Type,
    Flag,
    Controlled,
    Controller,
    Commanded,
    Name,
    Config,
    PayloadCount,
    PayloadType,

    // Controllable
    Enabled,
    Color,
    Shoot,
    Shootp,
    Configure,
}

impl Property {
    /// Control commands whose first operand is an object rather than a number
    pub fn takes_object(&self) -> bool {
        matches!(self, Property::Shootp | Property::Configure)
    }
}
