//! Capability surface consumed from the host simulation
//!
//! The executor never sees concrete world or entity types. Buildings and
//! units are reached through [`BuildingRef`] / [`UnitRef`] handles, and every
//! optional ability (memory, displays, sensing, payloads, mining, building)
//! is discovered at run time through an accessor returning `Option`.
//! Absence of a capability always degrades to a no-op or a default value.
//!
//! Hosts use interior mutability behind these traits; the executor only ever
//! holds shared handles.

use crate::logic_ai::{BuildPlan, LogicAi};
use crate::value::{Content, Object, Property, Team, Value};
use crate::vm::DrawCommand;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// World units per tile
pub const TILE_SIZE: f32 = 8.0;

/// Convert a world coordinate to logic (tile) units
#[inline]
pub fn world_to_logic(value: f32) -> f64 {
    (value / TILE_SIZE) as f64
}

/// Convert a logic (tile) coordinate to world units
#[inline]
pub fn logic_to_world(value: f32) -> f32 {
    value * TILE_SIZE
}

/// Nearest tile index for a world coordinate
#[inline]
pub fn world_to_tile(value: f32) -> i32 {
    (value / TILE_SIZE).round() as i32
}

/// Position in world units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dst2(&self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn dst(&self, other: Vec2) -> f32 {
        self.dst2(other).sqrt()
    }

    /// Strictly closer than `radius` to `other`
    pub fn within(&self, other: Vec2, radius: f32) -> bool {
        self.dst2(other) < radius * radius
    }
}

/// Tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing a world position
    pub fn from_world(pos: Vec2) -> Self {
        Self::new(world_to_tile(pos.x), world_to_tile(pos.y))
    }
}

/// Opaque block-flag identifier used by building searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockFlag(pub u16);

/// Block occupying a tile, as reported to logic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBlock {
    pub block: Content,
    pub rotation: i32,
}

/// Items a unit is carrying
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemStack {
    pub item: Option<Content>,
    pub amount: i32,
}

/// Result of a polymorphic property sense
#[derive(Debug, Clone, PartialEq)]
pub enum Sensed {
    Number(f64),
    Object(Option<Object>),
}

// ===== Object capabilities =====

/// Objects that answer property queries
pub trait Senseable {
    /// Numeric sense keyed by content (e.g. item count)
    fn sense(&self, content: Content) -> f64;

    /// Sense a named property; may answer with a number or an object
    fn sense_property(&self, property: Property) -> Sensed;
}

/// Addressable numeric storage of fixed capacity
pub trait MemoryCell {
    fn capacity(&self) -> usize;

    /// Read a cell; callers guarantee `address < capacity()`
    fn read(&self, address: usize) -> f64;

    /// Write a cell; callers guarantee `address < capacity()`
    fn write(&self, address: usize, value: f64);
}

/// Display with a bounded queue of draw commands
pub trait GraphicsDisplay {
    /// Maximum number of queued commands
    fn capacity(&self) -> usize;

    /// Commands currently queued
    fn queued(&self) -> usize;

    fn push(&self, command: DrawCommand);
}

/// Display showing a single text message
pub trait TextDisplay {
    fn set_message(&self, text: &str);
}

/// Building that accepts property-tagged control commands
pub trait Controllable {
    fn control(&self, property: Property, p1: Value, p2: f64, p3: f64, p4: f64);
}

/// Units able to carry payloads
pub trait PayloadHolder {
    fn has_payload(&self) -> bool;
    fn can_pick_up_unit(&self, unit: &UnitRef) -> bool;
    fn can_pick_up_building(&self, building: &BuildingRef) -> bool;
    fn can_pick_up_payload_of(&self, building: &BuildingRef) -> bool;
}

/// Units able to mine ore
pub trait Miner {
    fn valid_mine(&self, tile: TilePos) -> bool;
    fn mine_tile(&self, tile: Option<TilePos>);
}

/// Units able to construct blocks
pub trait Builder {
    fn has_plans(&self) -> bool;
    fn clear_building(&self);
    fn update_building(&self, active: bool);
    fn add_build(&self, plan: BuildPlan);
}

// ===== Entities =====

/// A placed building
pub trait Building {
    fn team(&self) -> Team;
    fn position(&self) -> Vec2;

    /// Sensing/targeting radius in world units
    fn range(&self) -> f32 {
        0.0
    }

    fn rotation(&self) -> i32 {
        0
    }

    /// Whether a payload unit may lift the whole building
    fn can_pick_up(&self) -> bool {
        false
    }

    /// Number of `item` stored
    fn item_count(&self, _item: Content) -> i32 {
        0
    }

    /// How many of `amount` items this building would accept from `source`
    fn accept_stack(&self, _item: Content, _amount: i32, _source: &UnitRef) -> i32 {
        0
    }

    fn memory(&self) -> Option<&dyn MemoryCell> {
        None
    }

    fn graphics_display(&self) -> Option<&dyn GraphicsDisplay> {
        None
    }

    fn text_display(&self) -> Option<&dyn TextDisplay> {
        None
    }

    fn senseable(&self) -> Option<&dyn Senseable> {
        None
    }

    fn controllable(&self) -> Option<&dyn Controllable> {
        None
    }
}

/// Who is currently steering a unit
#[derive(Clone)]
pub enum ControllerKind {
    /// Piloted by a player
    Player,
    /// Part of a formation; outranks logic control
    Formation,
    /// Driven by a logic processor
    Logic(Rc<RefCell<LogicAi>>),
    /// Default or command AI
    Ai,
}

impl fmt::Debug for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerKind::Player => write!(f, "Player"),
            ControllerKind::Formation => write!(f, "Formation"),
            ControllerKind::Logic(_) => write!(f, "Logic"),
            ControllerKind::Ai => write!(f, "Ai"),
        }
    }
}

/// A live unit
pub trait Unit {
    fn team(&self) -> Team;
    fn position(&self) -> Vec2;
    fn unit_type(&self) -> Content;
    fn hit_size(&self) -> f32;

    /// Weapon/sensing radius in world units
    fn range(&self) -> f32;

    fn health(&self) -> f32;
    fn max_health(&self) -> f32;

    fn shield(&self) -> f32 {
        0.0
    }

    fn armor(&self) -> f32 {
        0.0
    }

    fn is_player(&self) -> bool;

    fn is_ai(&self) -> bool {
        !self.is_player()
    }

    fn is_flying(&self) -> bool;

    fn is_grounded(&self) -> bool {
        !self.is_flying()
    }

    fn is_boss(&self) -> bool {
        false
    }

    fn can_shoot(&self) -> bool {
        false
    }

    fn controller(&self) -> ControllerKind;
    fn set_logic_controller(&self, ai: Rc<RefCell<LogicAi>>);

    fn set_flag(&self, flag: f64);

    fn stack(&self) -> ItemStack {
        ItemStack::default()
    }

    /// How many of `item` the unit can still take on
    fn max_accepted(&self, _item: Content) -> i32 {
        0
    }

    fn payload(&self) -> Option<&dyn PayloadHolder> {
        None
    }

    fn miner(&self) -> Option<&dyn Miner> {
        None
    }

    fn builder(&self) -> Option<&dyn Builder> {
        None
    }

    fn senseable(&self) -> Option<&dyn Senseable> {
        None
    }

    fn within(&self, pos: Vec2, radius: f32) -> bool {
        self.position().within(pos, radius)
    }
}

// ===== Handles =====

/// Shared handle to a building; equality is identity
#[derive(Clone)]
pub struct BuildingRef(Rc<dyn Building>);

impl BuildingRef {
    pub fn new(building: Rc<dyn Building>) -> Self {
        Self(building)
    }
}

impl<T: Building + 'static> From<Rc<T>> for BuildingRef {
    fn from(building: Rc<T>) -> Self {
        Self(building)
    }
}

impl Deref for BuildingRef {
    type Target = dyn Building;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for BuildingRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
    }
}

impl fmt::Debug for BuildingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Building@{:p}", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Shared handle to a unit; equality is identity
#[derive(Clone)]
pub struct UnitRef(Rc<dyn Unit>);

impl UnitRef {
    pub fn new(unit: Rc<dyn Unit>) -> Self {
        Self(unit)
    }
}

impl<T: Unit + 'static> From<Rc<T>> for UnitRef {
    fn from(unit: Rc<T>) -> Self {
        Self(unit)
    }
}

impl Deref for UnitRef {
    type Target = dyn Unit;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for UnitRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
    }
}

impl fmt::Debug for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit@{:p}", Rc::as_ptr(&self.0) as *const ())
    }
}

// ===== World services =====

/// Spatial queries and world-mutating actions provided by the simulation
pub trait World {
    /// Simulation time in ticks
    fn ticks(&self) -> f64;

    /// Wall-clock milliseconds, exposed to programs through the time slot
    fn millis(&self) -> f64;

    /// Teams currently present in the match
    fn present_teams(&self) -> Vec<Team>;

    /// All units of `unit_type` belonging to `team`, in stable order
    fn units_of_type(&self, team: Team, unit_type: Content) -> Vec<UnitRef>;

    /// Units of `team` whose hitbox may overlap the circle
    fn units_nearby(&self, team: Team, center: Vec2, range: f32) -> Vec<UnitRef>;

    /// World position of the closest ore tile yielding `item`
    fn closest_ore(&self, from: Vec2, item: Content) -> Option<Vec2>;

    /// Closest building with `flag`, allied to `team` or hostile to it
    fn closest_building(
        &self,
        from: Vec2,
        team: Team,
        flag: BlockFlag,
        enemy: bool,
    ) -> Option<BuildingRef>;

    /// World position of the closest enemy spawn point
    fn closest_spawn(&self, from: Vec2) -> Option<Vec2>;

    /// Closest damaged building of `team`
    fn closest_damaged(&self, team: Team, from: Vec2) -> Option<BuildingRef>;

    fn tile_in_bounds(&self, tile: TilePos) -> bool;

    /// Block on a tile; environmental walls are reported as a generic solid block
    fn block_at(&self, tile: TilePos) -> Option<TileBlock>;

    fn building_at(&self, tile: TilePos) -> Option<BuildingRef>;

    fn drop_payload(&mut self, carrier: &UnitRef);
    fn pick_up_unit(&mut self, carrier: &UnitRef, target: &UnitRef);

    /// `whole` lifts the building itself, otherwise the payload it holds
    fn pick_up_building(&mut self, carrier: &UnitRef, building: &BuildingRef, whole: bool);

    fn transfer_items_to(&mut self, unit: &UnitRef, item: Content, amount: i32, to: &BuildingRef);
    fn take_items(&mut self, from: &BuildingRef, item: Content, amount: i32, unit: &UnitRef);
}
