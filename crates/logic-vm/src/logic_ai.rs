//! Controller state installed on units driven by a logic program
//!
//! The executor writes intents (move target, aim, build plan) into a
//! [`LogicAi`]; the host's unit behavior reads them and calls
//! [`LogicAi::update`] once per tick to run down the cooldown timers.

use crate::capability::{BuildingRef, Vec2};
use crate::value::{Content, Object};
use std::collections::{HashMap, HashSet};

/// Ticks between payload or item transfers
pub const TRANSFER_DELAY: f32 = 60.0 * 1.5;

/// Ticks of inactivity after which the host should hand the unit back
pub const LOGIC_CONTROL_TIMEOUT: f32 = 60.0 * 10.0;

/// Ticks between target-refresh windows
pub const TARGET_REFRESH_TICKS: f32 = 40.0;

/// Minimum block query radius of a unit, in world units
pub const BUILDING_RANGE: f32 = 220.0;

/// Maximum distance between a unit and a building exchanging items
pub const ITEM_TRANSFER_RANGE: f32 = 45.0;

/// Identity of one instruction instance inside one loaded program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionKey {
    pub program: u64,
    pub index: usize,
}

/// Movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    #[default]
    Idle,
    Stop,
    Move,
    Approach,
    Pathfind,
}

/// Aim intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AimMode {
    #[default]
    None,
    /// Aim at a fixed world point
    Point,
    /// Track a unit or building
    Target,
}

/// Pending construction request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildPlan {
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
    pub block: Option<Content>,
    pub progress: f32,
    pub initialized: bool,
    pub stuck: bool,
}

impl BuildPlan {
    pub fn set(&mut self, x: i32, y: i32, rotation: i32, block: Content) {
        self.x = x;
        self.y = y;
        self.rotation = rotation;
        self.block = Some(block);
    }

    pub fn reset_progress(&mut self) {
        self.progress = 0.0;
        self.initialized = false;
        self.stuck = false;
    }
}

/// Result of the last locate refresh for one instruction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocateCache {
    pub x: f64,
    pub y: f64,
    pub found: bool,
}

/// Logic-driven unit controller
#[derive(Debug, Default)]
pub struct LogicAi {
    /// Processor that took control of the unit
    pub controller: Option<BuildingRef>,

    pub control: ControlMode,
    pub move_x: f32,
    pub move_y: f32,
    pub move_radius: f32,

    pub aim: AimMode,
    pub aim_point: Vec2,
    /// Unit or building being tracked when `aim` is `Target`
    pub main_target: Option<Object>,
    pub shoot: bool,
    pub boost: bool,

    pub plan: BuildPlan,

    pub pay_timer: f32,
    pub item_timer: f32,
    pub build_timer: f32,
    pub control_timer: f32,

    target_timer: f32,
    refreshed: HashSet<InstructionKey>,
    locate_cache: HashMap<InstructionKey, LocateCache>,
    /// Program whose instructions own the current locate cache entries
    cache_program: Option<u64>,
}

impl LogicAi {
    pub fn new(controller: Option<BuildingRef>) -> Self {
        Self {
            controller,
            control_timer: LOGIC_CONTROL_TIMEOUT,
            ..Self::default()
        }
    }

    /// Whether `key` may re-run its world query in the current refresh window.
    /// Returns true at most once per instruction per window.
    pub fn check_target_timer(&mut self, key: InstructionKey) -> bool {
        self.refreshed.insert(key)
    }

    /// Cached locate result for an instruction. Entries of any other
    /// program are dropped the first time a new program asks.
    pub fn locate_cache(&mut self, key: InstructionKey) -> &mut LocateCache {
        if self.cache_program != Some(key.program) {
            self.locate_cache.retain(|cached, _| cached.program == key.program);
            self.cache_program = Some(key.program);
        }
        self.locate_cache.entry(key).or_default()
    }

    /// Number of instructions with a cached locate result
    pub fn cached_locates(&self) -> usize {
        self.locate_cache.len()
    }

    /// Advance timers by `delta` ticks
    pub fn update(&mut self, delta: f32) {
        self.pay_timer -= delta;
        self.item_timer -= delta;
        self.build_timer -= delta;
        self.control_timer -= delta;

        self.target_timer -= delta;
        if self.target_timer <= 0.0 {
            self.refreshed.clear();
            self.target_timer = TARGET_REFRESH_TICKS;
        }
    }

    /// Control has lapsed and the host should restore the default controller
    pub fn timed_out(&self) -> bool {
        self.control_timer <= 0.0
    }
}
