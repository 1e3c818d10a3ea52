//! In-memory world for headless runs
//!
//! There are no units and no map: unit queries come back empty and every
//! world-mutating request is only logged. The processor's links are plain
//! blocks backed by a memory cell, a message box or a display queue.

use logic_vm::capability::{
    BlockFlag, Building, GraphicsDisplay, MemoryCell, TextDisplay, TileBlock, TilePos, Vec2,
};
use logic_vm::{BuildingRef, Content, DrawCommand, Team, UnitRef, World};
use std::cell::RefCell;
use tracing::debug;

/// Ticks per second of simulated time
const TICKS_PER_SECOND: f64 = 60.0;

pub struct HeadlessWorld {
    ticks: f64,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self { ticks: 0.0 }
    }

    pub fn tick(&mut self) {
        self.ticks += 1.0;
    }
}

impl World for HeadlessWorld {
    fn ticks(&self) -> f64 {
        self.ticks
    }

    fn millis(&self) -> f64 {
        self.ticks * 1000.0 / TICKS_PER_SECOND
    }

    fn present_teams(&self) -> Vec<Team> {
        Vec::new()
    }

    fn units_of_type(&self, _team: Team, _unit_type: Content) -> Vec<UnitRef> {
        Vec::new()
    }

    fn units_nearby(&self, _team: Team, _center: Vec2, _range: f32) -> Vec<UnitRef> {
        Vec::new()
    }

    fn closest_ore(&self, _from: Vec2, _item: Content) -> Option<Vec2> {
        None
    }

    fn closest_building(
        &self,
        _from: Vec2,
        _team: Team,
        _flag: BlockFlag,
        _enemy: bool,
    ) -> Option<BuildingRef> {
        None
    }

    fn closest_spawn(&self, _from: Vec2) -> Option<Vec2> {
        None
    }

    fn closest_damaged(&self, _team: Team, _from: Vec2) -> Option<BuildingRef> {
        None
    }

    fn tile_in_bounds(&self, _tile: TilePos) -> bool {
        false
    }

    fn block_at(&self, _tile: TilePos) -> Option<TileBlock> {
        None
    }

    fn building_at(&self, _tile: TilePos) -> Option<BuildingRef> {
        None
    }

    fn drop_payload(&mut self, carrier: &UnitRef) {
        debug!(?carrier, "payload drop ignored");
    }

    fn pick_up_unit(&mut self, carrier: &UnitRef, _target: &UnitRef) {
        debug!(?carrier, "unit pickup ignored");
    }

    fn pick_up_building(&mut self, carrier: &UnitRef, _building: &BuildingRef, _whole: bool) {
        debug!(?carrier, "building pickup ignored");
    }

    fn transfer_items_to(&mut self, unit: &UnitRef, _item: Content, amount: i32, _to: &BuildingRef) {
        debug!(?unit, amount, "item transfer ignored");
    }

    fn take_items(&mut self, _from: &BuildingRef, _item: Content, amount: i32, unit: &UnitRef) {
        debug!(?unit, amount, "item take ignored");
    }
}

// ===== Linked blocks =====

pub struct MemoryBlock {
    cells: RefCell<Vec<f64>>,
}

impl MemoryBlock {
    pub fn new(size: usize) -> Self {
        Self {
            cells: RefCell::new(vec![0.0; size]),
        }
    }

    pub fn cells(&self) -> Vec<f64> {
        self.cells.borrow().clone()
    }
}

impl MemoryCell for MemoryBlock {
    fn capacity(&self) -> usize {
        self.cells.borrow().len()
    }

    fn read(&self, address: usize) -> f64 {
        self.cells.borrow().get(address).copied().unwrap_or(0.0)
    }

    fn write(&self, address: usize, value: f64) {
        if let Some(cell) = self.cells.borrow_mut().get_mut(address) {
            *cell = value;
        }
    }
}

#[derive(Default)]
pub struct MessageBlock {
    text: RefCell<String>,
}

impl MessageBlock {
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }
}

impl TextDisplay for MessageBlock {
    fn set_message(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }
}

pub struct DisplayBlock {
    capacity: usize,
    commands: RefCell<Vec<DrawCommand>>,
}

impl DisplayBlock {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.borrow().clone()
    }
}

impl GraphicsDisplay for DisplayBlock {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn queued(&self) -> usize {
        self.commands.borrow().len()
    }

    fn push(&self, command: DrawCommand) {
        self.commands.borrow_mut().push(command);
    }
}

/// A linked block exposing at most one of each capability
pub struct LinkedBlock {
    pub team: Team,
    pub position: Vec2,
    pub memory: Option<MemoryBlock>,
    pub message: Option<MessageBlock>,
    pub display: Option<DisplayBlock>,
}

impl LinkedBlock {
    pub fn new(team: Team, x: f32) -> Self {
        Self {
            team,
            position: Vec2::new(x, 0.0),
            memory: None,
            message: None,
            display: None,
        }
    }
}

impl Building for LinkedBlock {
    fn team(&self) -> Team {
        self.team
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn memory(&self) -> Option<&dyn MemoryCell> {
        self.memory.as_ref().map(|m| m as &dyn MemoryCell)
    }

    fn graphics_display(&self) -> Option<&dyn GraphicsDisplay> {
        self.display.as_ref().map(|d| d as &dyn GraphicsDisplay)
    }

    fn text_display(&self) -> Option<&dyn TextDisplay> {
        self.message.as_ref().map(|m| m as &dyn TextDisplay)
    }
}
