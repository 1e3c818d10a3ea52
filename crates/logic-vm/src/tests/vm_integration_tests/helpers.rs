//! Stub world, entities and program-building helpers for integration tests.

use crate::capability::{
    BlockFlag, Builder, Building, BuildingRef, Controllable, ControllerKind, GraphicsDisplay,
    ItemStack, MemoryCell, Miner, PayloadHolder, Senseable, Sensed, TextDisplay, TileBlock,
    TilePos, Unit, UnitRef, Vec2, World,
};
use crate::config::ExecutorConfig;
use crate::instruction::Instruction;
use crate::logic_ai::{BuildPlan, LogicAi};
use crate::program::{Literal, Program, ProgramImage, VariableSpec};
use crate::value::{Content, Object, Property, Team, Value};
use crate::vm::{DrawCommand, LogicExecutor};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub const TEAM: Team = Team(1);
pub const ENEMY: Team = Team(2);

pub const COPPER: Content = Content::item(0);
pub const LEAD: Content = Content::item(1);
pub const MONO: Content = Content::unit(0);
pub const FLARE: Content = Content::unit(1);
pub const CONVEYOR: Content = Content::block(3);

// ===== Program building =====

/// Program image under construction
pub struct TestProgram {
    pub image: ProgramImage,
}

impl TestProgram {
    pub fn new() -> Self {
        Self {
            image: ProgramImage::with_reserved(),
        }
    }

    /// Mutable variable starting at 0
    pub fn var(&mut self, name: &str) -> usize {
        self.image.add_variable(VariableSpec::var(name))
    }

    /// Numeric constant
    pub fn num(&mut self, n: f64) -> usize {
        self.image
            .add_variable(VariableSpec::constant(n.to_string(), Literal::Number(n)))
    }

    pub fn text(&mut self, text: &str) -> usize {
        self.image.add_variable(VariableSpec::constant(
            format!("\"{}\"", text),
            Literal::Text(text.to_string()),
        ))
    }

    pub fn content(&mut self, content: Content) -> usize {
        self.image.add_variable(VariableSpec::constant(
            format!("@{:?}{}", content.kind, content.id),
            Literal::Content(content),
        ))
    }

    pub fn property(&mut self, property: Property) -> usize {
        self.image.add_variable(VariableSpec::constant(
            format!("@{:?}", property),
            Literal::Property(property),
        ))
    }

    pub fn null(&mut self) -> usize {
        self.image
            .add_variable(VariableSpec::constant("null", Literal::Null))
    }

    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.image.push(instruction)
    }

    /// Validate and load into a fresh executor on `TEAM`
    pub fn load(self) -> LogicExecutor {
        self.load_with(ExecutorConfig::default())
    }

    pub fn load_with(self, config: ExecutorConfig) -> LogicExecutor {
        let program = Program::from_image(self.image).unwrap();
        let mut exec = LogicExecutor::new(config);
        exec.set_team(TEAM);
        exec.load(program);
        exec
    }
}

/// Advance `n` times
pub fn run(exec: &mut LogicExecutor, world: &mut TestWorld, n: usize) {
    for _ in 0..n {
        exec.advance(world);
    }
}

/// Store an object into a slot the way a driver would
pub fn put_obj(exec: &mut LogicExecutor, slot: usize, obj: Object) {
    exec.variables_mut().set_obj(slot, Some(obj));
}

pub fn put_num(exec: &mut LogicExecutor, slot: usize, n: f64) {
    exec.variables_mut().set_num(slot, n);
}

// ===== World =====

/// Side effects requested from the world
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    DropPayload,
    PickUpUnit(UnitRef),
    PickUpBuilding { building: BuildingRef, whole: bool },
    Transfer { item: Content, amount: i32 },
    Take { item: Content, amount: i32 },
}

#[derive(Default)]
pub struct TestWorld {
    pub ticks: f64,
    pub millis: f64,
    pub teams: Vec<Team>,
    pub units: Vec<UnitRef>,
    pub flagged: Vec<(BlockFlag, BuildingRef)>,
    pub damaged: Vec<BuildingRef>,
    pub ore: HashMap<Content, Vec2>,
    pub spawn: Option<Vec2>,
    pub blocks: HashMap<TilePos, TileBlock>,
    pub buildings: HashMap<TilePos, BuildingRef>,
    pub bounds: i32,
    pub actions: Vec<Action>,
    pub queries: Cell<usize>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            teams: vec![TEAM, ENEMY],
            bounds: 100,
            ..Self::default()
        }
    }

    pub fn add_unit(&mut self, unit: TestUnit) -> (Rc<TestUnit>, UnitRef) {
        let unit = Rc::new(unit);
        let handle = UnitRef::from(Rc::clone(&unit));
        self.units.push(handle.clone());
        (unit, handle)
    }

    /// Advance simulation time
    pub fn tick(&mut self, ticks: f64) {
        self.ticks += ticks;
        self.millis += ticks * 1000.0 / 60.0;
    }

    fn closest<'a>(
        from: Vec2,
        candidates: impl Iterator<Item = &'a BuildingRef>,
    ) -> Option<BuildingRef> {
        candidates
            .min_by(|a, b| {
                a.position()
                    .dst2(from)
                    .total_cmp(&b.position().dst2(from))
            })
            .cloned()
    }
}

impl World for TestWorld {
    fn ticks(&self) -> f64 {
        self.ticks
    }

    fn millis(&self) -> f64 {
        self.millis
    }

    fn present_teams(&self) -> Vec<Team> {
        self.teams.clone()
    }

    fn units_of_type(&self, team: Team, unit_type: Content) -> Vec<UnitRef> {
        self.units
            .iter()
            .filter(|u| u.team() == team && u.unit_type() == unit_type)
            .cloned()
            .collect()
    }

    fn units_nearby(&self, team: Team, center: Vec2, range: f32) -> Vec<UnitRef> {
        self.queries.set(self.queries.get() + 1);
        self.units
            .iter()
            .filter(|u| u.team() == team && u.within(center, range + u.hit_size()))
            .cloned()
            .collect()
    }

    fn closest_ore(&self, _from: Vec2, item: Content) -> Option<Vec2> {
        self.queries.set(self.queries.get() + 1);
        self.ore.get(&item).copied()
    }

    fn closest_building(
        &self,
        from: Vec2,
        team: Team,
        flag: BlockFlag,
        enemy: bool,
    ) -> Option<BuildingRef> {
        self.queries.set(self.queries.get() + 1);
        Self::closest(
            from,
            self.flagged
                .iter()
                .filter(|(f, b)| *f == flag && (b.team() != team) == enemy)
                .map(|(_, b)| b),
        )
    }

    fn closest_spawn(&self, _from: Vec2) -> Option<Vec2> {
        self.queries.set(self.queries.get() + 1);
        self.spawn
    }

    fn closest_damaged(&self, team: Team, from: Vec2) -> Option<BuildingRef> {
        self.queries.set(self.queries.get() + 1);
        Self::closest(from, self.damaged.iter().filter(|b| b.team() == team))
    }

    fn tile_in_bounds(&self, tile: TilePos) -> bool {
        (0..self.bounds).contains(&tile.x) && (0..self.bounds).contains(&tile.y)
    }

    fn block_at(&self, tile: TilePos) -> Option<TileBlock> {
        self.blocks.get(&tile).copied()
    }

    fn building_at(&self, tile: TilePos) -> Option<BuildingRef> {
        self.buildings.get(&tile).cloned()
    }

    fn drop_payload(&mut self, _carrier: &UnitRef) {
        self.actions.push(Action::DropPayload);
    }

    fn pick_up_unit(&mut self, _carrier: &UnitRef, target: &UnitRef) {
        self.actions.push(Action::PickUpUnit(target.clone()));
    }

    fn pick_up_building(&mut self, _carrier: &UnitRef, building: &BuildingRef, whole: bool) {
        self.actions.push(Action::PickUpBuilding {
            building: building.clone(),
            whole,
        });
    }

    fn transfer_items_to(&mut self, _unit: &UnitRef, item: Content, amount: i32, _to: &BuildingRef) {
        self.actions.push(Action::Transfer { item, amount });
    }

    fn take_items(&mut self, _from: &BuildingRef, item: Content, amount: i32, _unit: &UnitRef) {
        self.actions.push(Action::Take { item, amount });
    }
}

// ===== Units =====

#[derive(Default)]
pub struct TestPayload {
    pub carrying: Cell<bool>,
    pub accepts_units: bool,
    pub accepts_buildings: bool,
    pub accepts_payloads: bool,
}

impl PayloadHolder for TestPayload {
    fn has_payload(&self) -> bool {
        self.carrying.get()
    }

    fn can_pick_up_unit(&self, _unit: &UnitRef) -> bool {
        self.accepts_units
    }

    fn can_pick_up_building(&self, _building: &BuildingRef) -> bool {
        self.accepts_buildings
    }

    fn can_pick_up_payload_of(&self, _building: &BuildingRef) -> bool {
        self.accepts_payloads
    }
}

#[derive(Default)]
pub struct TestMiner {
    pub ore_tiles: Vec<TilePos>,
    pub mining: Cell<Option<TilePos>>,
    pub resets: Cell<usize>,
}

impl Miner for TestMiner {
    fn valid_mine(&self, tile: TilePos) -> bool {
        self.ore_tiles.contains(&tile)
    }

    fn mine_tile(&self, tile: Option<TilePos>) {
        if tile.is_none() {
            self.resets.set(self.resets.get() + 1);
        }
        self.mining.set(tile);
    }
}

#[derive(Default)]
pub struct TestBuilder {
    pub plans: RefCell<Vec<BuildPlan>>,
    pub clears: Cell<usize>,
    pub active: Cell<bool>,
}

impl Builder for TestBuilder {
    fn has_plans(&self) -> bool {
        !self.plans.borrow().is_empty()
    }

    fn clear_building(&self) {
        self.clears.set(self.clears.get() + 1);
        self.plans.borrow_mut().clear();
    }

    fn update_building(&self, active: bool) {
        self.active.set(active);
    }

    fn add_build(&self, plan: BuildPlan) {
        self.plans.borrow_mut().push(plan);
    }
}

pub struct TestUnit {
    pub team: Team,
    pub unit_type: Content,
    pub pos: Cell<Vec2>,
    pub hit_size: f32,
    pub range: f32,
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub player: bool,
    pub flying: bool,
    pub boss: bool,
    pub controller: RefCell<ControllerKind>,
    pub controller_installs: Cell<usize>,
    pub flag: Cell<f64>,
    pub stack: Cell<ItemStack>,
    pub max_accepted: i32,
    pub payload: Option<TestPayload>,
    pub miner: Option<TestMiner>,
    pub builder: Option<TestBuilder>,
    pub sensor: Option<SenseTable>,
}

impl TestUnit {
    /// AI-controlled ground unit at a world position
    pub fn new(team: Team, unit_type: Content, x: f32, y: f32) -> Self {
        Self {
            team,
            unit_type,
            pos: Cell::new(Vec2::new(x, y)),
            hit_size: 8.0,
            range: 80.0,
            health: 100.0,
            max_health: 100.0,
            shield: 0.0,
            player: false,
            flying: false,
            boss: false,
            controller: RefCell::new(ControllerKind::Ai),
            controller_installs: Cell::new(0),
            flag: Cell::new(0.0),
            stack: Cell::new(ItemStack::default()),
            max_accepted: 0,
            payload: None,
            miner: None,
            builder: None,
            sensor: None,
        }
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }

    pub fn with_controller(self, controller: ControllerKind) -> Self {
        *self.controller.borrow_mut() = controller;
        self
    }

    pub fn logic_ai(&self) -> Option<Rc<RefCell<LogicAi>>> {
        match &*self.controller.borrow() {
            ControllerKind::Logic(ai) => Some(Rc::clone(ai)),
            _ => None,
        }
    }
}

impl Unit for TestUnit {
    fn team(&self) -> Team {
        self.team
    }

    fn position(&self) -> Vec2 {
        self.pos.get()
    }

    fn unit_type(&self) -> Content {
        self.unit_type
    }

    fn hit_size(&self) -> f32 {
        self.hit_size
    }

    fn range(&self) -> f32 {
        self.range
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn max_health(&self) -> f32 {
        self.max_health
    }

    fn shield(&self) -> f32 {
        self.shield
    }

    fn is_player(&self) -> bool {
        self.player
    }

    fn is_flying(&self) -> bool {
        self.flying
    }

    fn is_boss(&self) -> bool {
        self.boss
    }

    fn controller(&self) -> ControllerKind {
        self.controller.borrow().clone()
    }

    fn set_logic_controller(&self, ai: Rc<RefCell<LogicAi>>) {
        self.controller_installs.set(self.controller_installs.get() + 1);
        *self.controller.borrow_mut() = ControllerKind::Logic(ai);
    }

    fn set_flag(&self, flag: f64) {
        self.flag.set(flag);
    }

    fn stack(&self) -> ItemStack {
        self.stack.get()
    }

    fn max_accepted(&self, _item: Content) -> i32 {
        self.max_accepted
    }

    fn payload(&self) -> Option<&dyn PayloadHolder> {
        self.payload.as_ref().map(|p| p as &dyn PayloadHolder)
    }

    fn miner(&self) -> Option<&dyn Miner> {
        self.miner.as_ref().map(|m| m as &dyn Miner)
    }

    fn builder(&self) -> Option<&dyn Builder> {
        self.builder.as_ref().map(|b| b as &dyn Builder)
    }

    fn senseable(&self) -> Option<&dyn Senseable> {
        self.sensor.as_ref().map(|s| s as &dyn Senseable)
    }
}

// ===== Buildings =====

pub struct MemoryBank {
    pub cells: RefCell<Vec<f64>>,
}

impl MemoryBank {
    pub fn new(size: usize) -> Self {
        Self {
            cells: RefCell::new(vec![0.0; size]),
        }
    }
}

impl MemoryCell for MemoryBank {
    fn capacity(&self) -> usize {
        self.cells.borrow().len()
    }

    fn read(&self, address: usize) -> f64 {
        self.cells.borrow()[address]
    }

    fn write(&self, address: usize, value: f64) {
        self.cells.borrow_mut()[address] = value;
    }
}

pub struct DisplayQueue {
    pub capacity: usize,
    pub commands: RefCell<Vec<DrawCommand>>,
}

impl DisplayQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            commands: RefCell::new(Vec::new()),
        }
    }
}

impl GraphicsDisplay for DisplayQueue {
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

#[derive(Default)]
pub struct MessageBox {
    pub text: RefCell<String>,
}

impl TextDisplay for MessageBox {
    fn set_message(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }
}

#[derive(Default)]
pub struct SenseTable {
    pub content: HashMap<Content, f64>,
    pub numbers: HashMap<Property, f64>,
    pub objects: HashMap<Property, Option<Object>>,
}

impl Senseable for SenseTable {
    fn sense(&self, content: Content) -> f64 {
        self.content.get(&content).copied().unwrap_or(0.0)
    }

    fn sense_property(&self, property: Property) -> Sensed {
        match self.objects.get(&property) {
            Some(obj) => Sensed::Object(obj.clone()),
            None => Sensed::Number(self.numbers.get(&property).copied().unwrap_or(0.0)),
        }
    }
}

#[derive(Default)]
pub struct ControlLog {
    pub calls: RefCell<Vec<(Property, Value, f64, f64, f64)>>,
}

impl Controllable for ControlLog {
    fn control(&self, property: Property, p1: Value, p2: f64, p3: f64, p4: f64) {
        self.calls.borrow_mut().push((property, p1, p2, p3, p4));
    }
}

pub struct TestBuilding {
    pub team: Team,
    pub pos: Vec2,
    pub range: f32,
    pub rotation: i32,
    pub liftable: bool,
    pub items: HashMap<Content, i32>,
    pub accepts: i32,
    pub memory: Option<MemoryBank>,
    pub display: Option<DisplayQueue>,
    pub message: Option<MessageBox>,
    pub sensor: Option<SenseTable>,
    pub controls: Option<ControlLog>,
}

impl TestBuilding {
    pub fn new(team: Team, x: f32, y: f32) -> Self {
        Self {
            team,
            pos: Vec2::new(x, y),
            range: 0.0,
            rotation: 0,
            liftable: false,
            items: HashMap::new(),
            accepts: 0,
            memory: None,
            display: None,
            message: None,
            sensor: None,
            controls: None,
        }
    }

    pub fn with_memory(size: usize) -> Self {
        Self {
            memory: Some(MemoryBank::new(size)),
            ..Self::new(TEAM, 0.0, 0.0)
        }
    }

    pub fn with_display(capacity: usize) -> Self {
        Self {
            display: Some(DisplayQueue::new(capacity)),
            ..Self::new(TEAM, 0.0, 0.0)
        }
    }

    pub fn with_message() -> Self {
        Self {
            message: Some(MessageBox::default()),
            ..Self::new(TEAM, 0.0, 0.0)
        }
    }

    /// Shares `self` and returns both the concrete handle and the VM handle
    pub fn share(self) -> (Rc<TestBuilding>, BuildingRef) {
        let building = Rc::new(self);
        let handle = BuildingRef::from(Rc::clone(&building));
        (building, handle)
    }

    pub fn message_text(&self) -> String {
        self.message
            .as_ref()
            .map(|m| m.text.borrow().clone())
            .unwrap_or_default()
    }

    pub fn cells(&self) -> Vec<f64> {
        self.memory
            .as_ref()
            .map(|m| m.cells.borrow().clone())
            .unwrap_or_default()
    }

    pub fn drawn(&self) -> usize {
        self.display
            .as_ref()
            .map_or(0, |d| d.commands.borrow().len())
    }
}

impl Building for TestBuilding {
    fn team(&self) -> Team {
        self.team
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn range(&self) -> f32 {
        self.range
    }

    fn rotation(&self) -> i32 {
        self.rotation
    }

    fn can_pick_up(&self) -> bool {
        self.liftable
    }

    fn item_count(&self, item: Content) -> i32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    fn accept_stack(&self, _item: Content, amount: i32, _source: &UnitRef) -> i32 {
        amount.min(self.accepts)
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

    fn senseable(&self) -> Option<&dyn Senseable> {
        self.sensor.as_ref().map(|s| s as &dyn Senseable)
    }

    fn controllable(&self) -> Option<&dyn Controllable> {
        self.controls.as_ref().map(|c| c as &dyn Controllable)
    }
}
