//! Unit binding, locating and control
//!
//! All three instructions act on the unit in `@unit`. Locate and control
//! first pass it through [`LogicExecutor::check_logic_ai`], which installs a
//! logic controller on the first qualifying use. Controller borrows are kept
//! short so hosts may inspect the controller from inside world callbacks.

use crate::capability::{
    logic_to_world, world_to_logic, world_to_tile, ControllerKind, TilePos, UnitRef, Vec2, World,
};
use crate::instruction::{Instruction, LocateKind, UnitCommand};
use crate::logic_ai::{
    AimMode, ControlMode, InstructionKey, LogicAi, BUILDING_RANGE, ITEM_TRANSFER_RANGE,
    LOGIC_CONTROL_TIMEOUT, TRANSFER_DELAY,
};
use crate::value::{Content, Object};
use crate::variables::{VAR_THIS, VAR_UNIT};
use crate::vm::LogicExecutor;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Operand slots of a `UnitControl`
#[derive(Clone, Copy)]
struct Operands {
    p1: usize,
    p2: usize,
    p3: usize,
    p4: usize,
}

impl LogicExecutor {
    /// Execute `UnitBind`, `UnitLocate` and `UnitControl`
    pub(crate) fn execute_units(
        &mut self,
        key: InstructionKey,
        instruction: &mut Instruction,
        world: &mut dyn World,
    ) {
        match instruction {
            Instruction::UnitBind { unit_type, cursor } => {
                self.bind_unit(*unit_type, cursor, world);
            }

            Instruction::UnitLocate {
                kind,
                flag,
                enemy,
                ore,
                out_x,
                out_y,
                out_found,
            } => {
                let Some((unit, ai)) = self.controlled_unit() else {
                    return;
                };
                ai.borrow_mut().control_timer = LOGIC_CONTROL_TIMEOUT;

                let refresh = ai.borrow_mut().check_target_timer(key);
                if refresh {
                    let from = unit.position();
                    let found = match kind {
                        LocateKind::Ore => self
                            .vars
                            .obj(*ore)
                            .and_then(Object::as_content)
                            .filter(Content::is_item)
                            .and_then(|item| world.closest_ore(from, item)),
                        LocateKind::Building => world
                            .closest_building(from, unit.team(), *flag, self.vars.bool(*enemy))
                            .map(|building| building.position()),
                        LocateKind::Spawn => world.closest_spawn(from),
                        LocateKind::Damaged => world
                            .closest_damaged(unit.team(), from)
                            .map(|building| building.position()),
                    };

                    let mut ai = ai.borrow_mut();
                    let cache = ai.locate_cache(key);
                    match found {
                        Some(pos) => {
                            cache.found = true;
                            cache.x = world_to_logic(pos.x);
                            cache.y = world_to_logic(pos.y);
                            self.vars.set_num(*out_x, cache.x);
                            self.vars.set_num(*out_y, cache.y);
                            self.vars.set_num(*out_found, 1.0);
                        }
                        None => {
                            cache.found = false;
                            self.vars.set_num(*out_found, 0.0);
                        }
                    }
                } else {
                    let cache = *ai.borrow_mut().locate_cache(key);
                    self.vars.set_bool(*out_found, cache.found);
                    self.vars.set_num(*out_x, cache.x);
                    self.vars.set_num(*out_y, cache.y);
                }
            }

            Instruction::UnitControl {
                command,
                p1,
                p2,
                p3,
                p4,
            } => {
                let operands = Operands {
                    p1: *p1,
                    p2: *p2,
                    p3: *p3,
                    p4: *p4,
                };
                self.control_unit(*command, operands, world);
            }

            _ => unreachable!("Non-unit instruction in unit handler"),
        }
    }

    /// Bind the next unit of the requested type, round-robin
    fn bind_unit(&mut self, type_slot: usize, cursor: &mut usize, world: &dyn World) {
        let unit_type = self
            .vars
            .obj(type_slot)
            .and_then(Object::as_content)
            .filter(Content::is_unit_type);

        let Some(unit_type) = unit_type else {
            self.vars.force_obj(VAR_UNIT, None);
            return;
        };

        let units = world.units_of_type(self.team, unit_type);
        if units.is_empty() {
            self.vars.force_obj(VAR_UNIT, None);
            return;
        }

        *cursor %= units.len();
        let unit = units.get(*cursor).cloned();
        self.vars.force_obj(VAR_UNIT, unit.map(Object::Unit));
        *cursor += 1;
    }

    /// Controller of `unit` if this program may drive it, installing a fresh
    /// logic controller on first use.
    ///
    /// A unit qualifies when it is the currently bound unit, belongs to this
    /// team, is not player-piloted and is not held by a formation.
    pub(crate) fn check_logic_ai(&self, unit: &UnitRef) -> Option<Rc<RefCell<LogicAi>>> {
        if self.vars.unit(VAR_UNIT) != Some(unit) || unit.team() != self.team || unit.is_player()
        {
            return None;
        }

        match unit.controller() {
            ControllerKind::Logic(ai) => Some(ai),
            ControllerKind::Player | ControllerKind::Formation => None,
            ControllerKind::Ai => {
                let owner = self.vars.building(VAR_THIS).cloned();
                let ai = Rc::new(RefCell::new(LogicAi::new(owner)));
                unit.set_logic_controller(Rc::clone(&ai));

                if let Some(miner) = unit.miner() {
                    miner.mine_tile(None);
                }
                if let Some(builder) = unit.builder() {
                    builder.clear_building();
                }

                debug!(unit = ?unit, "logic controller installed");
                Some(ai)
            }
        }
    }

    /// The bound unit and its controller, if eligible
    fn controlled_unit(&self) -> Option<(UnitRef, Rc<RefCell<LogicAi>>)> {
        let unit = self.vars.unit(VAR_UNIT)?.clone();
        let ai = self.check_logic_ai(&unit)?;
        Some((unit, ai))
    }

    fn control_unit(&mut self, command: UnitCommand, ops: Operands, world: &mut dyn World) {
        let Some((unit, ai)) = self.controlled_unit() else {
            trace!(?command, "unit control without an eligible unit");
            return;
        };
        ai.borrow_mut().control_timer = LOGIC_CONTROL_TIMEOUT;

        let x1 = logic_to_world(self.vars.numf(ops.p1));
        let y1 = logic_to_world(self.vars.numf(ops.p2));
        let d1 = logic_to_world(self.vars.numf(ops.p3));
        let point = Vec2::new(x1, y1);

        match command {
            UnitCommand::Idle => {
                ai.borrow_mut().control = ControlMode::Idle;
            }

            UnitCommand::Move | UnitCommand::Stop | UnitCommand::Approach => {
                {
                    let mut ai = ai.borrow_mut();
                    ai.control = match command {
                        UnitCommand::Stop => ControlMode::Stop,
                        UnitCommand::Approach => ControlMode::Approach,
                        _ => ControlMode::Move,
                    };
                    ai.move_x = x1;
                    ai.move_y = y1;
                    if command == UnitCommand::Approach {
                        ai.move_radius = d1;
                    }
                }

                if command == UnitCommand::Stop {
                    if let Some(miner) = unit.miner() {
                        miner.mine_tile(None);
                    }
                    if let Some(builder) = unit.builder() {
                        builder.clear_building();
                    }
                }
            }

            UnitCommand::Within => {
                self.vars.set_bool(ops.p4, unit.within(point, d1));
            }

            UnitCommand::Pathfind => {
                ai.borrow_mut().control = ControlMode::Pathfind;
            }

            UnitCommand::Target => {
                let mut ai = ai.borrow_mut();
                ai.aim_point = point;
                ai.aim = AimMode::Point;
                ai.main_target = None;
                ai.shoot = self.vars.bool(ops.p3);
            }

            UnitCommand::Targetp => {
                let target = self
                    .vars
                    .obj(ops.p1)
                    .filter(|obj| matches!(obj, Object::Unit(_) | Object::Building(_)))
                    .cloned();
                let mut ai = ai.borrow_mut();
                ai.aim = AimMode::Target;
                ai.main_target = target;
                ai.shoot = self.vars.bool(ops.p2);
            }

            UnitCommand::Boost => {
                ai.borrow_mut().boost = self.vars.bool(ops.p1);
            }

            UnitCommand::Flag => {
                unit.set_flag(self.vars.num(ops.p1));
            }

            UnitCommand::Mine => {
                let tile = TilePos::from_world(point);
                if let Some(miner) = unit.miner() {
                    let valid = world.tile_in_bounds(tile) && miner.valid_mine(tile);
                    miner.mine_tile(valid.then_some(tile));
                }
            }

            UnitCommand::PayDrop => {
                if ai.borrow().pay_timer > 0.0 {
                    return;
                }

                if unit.payload().map_or(false, |pay| pay.has_payload()) {
                    world.drop_payload(&unit);
                    ai.borrow_mut().pay_timer = TRANSFER_DELAY;
                }
            }

            UnitCommand::PayTake => {
                if ai.borrow().pay_timer > 0.0 {
                    return;
                }
                if unit.payload().is_none() {
                    return;
                }

                if self.vars.bool(ops.p1) {
                    self.take_unit_payload(&unit, world);
                } else {
                    self.take_building_payload(&unit, world);
                }
                ai.borrow_mut().pay_timer = TRANSFER_DELAY;
            }

            UnitCommand::Build => {
                let Some(builder) = unit.builder() else {
                    return;
                };
                let block = self
                    .vars
                    .obj(ops.p3)
                    .and_then(Object::as_content)
                    .filter(Content::is_block);
                let Some(block) = block else {
                    return;
                };

                let x = world_to_tile(x1);
                let y = world_to_tile(y1);
                let rotation = self.vars.numi(ops.p4);

                let plan = {
                    let mut ai = ai.borrow_mut();
                    let changed =
                        ai.plan.x != x || ai.plan.y != y || ai.plan.block != Some(block);
                    if changed {
                        // Starting a different plan shares the transfer cooldown
                        if ai.build_timer > 0.0 {
                            trace!("build start rate limited");
                            return;
                        }
                        ai.build_timer = TRANSFER_DELAY;
                    }
                    if changed || !builder.has_plans() {
                        ai.plan.reset_progress();
                    }
                    ai.plan.set(x, y, rotation, block);
                    ai.plan.clone()
                };

                if world.tile_in_bounds(TilePos::new(x, y)) {
                    builder.clear_building();
                    builder.update_building(true);
                    builder.add_build(plan);
                }
            }

            UnitCommand::GetBlock => {
                let range = unit.range().max(BUILDING_RANGE);
                let block = if unit.within(point, range) {
                    world.block_at(TilePos::from_world(point))
                } else {
                    None
                };

                match block {
                    Some(tile) => {
                        self.vars.set_obj(ops.p3, Some(Object::Content(tile.block)));
                        self.vars.set_num(ops.p4, tile.rotation as f64);
                    }
                    None => {
                        self.vars.set_obj(ops.p3, None);
                        self.vars.set_num(ops.p4, 0.0);
                    }
                }
            }

            UnitCommand::ItemDrop => {
                if ai.borrow().item_timer > 0.0 {
                    return;
                }

                let Some(building) = self.vars.building(ops.p1).cloned() else {
                    return;
                };
                let stack = unit.stack();
                let Some(item) = stack.item else {
                    return;
                };
                let dropped = stack.amount.min(self.vars.numi(ops.p2));

                if dropped > 0 && unit.within(building.position(), ITEM_TRANSFER_RANGE) {
                    let accepted = building.accept_stack(item, dropped, &unit);
                    if accepted > 0 {
                        world.transfer_items_to(&unit, item, accepted, &building);
                        ai.borrow_mut().item_timer = TRANSFER_DELAY;
                    }
                }
            }

            UnitCommand::ItemTake => {
                if ai.borrow().item_timer > 0.0 {
                    return;
                }

                let Some(building) = self.vars.building(ops.p1).cloned() else {
                    return;
                };
                let item = self
                    .vars
                    .obj(ops.p2)
                    .and_then(Object::as_content)
                    .filter(Content::is_item);
                let Some(item) = item else {
                    return;
                };
                let amount = self.vars.numi(ops.p3);

                if unit.within(building.position(), ITEM_TRANSFER_RANGE) {
                    let taken = building
                        .item_count(item)
                        .min(amount.min(unit.max_accepted(item)));
                    if taken > 0 {
                        world.take_items(&building, item, taken, &unit);
                        ai.borrow_mut().item_timer = TRANSFER_DELAY;
                    }
                }
            }
        }
    }

    /// Pick up the closest grounded AI unit touching the carrier
    fn take_unit_payload(&self, carrier: &UnitRef, world: &mut dyn World) {
        let Some(pay) = carrier.payload() else {
            return;
        };

        let pos = carrier.position();
        let hit_size = carrier.hit_size();
        let reach = hit_size * 2.0;

        let target = world
            .units_nearby(carrier.team(), pos, reach)
            .into_iter()
            .filter(|u| {
                u != carrier
                    && u.within(pos, reach)
                    && u.is_ai()
                    && u.is_grounded()
                    && pay.can_pick_up_unit(u)
                    && u.within(pos, u.hit_size() + hit_size * 1.2)
            })
            .min_by(|a, b| a.position().dst2(pos).total_cmp(&b.position().dst2(pos)));

        if let Some(target) = target {
            world.pick_up_unit(carrier, &target);
        }
    }

    /// Pick up the friendly building under the carrier, or the payload it holds
    fn take_building_payload(&self, carrier: &UnitRef, world: &mut dyn World) {
        let Some(pay) = carrier.payload() else {
            return;
        };

        let tile = TilePos::from_world(carrier.position());
        let Some(building) = world
            .building_at(tile)
            .filter(|b| b.team() == carrier.team())
        else {
            return;
        };

        if building.can_pick_up() && pay.can_pick_up_building(&building) {
            world.pick_up_building(carrier, &building, true);
        } else if pay.can_pick_up_payload_of(&building) {
            world.pick_up_building(carrier, &building, false);
        }
    }
}
