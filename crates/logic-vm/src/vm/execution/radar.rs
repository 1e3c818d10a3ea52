//! Radar instruction execution
//!
//! A radar scan walks every candidate unit near the base, so results are
//! cached on the instruction and only recomputed when the base's refresh
//! gate opens: a fixed interval for buildings, the controller's target
//! timer for units. Between refreshes the cached unit is returned as-is.

use crate::capability::{UnitRef, Vec2, World};
use crate::instruction::{Instruction, RadarCache, RadarSort, RadarTarget};
use crate::logic_ai::InstructionKey;
use crate::value::{Object, Team};
use crate::vm::LogicExecutor;
use tracing::trace;

/// Base of a scan, resolved from the radar's base slot
struct ScanOrigin {
    position: Vec2,
    range: f32,
    team: Team,
}

impl LogicExecutor {
    /// Execute `Radar`
    pub(crate) fn execute_radar(
        &mut self,
        key: InstructionKey,
        instruction: &mut Instruction,
        world: &mut dyn World,
    ) {
        let Instruction::Radar {
            filters,
            sort,
            base,
            order,
            output,
            cache,
        } = instruction
        else {
            unreachable!("Non-radar instruction in radar handler")
        };

        let direction = if self.vars.bool(*order) { 1.0 } else { -1.0 };

        let Some((origin, refresh)) = self.radar_origin(*base, key, world, cache) else {
            trace!(slot = *base, "radar base ineligible");
            self.vars.set_obj(*output, None);
            return;
        };

        if refresh {
            let enemies = filters.contains(&RadarTarget::Enemy);
            let teams = if enemies {
                world
                    .present_teams()
                    .into_iter()
                    .filter(|team| *team != origin.team)
                    .collect()
            } else {
                vec![origin.team]
            };

            // Best candidate so far; locals only, the scan is not reentrant.
            let mut best: Option<(UnitRef, f32)> = None;
            for team in teams {
                for unit in world.units_nearby(team, origin.position, origin.range) {
                    if !unit.within(origin.position, origin.range) {
                        continue;
                    }
                    if !filters.iter().all(|f| f.accepts(origin.team, &unit)) {
                        continue;
                    }

                    let score = sort.score(origin.position, &unit) * direction;
                    if best.as_ref().map_or(true, |(_, value)| score > *value) {
                        best = Some((unit, score));
                    }
                }
            }

            cache.last_target = best.map(|(unit, _)| unit);
        }

        let target = cache.last_target.clone().map(Object::Unit);
        self.vars.set_obj(*output, target);
    }

    /// Resolve the scan origin and whether this dispatch may rescan.
    /// `None` when the base is not a friendly building or an eligible unit.
    fn radar_origin(
        &self,
        base: usize,
        key: InstructionKey,
        world: &dyn World,
        cache: &mut RadarCache,
    ) -> Option<(ScanOrigin, bool)> {
        match self.vars.obj(base)? {
            Object::Building(building) if building.team() == self.team => {
                let origin = ScanOrigin {
                    position: building.position(),
                    range: building.range(),
                    team: building.team(),
                };
                let refresh = cache
                    .timer
                    .get(world.ticks(), self.config.radar_refresh_ticks);
                Some((origin, refresh))
            }
            Object::Unit(unit) if unit.team() == self.team => {
                let ai = self.check_logic_ai(unit)?;
                let origin = ScanOrigin {
                    position: unit.position(),
                    range: unit.range(),
                    team: unit.team(),
                };
                let refresh = ai.borrow_mut().check_target_timer(key);
                Some((origin, refresh))
            }
            _ => None,
        }
    }
}

impl RadarTarget {
    /// Whether `unit` passes this filter, seen from a base on `team`
    pub(crate) fn accepts(&self, team: Team, unit: &UnitRef) -> bool {
        match self {
            RadarTarget::Any => true,
            RadarTarget::Enemy => unit.team() != team,
            RadarTarget::Ally => unit.team() == team,
            RadarTarget::Player => unit.is_player(),
            RadarTarget::Attacker => unit.can_shoot(),
            RadarTarget::Flying => unit.is_flying(),
            RadarTarget::Boss => unit.is_boss(),
            RadarTarget::Ground => unit.is_grounded(),
        }
    }
}

impl RadarSort {
    /// Ranking value; the radar keeps the highest score times its direction
    pub(crate) fn score(&self, from: Vec2, unit: &UnitRef) -> f32 {
        match self {
            RadarSort::Distance => -from.dst2(unit.position()),
            RadarSort::Health => unit.health(),
            RadarSort::Shield => unit.shield(),
            RadarSort::Armor => unit.armor(),
            RadarSort::MaxHealth => unit.max_health(),
        }
    }
}
