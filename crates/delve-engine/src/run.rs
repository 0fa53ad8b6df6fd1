//! The tick loop and its running totals.

use delve_core::config::TimeConfig;
use delve_core::{TickSummary, World};
use delve_units::DefenceOutcome;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::EngineError;

/// Counters accumulated over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    /// Ticks executed.
    pub ticks: u64,
    /// Strikes that reached a defender.
    pub strikes: usize,
    /// Strikes that were dodged.
    pub dodges: usize,
    /// Strikes that were blocked.
    pub blocks: usize,
    /// Units that died.
    pub deaths: usize,
    /// Jobs completed.
    pub work_completed: usize,
    /// Cubes that caved in because of work.
    pub cubes_collapsed: usize,
    /// Levels gained.
    pub level_ups: u32,
    /// Hit points lost to falling.
    pub fall_damage: u32,
}

impl RunTotals {
    /// Fold one tick into the totals.
    pub fn absorb(&mut self, summary: &TickSummary) {
        self.ticks = self.ticks.saturating_add(1);
        for strike in &summary.strikes {
            match strike.outcome {
                Some(DefenceOutcome::Dodged { .. }) => self.dodges = self.dodges.saturating_add(1),
                Some(DefenceOutcome::Blocked) => self.blocks = self.blocks.saturating_add(1),
                Some(_) => {}
                None => continue,
            }
            self.strikes = self.strikes.saturating_add(1);
        }
        self.deaths = self.deaths.saturating_add(summary.deaths.len());
        self.work_completed = self.work_completed.saturating_add(summary.work_completed);
        self.cubes_collapsed = self.cubes_collapsed.saturating_add(summary.cubes_collapsed);
        self.level_ups = self.level_ups.saturating_add(summary.level_ups);
        self.fall_damage = self.fall_damage.saturating_add(summary.fall_damage);
    }
}

/// Run `time.total_ticks` ticks of `time.tick_seconds`.
///
/// Logs a summary every `time.summary_every` ticks and stops early when the
/// last unit has died.
pub fn run_simulation(world: &mut World, time: &TimeConfig) -> Result<RunTotals, EngineError> {
    let mut totals = RunTotals::default();
    for _ in 0..time.total_ticks {
        let summary = world.advance_time(time.tick_seconds)?;
        totals.absorb(&summary);

        if summary.tick.checked_rem(time.summary_every) == Some(0) {
            info!(
                tick = summary.tick,
                elapsed = summary.elapsed,
                units_alive = summary.units_alive,
                factions = world.active_factions().len(),
                materials = world.terrain().materials().len(),
                strikes = totals.strikes,
                deaths = totals.deaths,
                work_completed = totals.work_completed,
                "tick summary"
            );
        }

        if totals.deaths > 0 && world.unit_count() == 0 {
            warn!(tick = summary.tick, "every unit has died, stopping early");
            break;
        }
    }
    Ok(totals)
}

/// Log the outcome of a finished run.
pub fn log_simulation_end(world: &World, totals: &RunTotals) {
    info!(
        ticks = totals.ticks,
        elapsed = world.clock().elapsed(),
        units_alive = world.unit_count(),
        factions = world.active_factions().len(),
        strikes = totals.strikes,
        dodges = totals.dodges,
        blocks = totals.blocks,
        deaths = totals.deaths,
        work_completed = totals.work_completed,
        cubes_collapsed = totals.cubes_collapsed,
        level_ups = totals.level_ups,
        fall_damage = totals.fall_damage,
        "simulation ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use delve_core::StrikeReport;
    use delve_types::{CubeCoord, UnitId};

    use super::*;

    fn floor_world() -> World {
        let codes = vec![vec![vec![1, 0, 0]; 5]; 5];
        World::from_codes(&codes, 11).unwrap()
    }

    #[test]
    fn absorb_counts_only_resolved_strikes() {
        let a = UnitId::new();
        let b = UnitId::new();
        let report = |outcome| StrikeReport {
            attacker: a,
            target: b,
            outcome,
        };
        let summary = TickSummary {
            strikes: vec![
                report(None),
                report(Some(DefenceOutcome::Blocked)),
                report(Some(DefenceOutcome::Dodged {
                    from: CubeCoord::new(1, 1, 1),
                    to: CubeCoord::new(2, 1, 1),
                })),
                report(Some(DefenceOutcome::Hit { damage: 7 })),
            ],
            deaths: vec![b],
            level_ups: 2,
            ..TickSummary::default()
        };
        let mut totals = RunTotals::default();
        totals.absorb(&summary);
        assert_eq!(totals.ticks, 1);
        assert_eq!(totals.strikes, 3);
        assert_eq!(totals.dodges, 1);
        assert_eq!(totals.blocks, 1);
        assert_eq!(totals.deaths, 1);
        assert_eq!(totals.level_ups, 2);
    }

    #[test]
    fn totals_saturate_at_their_maximum() {
        let summary = TickSummary {
            strikes: vec![StrikeReport {
                attacker: UnitId::new(),
                target: UnitId::new(),
                outcome: Some(DefenceOutcome::Blocked),
            }],
            work_completed: 4,
            level_ups: 1,
            fall_damage: 10,
            ..TickSummary::default()
        };
        let mut totals = RunTotals {
            ticks: u64::MAX,
            strikes: usize::MAX,
            blocks: usize::MAX,
            work_completed: usize::MAX - 1,
            level_ups: u32::MAX,
            fall_damage: u32::MAX - 3,
            ..RunTotals::default()
        };
        totals.absorb(&summary);
        assert_eq!(totals.ticks, u64::MAX);
        assert_eq!(totals.strikes, usize::MAX);
        assert_eq!(totals.blocks, usize::MAX);
        assert_eq!(totals.work_completed, usize::MAX);
        assert_eq!(totals.level_ups, u32::MAX);
        assert_eq!(totals.fall_damage, u32::MAX);
    }

    #[test]
    fn runs_the_configured_number_of_ticks() {
        let mut world = floor_world();
        world.spawn_unit(false).unwrap();
        world.spawn_unit(false).unwrap();
        let time = TimeConfig {
            tick_seconds: 0.1,
            total_ticks: 50,
            summary_every: 10,
        };
        let totals = run_simulation(&mut world, &time).unwrap();
        assert_eq!(totals.ticks, 50);
        assert_eq!(world.clock().tick(), 50);
        assert!((world.clock().elapsed() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_world_still_ticks() {
        let mut world = floor_world();
        let time = TimeConfig {
            tick_seconds: 0.05,
            total_ticks: 3,
            summary_every: 0,
        };
        let totals = run_simulation(&mut world, &time).unwrap();
        assert_eq!(totals, RunTotals {
            ticks: 3,
            ..RunTotals::default()
        });
    }

    #[test]
    fn rejects_an_oversized_tick() {
        let mut world = floor_world();
        let time = TimeConfig {
            tick_seconds: 0.5,
            total_ticks: 1,
            summary_every: 0,
        };
        assert!(run_simulation(&mut world, &time).is_err());
    }
}
