//! Headless driver that lets two opponents play a round against each other.

use std::collections::VecDeque;

use grid_tactics_core::{Command, Event, Team};
use grid_tactics_system_ai::Opponent;
use grid_tactics_world::{self as world, query, World};
use tracing::{debug, info, warn};

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Blue reached the escape cell or eliminated red.
    Won,
    /// Blue was eliminated.
    Lost,
    /// The step limit ran out or both teams stopped issuing commands.
    Stalemate,
}

/// Summary of a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Report {
    pub(crate) outcome: Outcome,
    pub(crate) steps: usize,
    pub(crate) turns: usize,
    pub(crate) attacks: usize,
}

/// World plus the opponents playing it and the commands still to apply.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    opponents: [Opponent; 2],
    queue: VecDeque<Command>,
}

impl Session {
    /// Prepares a session from the commands that set up the battlefield.
    ///
    /// Blue heads for the escape cell once it is configured.
    pub(crate) fn new(mut world: World, setup: Vec<Command>) -> Self {
        let mut events = Vec::new();
        let mut queue: VecDeque<Command> = setup.into();
        // Setup runs eagerly so blue knows the escape cell before the round starts.
        while let Some(command) = queue.pop_front() {
            if command == Command::StartRound {
                queue.push_front(command);
                break;
            }
            world::apply(&mut world, command, &mut events);
        }
        for event in &events {
            if let Event::SpawnRejected { team, cell, reason } = event {
                warn!(?team, ?cell, %reason, "spawn rejected");
            }
        }

        let escape = query::escape_cell(&world);
        Self {
            world,
            opponents: [
                Opponent::new(Team::Blue).seeking(escape),
                Opponent::new(Team::Red),
            ],
            queue,
        }
    }

    /// World being played.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Applies queued commands until the round ends or `max_steps` commands
    /// have been applied.
    pub(crate) fn run(&mut self, max_steps: usize) -> Report {
        let mut report = Report {
            outcome: Outcome::Stalemate,
            steps: 0,
            turns: 0,
            attacks: 0,
        };

        while let Some(command) = self.queue.pop_front() {
            if report.steps == max_steps {
                warn!(max_steps, "step limit reached");
                return report;
            }
            report.steps += 1;

            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            for event in &events {
                debug!(?event, "event");
                match event {
                    Event::MoveStarted { unit, .. } => {
                        self.queue.push_back(Command::CompleteAction { unit: *unit });
                    }
                    Event::AttackStarted { attacker, .. } => {
                        self.queue.push_back(Command::CompleteAction { unit: *attacker });
                    }
                    Event::ActiveUnitChanged { .. } => report.turns += 1,
                    Event::AttackResolved { .. } => report.attacks += 1,
                    Event::UnitDied { unit, team } => {
                        info!(unit = unit.get(), ?team, "unit died");
                    }
                    Event::RoundEnded { round, won } => {
                        info!(round, won, "round ended");
                        report.outcome = if *won { Outcome::Won } else { Outcome::Lost };
                    }
                    _ => {}
                }
            }
            if report.outcome != Outcome::Stalemate {
                return report;
            }

            let turn = query::turn(&self.world);
            let units = query::unit_view(&self.world);
            for opponent in &mut self.opponents {
                let mut commands = Vec::new();
                opponent.handle(
                    &events,
                    &turn,
                    &units,
                    query::grid(&self.world),
                    query::reachability(&self.world),
                    &mut commands,
                );
                self.queue.extend(commands);
            }
        }

        warn!(steps = report.steps, "no commands left before the round ended");
        report
    }
}
