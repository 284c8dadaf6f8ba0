use std::collections::VecDeque;

use glam::Vec2;
use grid_tactics_core::{CellCoord, Command, Event, Team, UnitId, UnitStats};
use grid_tactics_system_ai::{decide, nearest_opponent, Decision, Opponent};
use grid_tactics_world::{self as world, query, World};

fn setup(columns: u32, rows: u32, units: &[(Team, u32, u32, UnitStats)]) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            columns,
            rows,
            cell_size: 1.0,
            origin: Vec2::ZERO,
        },
        &mut events,
    );
    for &(team, column, row, stats) in units {
        world::apply(
            &mut world,
            Command::SpawnUnit {
                team,
                cell: CellCoord::new(column, row),
                stats,
            },
            &mut events,
        );
    }
    world
}

fn start(world: &mut World) {
    let mut events = Vec::new();
    world::apply(world, Command::StartRound, &mut events);
}

fn soldier(team: Team, column: u32, row: u32) -> (Team, u32, u32, UnitStats) {
    (team, column, row, UnitStats::default())
}

fn fragile(team: Team, column: u32, row: u32) -> (Team, u32, u32, UnitStats) {
    (
        team,
        column,
        row,
        UnitStats {
            max_health: 10,
            ..UnitStats::default()
        },
    )
}

fn decide_for_active(world: &World) -> Decision {
    let units = query::unit_view(world);
    let active = query::active_unit(world).expect("active unit");
    let actor = units.get(active).expect("actor snapshot");
    decide(actor, &units, query::grid(world), query::reachability(world))
}

fn drive(
    world: &mut World,
    opponents: &mut [Opponent],
    initial: Vec<Command>,
    limit: usize,
) -> Vec<Event> {
    let mut queue: VecDeque<Command> = initial.into();
    let mut log = Vec::new();
    let mut steps = 0;

    while let Some(command) = queue.pop_front() {
        steps += 1;
        if steps > limit {
            break;
        }

        let mut events = Vec::new();
        world::apply(world, command, &mut events);
        for event in &events {
            match event {
                Event::MoveStarted { unit, .. } => {
                    queue.push_back(Command::CompleteAction { unit: *unit });
                }
                Event::AttackStarted { attacker, .. } => {
                    queue.push_back(Command::CompleteAction { unit: *attacker });
                }
                _ => {}
            }
        }

        let turn = query::turn(world);
        let units = query::unit_view(world);
        for opponent in opponents.iter_mut() {
            let mut commands = Vec::new();
            opponent.handle(
                &events,
                &turn,
                &units,
                query::grid(world),
                query::reachability(world),
                &mut commands,
            );
            queue.extend(commands);
        }
        log.extend(events);
    }

    log
}

#[test]
fn nearest_opponent_prefers_lowest_identifier_on_ties() {
    let world = setup(
        7,
        7,
        &[
            soldier(Team::Blue, 3, 3),
            soldier(Team::Red, 5, 3),
            soldier(Team::Red, 1, 3),
            soldier(Team::Red, 3, 6),
        ],
    );
    let units = query::unit_view(&world);
    let actor = units.get(UnitId::new(0)).expect("blue unit");

    let nearest = nearest_opponent(actor, &units, query::grid(&world)).map(|unit| unit.id);

    assert_eq!(nearest, Some(UnitId::new(1)));
}

#[test]
fn attacks_when_the_target_is_in_reach() {
    let mut world = setup(5, 1, &[soldier(Team::Blue, 0, 0), soldier(Team::Red, 2, 0)]);
    start(&mut world);

    assert_eq!(
        decide_for_active(&world),
        Decision::Attack {
            target: UnitId::new(1)
        }
    );
}

#[test]
fn walks_to_the_reachable_cell_closest_to_the_target() {
    let mut world = setup(8, 1, &[soldier(Team::Blue, 0, 0), soldier(Team::Red, 7, 0)]);
    start(&mut world);

    assert_eq!(
        decide_for_active(&world),
        Decision::Move {
            destination: CellCoord::new(3, 0)
        }
    );
}

#[test]
fn equally_close_destinations_keep_sweep_order() {
    let short_legs = UnitStats {
        movement_range: 1,
        ..UnitStats::default()
    };
    let mut world = setup(
        5,
        5,
        &[
            (Team::Blue, 1, 1, short_legs),
            soldier(Team::Red, 3, 3),
        ],
    );
    start(&mut world);

    assert_eq!(
        decide_for_active(&world),
        Decision::Move {
            destination: CellCoord::new(1, 2)
        }
    );
}

#[test]
fn ends_the_turn_without_options() {
    let mut lonely = setup(4, 4, &[soldier(Team::Blue, 0, 0)]);
    start(&mut lonely);
    assert_eq!(decide_for_active(&lonely), Decision::EndTurn);

    let mut boxed = setup(3, 3, &[soldier(Team::Blue, 0, 0), soldier(Team::Red, 2, 2)]);
    let mut events = Vec::new();
    for cell in [CellCoord::new(1, 0), CellCoord::new(0, 1)] {
        world::apply(
            &mut boxed,
            Command::SetWalkable {
                cell,
                walkable: false,
            },
            &mut events,
        );
    }
    start(&mut boxed);
    assert_eq!(decide_for_active(&boxed), Decision::EndTurn);
}

#[test]
fn moves_then_attacks_in_the_same_turn() {
    let mut world = setup(6, 1, &[soldier(Team::Blue, 0, 0), fragile(Team::Red, 5, 0)]);
    let mut opponents = [Opponent::new(Team::Blue), Opponent::new(Team::Red)];

    let log = drive(&mut world, &mut opponents, vec![Command::StartRound], 50);

    assert!(log.contains(&Event::MoveCompleted {
        unit: UnitId::new(0),
        from: CellCoord::new(0, 0),
        to: CellCoord::new(3, 0),
    }));
    assert_eq!(log.last(), Some(&Event::RoundEnded { round: 1, won: true }));
    assert_eq!(query::outcome(&world), Some(true));
}

#[test]
fn forces_the_turn_over_after_an_opening_attack() {
    let mut world = setup(4, 1, &[soldier(Team::Blue, 0, 0), soldier(Team::Red, 1, 0)]);
    start(&mut world);
    let mut events = Vec::new();
    world::apply(&mut world, Command::ForceTurnOver, &mut events);

    let mut red = Opponent::new(Team::Red);
    let mut commands = Vec::new();
    red.handle(
        &events,
        &query::turn(&world),
        &query::unit_view(&world),
        query::grid(&world),
        query::reachability(&world),
        &mut commands,
    );
    assert_eq!(
        commands,
        vec![Command::RequestAttack {
            unit: UnitId::new(1),
            target: UnitId::new(0),
        }]
    );

    let log = drive(&mut world, &mut [red], commands, 10);
    let tail: Vec<_> = log
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::AttackResolved { .. } | Event::ActiveUnitChanged { .. }
            )
        })
        .cloned()
        .collect();
    assert_eq!(
        tail,
        vec![
            Event::AttackResolved {
                attacker: UnitId::new(1),
                target: UnitId::new(0),
                damage: 10,
                remaining_health: 90,
            },
            Event::ActiveUnitChanged {
                unit: UnitId::new(0),
                team: Team::Blue,
            },
        ]
    );
}

#[test]
fn ignores_turns_of_the_other_team() {
    let mut world = setup(4, 1, &[soldier(Team::Blue, 0, 0), soldier(Team::Red, 3, 0)]);
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartRound, &mut events);

    let mut red = Opponent::new(Team::Red);
    let mut commands = Vec::new();
    red.handle(
        &events,
        &query::turn(&world),
        &query::unit_view(&world),
        query::grid(&world),
        query::reachability(&world),
        &mut commands,
    );

    assert!(commands.is_empty());
}

#[test]
fn seeking_opponent_heads_for_the_escape_cell() {
    let mut world = setup(8, 3, &[soldier(Team::Blue, 0, 1), soldier(Team::Red, 7, 1)]);
    let escape = CellCoord::new(2, 0);
    let mut events = Vec::new();
    world::apply(&mut world, Command::SetEscapeCell { cell: escape }, &mut events);
    let mut opponents = [
        Opponent::new(Team::Blue).seeking(Some(escape)),
        Opponent::new(Team::Red),
    ];

    let log = drive(&mut world, &mut opponents, vec![Command::StartRound], 50);

    assert!(log.contains(&Event::MoveCompleted {
        unit: UnitId::new(0),
        from: CellCoord::new(0, 1),
        to: escape,
    }));
    assert_eq!(query::outcome(&world), Some(true));
}

#[test]
fn skirmish_replays_deterministically() {
    fn run() -> (Vec<Event>, Option<bool>) {
        let mut world = setup(
            9,
            7,
            &[
                soldier(Team::Blue, 0, 0),
                soldier(Team::Blue, 0, 6),
                soldier(Team::Red, 8, 3),
                soldier(Team::Red, 6, 1),
                soldier(Team::Red, 6, 5),
            ],
        );
        let mut events = Vec::new();
        for row in 2..5 {
            world::apply(
                &mut world,
                Command::SetWalkable {
                    cell: CellCoord::new(4, row),
                    walkable: false,
                },
                &mut events,
            );
        }
        let mut opponents = [Opponent::new(Team::Blue), Opponent::new(Team::Red)];
        let log = drive(&mut world, &mut opponents, vec![Command::StartRound], 2_000);
        (log, query::outcome(&world))
    }

    let (first_log, first_outcome) = run();
    let (second_log, second_outcome) = run();

    assert_eq!(first_log, second_log);
    assert_eq!(first_outcome, second_outcome);
    assert!(first_log
        .iter()
        .any(|event| matches!(event, Event::AttackResolved { .. })));
}
