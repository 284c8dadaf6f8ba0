use glam::Vec2;
use grid_tactics_core::{CellCoord, CombatConfig, Command, Team, UnitStats};
use grid_tactics_world::{apply, cell::Cell, grid::GridMap, pathfinding::Pathfinder, query, World};
use proptest::prelude::*;

const COLUMNS: u32 = 12;
const ROWS: u32 = 9;

fn open_grid() -> GridMap<Cell> {
    GridMap::new(COLUMNS, ROWS, 1.0, Vec2::ZERO, |_| Cell::floor())
}

fn cell_strategy() -> impl Strategy<Value = CellCoord> {
    (0..COLUMNS, 0..ROWS).prop_map(|(column, row)| CellCoord::new(column, row))
}

proptest! {
    #[test]
    fn cardinal_paths_take_manhattan_steps(start in cell_strategy(), goal in cell_strategy()) {
        let grid = open_grid();
        let path = Pathfinder::new(false).find_path(&grid, start, goal);

        prop_assert!(path.is_some());
        let path = path.unwrap();
        prop_assert_eq!(path.step_count() as u32, start.manhattan_distance(goal));
        prop_assert_eq!(path.cells().next(), Some(start));
        prop_assert_eq!(path.cells().last(), Some(goal));
    }

    #[test]
    fn diagonal_paths_take_chebyshev_steps(start in cell_strategy(), goal in cell_strategy()) {
        let grid = open_grid();
        let path = Pathfinder::new(true).find_path(&grid, start, goal);

        prop_assert!(path.is_some());
        let path = path.unwrap();
        prop_assert_eq!(path.step_count() as u32, start.chebyshev_distance(goal));
    }

    #[test]
    fn consecutive_path_cells_are_adjacent(
        start in cell_strategy(),
        goal in cell_strategy(),
        diagonal in any::<bool>(),
    ) {
        let grid = open_grid();
        let path = Pathfinder::new(diagonal).find_path(&grid, start, goal).unwrap();
        let cells: Vec<_> = path.cells().collect();

        for pair in cells.windows(2) {
            let step = pair[0].chebyshev_distance(pair[1]);
            prop_assert_eq!(step, 1);
            if !diagonal {
                prop_assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
            }
        }
    }
}

const ARENA_COLUMNS: u32 = 8;
const ARENA_ROWS: u32 = 6;

fn arena_cell() -> impl Strategy<Value = CellCoord> {
    (0..ARENA_COLUMNS, 0..ARENA_ROWS).prop_map(|(column, row)| CellCoord::new(column, row))
}

fn arena(walls: &[bool], blue: CellCoord, red: CellCoord, range: u32, diagonal: bool) -> World {
    let mut world = World::with_config(CombatConfig {
        diagonal_movement: diagonal,
        ..CombatConfig::default()
    });
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureGrid {
            columns: ARENA_COLUMNS,
            rows: ARENA_ROWS,
            cell_size: 1.0,
            origin: Vec2::ZERO,
        },
        &mut events,
    );
    for (index, &wall) in walls.iter().enumerate() {
        let index = index as u32;
        let cell = CellCoord::new(index % ARENA_COLUMNS, index / ARENA_COLUMNS);
        if wall && cell != blue && cell != red {
            apply(
                &mut world,
                Command::SetWalkable {
                    cell,
                    walkable: false,
                },
                &mut events,
            );
        }
    }
    for (team, cell) in [(Team::Blue, blue), (Team::Red, red)] {
        apply(
            &mut world,
            Command::SpawnUnit {
                team,
                cell,
                stats: UnitStats {
                    movement_range: range,
                    ..UnitStats::default()
                },
            },
            &mut events,
        );
    }
    apply(&mut world, Command::StartRound, &mut events);
    world
}

proptest! {
    #[test]
    fn move_targets_are_exactly_the_free_cells_within_range(
        walls in prop::collection::vec(prop::bool::weighted(0.3), (ARENA_COLUMNS * ARENA_ROWS) as usize),
        blue in arena_cell(),
        red in arena_cell(),
        range in 1..5_u32,
        diagonal in any::<bool>(),
    ) {
        let world = arena(&walls, blue, red, range, diagonal);
        let grid = query::grid(&world);
        let pathfinder = query::pathfinder(&world);
        let overlay = query::reachability(&world);

        prop_assert_eq!(overlay.origin(), Some(blue));
        for (cell, slot) in grid.iter() {
            let in_range = pathfinder.within_range(grid, blue, cell, range);
            prop_assert_eq!(
                overlay.is_valid_move_target(cell),
                in_range && slot.occupant().is_none(),
                "cell {:?}",
                cell
            );
        }
        if red != blue {
            prop_assert_eq!(
                overlay.is_valid_attack_target(red),
                pathfinder.within_range(grid, blue, red, range)
            );
        }
    }
}

#[test]
fn enclosed_goal_is_unreachable() {
    let mut grid = open_grid();
    let goal = CellCoord::new(6, 4);
    for column in 5..=7 {
        for row in 3..=5 {
            let cell = CellCoord::new(column, row);
            if cell != goal {
                let _ = grid.set(cell, Cell::wall());
            }
        }
    }

    for diagonal in [false, true] {
        let pathfinder = Pathfinder::new(diagonal);
        assert!(pathfinder
            .find_path(&grid, CellCoord::new(0, 0), goal)
            .is_none());
        assert!(!pathfinder.has_path(&grid, CellCoord::new(0, 0), goal));
    }
}

#[test]
fn breadth_first_check_agrees_with_search() {
    let mut grid = open_grid();
    for row in 0..ROWS - 1 {
        let _ = grid.set(CellCoord::new(4, row), Cell::wall());
    }
    let pathfinder = Pathfinder::new(false);
    let start = CellCoord::new(0, 0);
    let goal = CellCoord::new(11, 0);

    let path = pathfinder.find_path(&grid, start, goal).expect("gap at the bottom");
    assert!(pathfinder.has_path(&grid, start, goal));
    assert!(path.cells().any(|cell| cell == CellCoord::new(4, ROWS - 1)));

    let _ = grid.set(CellCoord::new(4, ROWS - 1), Cell::wall());
    assert!(pathfinder.find_path(&grid, start, goal).is_none());
    assert!(!pathfinder.has_path(&grid, start, goal));
}

#[test]
fn occupied_cells_do_not_block_the_search() {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureGrid {
            columns: 3,
            rows: 1,
            cell_size: 1.0,
            origin: Vec2::ZERO,
        },
        &mut events,
    );
    for column in 0..2 {
        apply(
            &mut world,
            Command::SpawnUnit {
                team: Team::Blue,
                cell: CellCoord::new(column, 0),
                stats: UnitStats::default(),
            },
            &mut events,
        );
    }

    let grid = query::grid(&world);
    assert!(grid.get(CellCoord::new(1, 0)).and_then(Cell::occupant).is_some());
    let path = query::pathfinder(&world)
        .find_path(grid, CellCoord::new(0, 0), CellCoord::new(2, 0))
        .expect("open row");

    assert_eq!(path.node_count(), 3);
}
