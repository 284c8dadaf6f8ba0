//! A* shortest-path search and breadth-first reachability over a grid.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, VecDeque},
};

use grid_tactics_core::CellCoord;

use crate::grid::{GridMap, Walkable};

/// Cost charged for a horizontal or vertical step.
pub const STRAIGHT_STEP_COST: u32 = 10;
/// Cost charged for a diagonal step.
pub const DIAGONAL_STEP_COST: u32 = 14;

/// Single cell visited by a path, annotated with its search costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathNode {
    /// Cell visited by the path.
    pub cell: CellCoord,
    /// Accumulated cost from the start of the path.
    pub g_cost: u32,
    /// Heuristic estimate from the cell to the goal.
    pub h_cost: u32,
}

impl PathNode {
    /// Combined score used to order the search frontier.
    #[must_use]
    pub const fn f_cost(&self) -> u32 {
        self.g_cost + self.h_cost
    }
}

/// Ordered sequence of cells from a start cell to a goal cell, inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<PathNode>,
}

impl Path {
    /// Nodes visited by the path, starting with the start cell.
    #[must_use]
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Number of cells visited by the path, including both endpoints.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of steps taken between the endpoints.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Total cost accumulated when reaching the goal.
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.nodes.last().map_or(0, |node| node.g_cost)
    }

    /// Cells visited by the path in travel order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.nodes.iter().map(|node| node.cell)
    }
}

/// Grid search engine configured with an adjacency rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pathfinder {
    diagonal: bool,
}

/// Per-cell scratch state kept for the duration of a single search.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    walkable: bool,
    g_cost: u32,
    h_cost: u32,
    came_from: Option<usize>,
    closed: bool,
}

/// Frontier entry ordered by total score, then heuristic, then cell index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f_cost: u32,
    h_cost: u32,
    index: usize,
    g_cost: u32,
}

static CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
static DIAGONAL_OFFSETS: [(i32, i32); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

impl Pathfinder {
    /// Creates a pathfinder that optionally steps diagonally.
    #[must_use]
    pub const fn new(diagonal: bool) -> Self {
        Self { diagonal }
    }

    /// Reports whether diagonal steps are permitted.
    #[must_use]
    pub const fn allows_diagonal(&self) -> bool {
        self.diagonal
    }

    /// Finds the cheapest walkable path between two cells.
    ///
    /// The returned path contains both endpoints; searching from a cell to
    /// itself yields a single node. Returns `None` when either endpoint lies
    /// outside the grid or the goal cannot be reached.
    #[must_use]
    pub fn find_path<T: Walkable>(
        &self,
        grid: &GridMap<T>,
        start: CellCoord,
        goal: CellCoord,
    ) -> Option<Path> {
        let start_index = grid.index(start)?;
        let goal_index = grid.index(goal)?;

        let mut nodes: Vec<SearchNode> = grid
            .iter()
            .map(|(_, payload)| SearchNode {
                walkable: payload.is_walkable(),
                g_cost: u32::MAX,
                h_cost: 0,
                came_from: None,
                closed: false,
            })
            .collect();

        let start_h = self.heuristic(start, goal);
        nodes[start_index].g_cost = 0;
        nodes[start_index].h_cost = start_h;

        let mut open = BinaryHeap::new();
        open.push(Reverse(OpenEntry {
            f_cost: start_h,
            h_cost: start_h,
            index: start_index,
            g_cost: 0,
        }));

        while let Some(Reverse(entry)) = open.pop() {
            let current = entry.index;
            if nodes[current].closed || entry.g_cost != nodes[current].g_cost {
                continue;
            }

            if current == goal_index {
                return Some(reconstruct(grid, &nodes, goal_index));
            }

            nodes[current].closed = true;
            let Some(cell) = grid.cell_at(current) else {
                continue;
            };

            for (neighbor, step_cost) in self.neighbors(grid, cell) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                let node = &mut nodes[neighbor_index];
                if node.closed || !node.walkable {
                    continue;
                }

                let tentative = entry.g_cost.saturating_add(step_cost);
                if tentative >= node.g_cost {
                    continue;
                }

                let h_cost = self.heuristic(neighbor, goal);
                node.g_cost = tentative;
                node.h_cost = h_cost;
                node.came_from = Some(current);
                open.push(Reverse(OpenEntry {
                    f_cost: tentative.saturating_add(h_cost),
                    h_cost,
                    index: neighbor_index,
                    g_cost: tentative,
                }));
            }
        }

        None
    }

    /// Reports whether any walkable route connects the two cells.
    #[must_use]
    pub fn has_path<T: Walkable>(&self, grid: &GridMap<T>, start: CellCoord, goal: CellCoord) -> bool {
        let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
            return false;
        };
        if start_index == goal_index {
            return true;
        }

        let mut visited = vec![false; grid.cell_count()];
        let mut queue = VecDeque::new();
        visited[start_index] = true;
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            for (neighbor, _) in self.neighbors(grid, cell) {
                let Some(index) = grid.index(neighbor) else {
                    continue;
                };
                if visited[index] || !grid.get(neighbor).is_some_and(|payload| payload.is_walkable()) {
                    continue;
                }
                if index == goal_index {
                    return true;
                }

                visited[index] = true;
                queue.push_back(neighbor);
            }
        }

        false
    }

    /// Reports whether the goal can be reached in at most `range` steps.
    #[must_use]
    pub fn within_range<T: Walkable>(
        &self,
        grid: &GridMap<T>,
        start: CellCoord,
        goal: CellCoord,
        range: u32,
    ) -> bool {
        let budget = usize::try_from(range).unwrap_or(usize::MAX).saturating_add(1);
        self.find_path(grid, start, goal)
            .is_some_and(|path| path.node_count() <= budget)
    }

    /// Admissible estimate of the cost between two cells.
    #[must_use]
    pub fn heuristic(&self, from: CellCoord, to: CellCoord) -> u32 {
        let dx = from.column().abs_diff(to.column());
        let dy = from.row().abs_diff(to.row());
        if self.diagonal {
            let diagonal = dx.min(dy);
            let straight = dx.max(dy) - diagonal;
            DIAGONAL_STEP_COST * diagonal + STRAIGHT_STEP_COST * straight
        } else {
            STRAIGHT_STEP_COST * (dx + dy)
        }
    }

    fn neighbors<'a, T>(
        &self,
        grid: &'a GridMap<T>,
        cell: CellCoord,
    ) -> impl Iterator<Item = (CellCoord, u32)> + 'a {
        let diagonals: &'static [(i32, i32)] = if self.diagonal {
            &DIAGONAL_OFFSETS
        } else {
            &[]
        };

        CARDINAL_OFFSETS
            .iter()
            .map(|offset| (*offset, STRAIGHT_STEP_COST))
            .chain(diagonals.iter().map(|offset| (*offset, DIAGONAL_STEP_COST)))
            .filter_map(move |((dx, dy), cost)| {
                cell.offset(dx, dy)
                    .filter(|neighbor| grid.contains(*neighbor))
                    .map(|neighbor| (neighbor, cost))
            })
    }
}

fn reconstruct<T>(grid: &GridMap<T>, nodes: &[SearchNode], goal_index: usize) -> Path {
    let mut path = Vec::new();
    let mut cursor = Some(goal_index);
    while let Some(index) = cursor {
        let node = &nodes[index];
        if let Some(cell) = grid.cell_at(index) {
            path.push(PathNode {
                cell,
                g_cost: node.g_cost,
                h_cost: node.h_cost,
            });
        }
        cursor = node.came_from;
    }
    path.reverse();
    Path { nodes: path }
}
