#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a Grid Tactics battlefield.
//!
//! Levels are described with ASCII art where each character is a cell:
//!
//! ```text
//! #########
//! #B.....R#
//! #..##...#
//! #B....RE#
//! #########
//! ```
//!
//! `#` marks a wall, `.` open floor, `B` and `R` the spawn cells of the blue
//! and red teams, and `E` the escape cell. The first line is the top row of the
//! grid.

use glam::Vec2;
use grid_tactics_core::{CellCoord, Command, Team, UnitStats};
use grid_tactics_world::{query, World};
use thiserror::Error;

/// Problems detected while parsing an ASCII layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout contained no rows.
    #[error("layout is empty")]
    Empty,
    /// A row's width differs from the first row.
    #[error("line {line} has {found} cells, expected {expected}")]
    Ragged {
        /// One-based line number of the offending row.
        line: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A character outside the layout alphabet was found.
    #[error("unknown glyph {glyph:?} at line {line}, column {column}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// One-based line number of the character.
        line: usize,
        /// One-based column of the character.
        column: usize,
    },
    /// The layout has no escape cell.
    #[error("layout has no escape cell")]
    MissingEscape,
    /// The layout marks more than one escape cell.
    #[error("layout has more than one escape cell")]
    MultipleEscapes,
}

/// Parsed battlefield description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    columns: u32,
    rows: u32,
    walls: Vec<CellCoord>,
    spawns: Vec<(Team, CellCoord)>,
    escape: CellCoord,
}

impl Layout {
    /// Parses an ASCII layout, ignoring blank lines and trailing whitespace.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim_end()))
            .filter(|(_, line)| !line.is_empty())
            .collect();
        let Some(&(_, first)) = lines.first() else {
            return Err(LayoutError::Empty);
        };

        let expected = first.chars().count();
        let rows = to_u32(lines.len());
        let mut walls = Vec::new();
        let mut spawns = Vec::new();
        let mut escape = None;

        for (offset, &(line, content)) in lines.iter().enumerate() {
            let found = content.chars().count();
            if found != expected {
                return Err(LayoutError::Ragged {
                    line,
                    expected,
                    found,
                });
            }

            let row = rows - 1 - to_u32(offset);
            for (column, glyph) in content.chars().enumerate() {
                let cell = CellCoord::new(to_u32(column), row);
                match glyph {
                    '.' => {}
                    '#' => walls.push(cell),
                    'B' => spawns.push((Team::Blue, cell)),
                    'R' => spawns.push((Team::Red, cell)),
                    'E' => {
                        if escape.replace(cell).is_some() {
                            return Err(LayoutError::MultipleEscapes);
                        }
                    }
                    _ => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph,
                            line,
                            column: column + 1,
                        })
                    }
                }
            }
        }

        let escape = escape.ok_or(LayoutError::MissingEscape)?;
        Ok(Self {
            columns: to_u32(expected),
            rows,
            walls,
            spawns,
            escape,
        })
    }

    /// Number of columns described by the layout.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows described by the layout.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Wall cells in reading order.
    #[must_use]
    pub fn walls(&self) -> &[CellCoord] {
        &self.walls
    }

    /// Spawn cells in reading order, tagged with the team spawning there.
    #[must_use]
    pub fn spawns(&self) -> &[(Team, CellCoord)] {
        &self.spawns
    }

    /// Cell blue units must reach to win.
    #[must_use]
    pub const fn escape(&self) -> CellCoord {
        self.escape
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Produces the command batch that prepares a battlefield.
#[derive(Clone, Copy, Debug)]
pub struct Bootstrap {
    cell_size: f32,
    blue: UnitStats,
    red: UnitStats,
}

impl Bootstrap {
    /// Creates a bootstrap system spawning units with the provided statistics.
    #[must_use]
    pub const fn new(cell_size: f32, blue: UnitStats, red: UnitStats) -> Self {
        Self {
            cell_size,
            blue,
            red,
        }
    }

    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Emits the commands that configure the grid, carve walls, mark the
    /// escape cell, spawn every unit and start the first round.
    pub fn commands(&self, layout: &Layout, out: &mut Vec<Command>) {
        out.push(Command::ConfigureGrid {
            columns: layout.columns(),
            rows: layout.rows(),
            cell_size: self.cell_size,
            origin: Vec2::ZERO,
        });
        out.extend(layout.walls().iter().map(|&cell| Command::SetWalkable {
            cell,
            walkable: false,
        }));
        out.push(Command::SetEscapeCell {
            cell: layout.escape(),
        });
        out.extend(layout.spawns().iter().map(|&(team, cell)| Command::SpawnUnit {
            team,
            cell,
            stats: match team {
                Team::Blue => self.blue,
                Team::Red => self.red,
            },
        }));
        out.push(Command::StartRound);
    }
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new(1.0, UnitStats::default(), UnitStats::default())
    }
}
