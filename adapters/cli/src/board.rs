//! Text rendering of the battlefield.

use grid_tactics_core::{CellCoord, Team};
use grid_tactics_world::{query, World};

/// Draws the grid top row first using the layout alphabet.
///
/// Living units replace the glyph of the cell they stand on.
pub(crate) fn render(world: &World) -> String {
    let grid = query::grid(world);
    let escape = query::escape_cell(world);
    let units = query::unit_view(world);
    let mut text = String::with_capacity(((grid.columns() + 1) * grid.rows()) as usize);

    for row in (0..grid.rows()).rev() {
        for column in 0..grid.columns() {
            let coord = CellCoord::new(column, row);
            let glyph = match grid.get(coord) {
                Some(cell) if !cell.walkable() => '#',
                Some(cell) => match cell.occupant().and_then(|unit| units.get(unit)) {
                    Some(unit) if unit.team == Team::Blue => 'B',
                    Some(_) => 'R',
                    None if escape == Some(coord) => 'E',
                    None => '.',
                },
                None => ' ',
            };
            text.push(glyph);
        }
        text.push('\n');
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_tactics_system_bootstrap::{Bootstrap, Layout};
    use grid_tactics_world::apply;

    #[test]
    fn rendering_reproduces_the_layout() {
        let map = "#####\n#B.R#\n#..E#\n#####\n";
        let layout = Layout::parse(map).expect("valid layout");
        let mut commands = Vec::new();
        Bootstrap::default().commands(&layout, &mut commands);
        let mut world = World::new();
        let mut events = Vec::new();
        for command in commands {
            apply(&mut world, command, &mut events);
        }

        assert_eq!(render(&world), map);
    }
}
