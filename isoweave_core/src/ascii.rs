// Text rendering of one perspective's screen plane.
//
// One character per screen cell, cropped to the cells that hold anything,
// high screen z at the top. When several cells share a screen cell the
// topmost one is drawn, which is what the camera would show.
//
// Used by the CLI and handy in test failure messages; nothing in the engine
// depends on it.

use crate::cell::Cell;
use crate::geometry::Perspective;
use crate::grid::Grid;
use crate::types::ScreenProjection;
use std::collections::BTreeMap;

/// Character for the cell drawn at one screen position.
///
/// Priority: current > planted > height digit.
pub fn cell_char(cell: &Cell, current: bool) -> char {
    if current {
        return '@';
    }
    if cell.is_planted() {
        return '*';
    }
    height_char(cell.height())
}

fn height_char(y: i32) -> char {
    match u32::try_from(y) {
        Ok(h) if h <= 9 => char::from_digit(h, 10).unwrap_or('+'),
        _ => '+',
    }
}

/// Draw `grid` as seen from `perspective`. An empty string for a grid with
/// no cells.
pub fn render_projection(grid: &Grid, perspective: Perspective) -> String {
    let mut top: BTreeMap<ScreenProjection, &Cell> = BTreeMap::new();
    for cell in grid.cells() {
        let proj = cell.projection(perspective);
        let keep = top.get(&proj).is_none_or(|held| cell.height() > held.height());
        if keep {
            top.insert(proj, cell);
        }
    }

    let Some((min_x, max_x, min_z, max_z)) = extent(top.keys()) else {
        return String::new();
    };

    let width = (max_x - min_x + 1) as usize;
    let mut out = String::with_capacity((width + 1) * (max_z - min_z + 1) as usize);
    for z in (min_z..=max_z).rev() {
        for x in min_x..=max_x {
            let c = match top.get(&ScreenProjection::new(x, z)) {
                Some(cell) => cell_char(cell, cell.id() == grid.current_cell()),
                None => '.',
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}

fn extent<'a>(
    mut points: impl Iterator<Item = &'a ScreenProjection>,
) -> Option<(i32, i32, i32, i32)> {
    let first = points.next()?;
    Some(points.fold(
        (first.x, first.x, first.z, first.z),
        |(lx, hx, lz, hz), p| (lx.min(p.x), hx.max(p.x), lz.min(p.z), hz.max(p.z)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::types::{CellId, GridPosition};

    #[test]
    fn lone_seed_is_a_single_at_sign() {
        let grid = Grid::new(GridConfig::default(), 0).unwrap();
        for p in Perspective::ALL {
            assert_eq!(render_projection(&grid, p), "@\n");
        }
    }

    #[test]
    fn flat_row_renders_left_to_right() {
        let mut grid = Grid::new(GridConfig::default(), 0).unwrap();
        grid.insert_cell(GridPosition::new(5, 0, 4)).unwrap();
        let far = grid.insert_cell(GridPosition::new(6, 0, 4)).unwrap();
        grid.set_current_cell(far);
        // The seed stays planted, the middle cell is unvisited at height 0.
        assert_eq!(render_projection(&grid, Perspective::NorthEast), "*0@\n");
    }

    #[test]
    fn rows_run_from_high_z_down() {
        let mut grid = Grid::new(GridConfig::default(), 0).unwrap();
        grid.insert_cell(GridPosition::new(4, 0, 5)).unwrap();
        grid.insert_cell(GridPosition::new(5, 0, 3)).unwrap();
        assert_eq!(
            render_projection(&grid, Perspective::SouthEast),
            "0.\n@.\n.0\n"
        );
    }

    #[test]
    fn topmost_cell_wins_a_shared_screen_cell() {
        let mut grid = Grid::new(GridConfig::default(), 0).unwrap();
        // (5,1,5) projects onto the seed under NE.
        let high = grid.insert_cell(GridPosition::new(5, 1, 5)).unwrap();
        let ne = Perspective::NorthEast;
        assert_eq!(
            grid.cell(high).unwrap().projection(ne),
            grid.cell(CellId(0)).unwrap().projection(ne)
        );
        assert_eq!(render_projection(&grid, Perspective::NorthEast), "1\n");
    }

    #[test]
    fn heights_above_nine_use_plus() {
        assert_eq!(height_char(0), '0');
        assert_eq!(height_char(9), '9');
        assert_eq!(height_char(10), '+');
    }
}
