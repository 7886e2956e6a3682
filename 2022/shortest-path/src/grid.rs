use glam::IVec2;
use itertools::iproduct;
use miette::*;
use std::collections::HashMap;

use crate::bfs::{reversed, shortest_paths};

/// Orthogonal steps, in the order successors are listed.
pub const ORTHOGONAL: [IVec2; 4] = [IVec2::NEG_Y, IVec2::Y, IVec2::NEG_X, IVec2::X];

pub const HIGHEST: u8 = 25;

/// Every cell of a `width` x `height` grid linked to its orthogonal neighbours.
pub fn uniform_grid(width: i32, height: i32) -> HashMap<IVec2, Vec<IVec2>> {
    let inside = |p: IVec2| p.x >= 0 && p.y >= 0 && p.x < width && p.y < height;
    iproduct!(0..height, 0..width)
        .map(|(y, x)| IVec2::new(x, y))
        .map(|p| {
            let successors = ORTHOGONAL.iter().map(|&d| p + d).filter(|&q| inside(q)).collect();
            (p, successors)
        })
        .collect()
}

/// Terrain where a step may climb at most one unit but drop any amount.
#[derive(Debug, Clone)]
pub struct HeightMap {
    width: i32,
    height: i32,
    elevations: Vec<u8>,
    start: IVec2,
    end: IVec2,
}

impl HeightMap {
    pub fn new(rows: Vec<Vec<u8>>, start: IVec2, end: IVec2) -> Result<Self> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        ensure!(width > 0, "Height map has no cells");
        if let Some((y, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            bail!("Row {y} has {} cells, expected {width}", row.len());
        }
        let elevations: Vec<u8> = rows.into_iter().flatten().collect();
        if let Some(&e) = elevations.iter().find(|&&e| e > HIGHEST) {
            bail!("Elevation {e} is above the highest level {HIGHEST}");
        }

        let map = Self {
            width: width as i32,
            height: (elevations.len() / width) as i32,
            elevations,
            start,
            end,
        };
        ensure!(map.contains(start), "Start {start} lies outside the map");
        ensure!(map.contains(end), "End {end} lies outside the map");
        Ok(map)
    }

    /// Builds a map from rows of `a..=z`, with `S` (lowest) as start and `E`
    /// (highest) as end.
    pub fn from_letters<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let mut start = None;
        let mut end = None;
        let mut grid = Vec::with_capacity(rows.len());

        for (y, row) in rows.iter().enumerate() {
            let mut cells = Vec::new();
            for (x, c) in row.as_ref().chars().enumerate() {
                let here = IVec2::new(x as i32, y as i32);
                let elevation = match c {
                    'S' => {
                        start = Some(here);
                        0
                    }
                    'E' => {
                        end = Some(here);
                        HIGHEST
                    }
                    'a'..='z' => c as u8 - b'a',
                    other => bail!("Unexpected terrain {other:?} at {here}"),
                };
                cells.push(elevation);
            }
            grid.push(cells);
        }

        let start = start.ok_or(miette!("No start position 'S' found"))?;
        let end = end.ok_or(miette!("No end position 'E' found"))?;
        Self::new(grid, start, end)
    }

    fn contains(&self, p: IVec2) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    pub fn elevation(&self, p: IVec2) -> Option<u8> {
        self.contains(p)
            .then(|| self.elevations[(p.y * self.width + p.x) as usize])
    }

    fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        iproduct!(0..self.height, 0..self.width).map(|(y, x)| IVec2::new(x, y))
    }

    /// Walkable steps: into any orthogonal neighbour at most one unit higher.
    pub fn graph(&self) -> HashMap<IVec2, Vec<IVec2>> {
        self.cells()
            .map(|p| {
                let limit = self.elevation(p).unwrap_or(0) + 1;
                let successors = ORTHOGONAL
                    .iter()
                    .map(|&d| p + d)
                    .filter(|&q| self.elevation(q).is_some_and(|e| e <= limit))
                    .collect();
                (p, successors)
            })
            .collect()
    }

    #[tracing::instrument(skip(self))]
    pub fn steps_from_start(&self) -> Result<usize> {
        shortest_paths(&self.graph(), self.start)
            .get(&self.end)
            .copied()
            .ok_or(miette!("End {} is unreachable from start {}", self.end, self.start))
    }

    /// Shortest climb to the end from any cell at the lowest elevation.
    ///
    /// One traversal backwards from the end answers every candidate at once.
    #[tracing::instrument(skip(self))]
    pub fn fewest_steps_from_lowest(&self) -> Result<usize> {
        let backwards = shortest_paths(&reversed(&self.graph()), self.end);
        self.cells()
            .filter(|&p| self.elevation(p) == Some(0))
            .filter_map(|p| backwards.get(&p).copied())
            .min()
            .ok_or(miette!("No lowest cell can reach end {}", self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    const EXAMPLE: [&str; 5] = ["Sabqponm", "abcryxxl", "accszExk", "acctuvwj", "abdefghi"];

    #[test]
    fn it_works() -> Result<()> {
        let map = HeightMap::from_letters(&EXAMPLE)?;
        assert_eq!(31, map.steps_from_start()?);
        assert_eq!(29, map.fewest_steps_from_lowest()?);
        Ok(())
    }

    #[rstest]
    #[case(IVec2::new(4, 4), 8)]
    #[case(IVec2::new(0, 4), 4)]
    #[case(IVec2::new(2, 3), 5)]
    #[case(IVec2::ZERO, 0)]
    fn open_grid_is_manhattan(#[case] target: IVec2, #[case] expected: usize) {
        let distances = shortest_paths(&uniform_grid(5, 5), IVec2::ZERO);
        assert_eq!(distances.len(), 25);
        assert_eq!(distances[&target], expected);
    }

    #[test]
    fn cliffs_only_block_climbing() -> Result<()> {
        let map = HeightMap::from_letters(&["SaE"])?;
        assert!(map.steps_from_start().is_err());

        let down = HeightMap::new(vec![vec![25, 0]], IVec2::new(0, 0), IVec2::new(1, 0))?;
        assert_eq!(1, down.steps_from_start()?);
        Ok(())
    }

    #[rstest]
    #[case(&["Sa", "b"])]
    #[case(&["abc"])]
    #[case(&["S#E"])]
    fn rejects_malformed_maps(#[case] rows: &[&str]) {
        assert!(HeightMap::from_letters(rows).is_err());
    }
}
