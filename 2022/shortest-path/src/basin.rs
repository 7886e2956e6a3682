use glam::IVec2;
use miette::*;

use crate::bfs::{first_reached, from_fn};
use crate::grid::ORTHOGONAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    fn step(self) -> IVec2 {
        match self {
            Heading::Up => IVec2::NEG_Y,
            Heading::Down => IVec2::Y,
            Heading::Left => IVec2::NEG_X,
            Heading::Right => IVec2::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blizzard {
    pub position: IVec2,
    pub heading: Heading,
}

/// Node of the layered graph: which snapshot we are in and where we stand.
type Layered = (usize, IVec2);

/// A walled valley swept by blizzards that wrap around its interior.
///
/// Interior cells span `(0, 0)..(width, height)`. The entrance sits just above
/// the top-left cell and the exit just below the bottom-right one.
#[derive(Debug, Clone)]
pub struct Basin {
    width: i32,
    height: i32,
    /// Blocked interior cells, one row-major snapshot per minute of the period.
    snapshots: Vec<Vec<bool>>,
}

impl Basin {
    pub fn new(width: i32, height: i32, blizzards: &[Blizzard]) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "Basin interior must not be empty, got {width}x{height}"
        );
        let size = IVec2::new(width, height);
        if let Some(b) = blizzards
            .iter()
            .find(|b| b.position.cmplt(IVec2::ZERO).any() || b.position.cmpge(size).any())
        {
            bail!("Blizzard at {} lies outside the {width}x{height} interior", b.position);
        }

        // Every blizzard is back where it started after lcm(width, height) minutes.
        let period = num_integer::lcm(width as usize, height as usize);
        let snapshots = (0..period)
            .map(|minute| {
                let mut blocked = vec![false; (width * height) as usize];
                for b in blizzards {
                    let p = (b.position + b.heading.step() * minute as i32).rem_euclid(size);
                    blocked[(p.y * width + p.x) as usize] = true;
                }
                blocked
            })
            .collect();

        Ok(Self {
            width,
            height,
            snapshots,
        })
    }

    pub fn entrance(&self) -> IVec2 {
        IVec2::new(0, -1)
    }

    pub fn exit(&self) -> IVec2 {
        IVec2::new(self.width - 1, self.height)
    }

    pub fn period(&self) -> usize {
        self.snapshots.len()
    }

    fn is_clear(&self, phase: usize, p: IVec2) -> bool {
        if p == self.entrance() || p == self.exit() {
            return true;
        }
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return false;
        }
        !self.snapshots[phase][(p.y * self.width + p.x) as usize]
    }

    /// Minutes needed to walk from `from` to `to`, leaving at `departure`.
    ///
    /// Each minute the expedition moves orthogonally or waits, and may never
    /// share a cell with a blizzard after the move. Time is folded into the
    /// period, so the layered graph has `period * cells` nodes.
    pub fn walk(&self, departure: usize, from: IVec2, to: IVec2) -> Result<usize> {
        let period = self.period();
        let layers = from_fn(|&(phase, p): &Layered| {
            let next = (phase + 1) % period;
            ORTHOGONAL
                .iter()
                .map(|&d| p + d)
                .chain([p])
                .filter(|&q| self.is_clear(next, q))
                .map(|q| (next, q))
                .collect()
        });

        first_reached(&layers, (departure % period, from), |&(_, p)| p == to)
            .map(|(_, minutes)| minutes)
            .ok_or(miette!("{to} cannot be reached from {from} at minute {departure}"))
    }

    #[tracing::instrument(skip(self))]
    pub fn crossing(&self) -> Result<usize> {
        self.walk(0, self.entrance(), self.exit())
    }

    /// Entrance to exit, back to the entrance, and to the exit again.
    #[tracing::instrument(skip(self))]
    pub fn round_trip(&self) -> Result<usize> {
        let there = self.walk(0, self.entrance(), self.exit())?;
        let back = self.walk(there, self.exit(), self.entrance())?;
        let again = self.walk(there + back, self.entrance(), self.exit())?;
        tracing::debug!(there, back, again, "legs");
        Ok(there + back + again)
    }
}
