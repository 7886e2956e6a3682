use miette::*;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Jet {
    Left,
    Right,
}

/// A finite jet sequence that repeats forever, addressed by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JetPattern {
    jets: Vec<Jet>,
}

impl JetPattern {
    pub fn new(jets: Vec<Jet>) -> Result<Self> {
        ensure!(!jets.is_empty(), "Jet pattern is empty");
        Ok(Self { jets })
    }

    pub fn len(&self) -> usize {
        self.jets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jets.is_empty()
    }

    fn get(&self, cursor: usize) -> Jet {
        self.jets[cursor % self.jets.len()]
    }
}

impl FromStr for JetPattern {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self> {
        let jets = s
            .trim()
            .chars()
            .map(|c| match c {
                '<' => Ok(Jet::Left),
                '>' => Ok(Jet::Right),
                other => Err(miette!("Unexpected jet {other:?}")),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(jets)
    }
}

/// Rock shapes bottom row first, already placed two columns from the left
/// wall. Bit 6 is the leftmost column.
const ROCKS: [&[u8]; 5] = [
    &[0b0011110],
    &[0b0001000, 0b0011100, 0b0001000],
    &[0b0011100, 0b0000100, 0b0000100],
    &[0b0010000, 0b0010000, 0b0010000, 0b0010000],
    &[0b0011000, 0b0011000],
];

const LEFT_WALL: u8 = 0b1000000;
const RIGHT_WALL: u8 = 0b0000001;
const OPEN_ROW: u8 = 0b1111111;

/// Air cells a falling rock can still reach, one mask per row from the top
/// down. The last mask is empty unless the reachable air touches the floor.
type Surface = Vec<u8>;

/// Seven-wide chamber that rocks fall into, one row per byte, bottom first.
#[derive(Debug, Clone)]
pub struct Chamber<'a> {
    pattern: &'a JetPattern,
    rows: Vec<u8>,
    jet: usize,
    dropped: u64,
}

impl<'a> Chamber<'a> {
    pub fn new(pattern: &'a JetPattern) -> Self {
        Self {
            pattern,
            rows: Vec::new(),
            jet: 0,
            dropped: 0,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    fn collides(&self, rock: &[u8], y: usize) -> bool {
        rock.iter()
            .enumerate()
            .any(|(i, part)| self.rows.get(y + i).is_some_and(|row| row & part != 0))
    }

    /// Lets the next rock fall until it comes to rest.
    pub fn drop_rock(&mut self) {
        let shape = ROCKS[(self.dropped % ROCKS.len() as u64) as usize];
        let mut rock = [0u8; 4];
        let rock = &mut rock[..shape.len()];
        rock.copy_from_slice(shape);
        let mut y = self.height() + 3;

        loop {
            let jet = self.pattern.get(self.jet);
            self.jet = (self.jet + 1) % self.pattern.len();

            let mut pushed = [0u8; 4];
            let pushed = &mut pushed[..rock.len()];
            let blocked = match jet {
                Jet::Left => rock.iter().any(|part| part & LEFT_WALL != 0),
                Jet::Right => rock.iter().any(|part| part & RIGHT_WALL != 0),
            };
            if !blocked {
                for (dst, part) in pushed.iter_mut().zip(rock.iter()) {
                    *dst = match jet {
                        Jet::Left => part << 1,
                        Jet::Right => part >> 1,
                    };
                }
                if !self.collides(pushed, y) {
                    rock.copy_from_slice(pushed);
                }
            }

            if y == 0 || self.collides(rock, y - 1) {
                break;
            }
            y -= 1;
        }

        for (i, part) in rock.iter().enumerate() {
            if y + i == self.rows.len() {
                self.rows.push(0);
            }
            self.rows[y + i] |= part;
        }
        self.dropped += 1;
    }

    /// Rocks only move sideways and down, so any two chambers with the same
    /// reachable air behave the same from here on, however deep it goes.
    fn surface(&self) -> Surface {
        let mut surface = Vec::new();
        let mut above = OPEN_ROW;
        for &row in self.rows.iter().rev() {
            let free = !row & OPEN_ROW;
            let mut reach = above & free;
            loop {
                let spread = reach | ((reach << 1) & free) | ((reach >> 1) & free);
                if spread == reach {
                    break;
                }
                reach = spread;
            }
            surface.push(reach);
            if reach == 0 {
                break;
            }
            above = reach;
        }
        surface
    }
}

/// Height of the tower after `rocks` rocks have fallen.
///
/// Once the same rock shape, jet position and reachable surface come around
/// again the tower grows by a fixed amount per period, so whole periods are
/// skipped arithmetically and only the remainder is simulated.
#[tracing::instrument(skip(pattern), fields(jets = pattern.len()))]
pub fn tower_height(pattern: &JetPattern, rocks: u64) -> u64 {
    let mut chamber = Chamber::new(pattern);
    let mut seen: HashMap<(usize, usize, Surface), (u64, usize)> = HashMap::new();
    let mut skipped: Option<u64> = None;

    while chamber.dropped < rocks {
        chamber.drop_rock();
        if skipped.is_some() {
            continue;
        }

        let key = (
            (chamber.dropped % ROCKS.len() as u64) as usize,
            chamber.jet,
            chamber.surface(),
        );
        match seen.get(&key) {
            Some(&(before, height)) => {
                let period = chamber.dropped - before;
                let growth = (chamber.height() - height) as u64;
                let cycles = (rocks - chamber.dropped) / period;
                tracing::debug!(period, growth, cycles, "tower repeats");

                chamber.dropped += cycles * period;
                skipped = Some(cycles * growth);
            }
            None => {
                seen.insert(key, (chamber.dropped, chamber.height()));
            }
        }
    }

    chamber.height() as u64 + skipped.unwrap_or(0)
}
