use aoc2022_shortest_path::shortest_paths;
use itertools::Itertools;
use miette::*;
use std::collections::HashMap;

use crate::search::{Problem, Search};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valve {
    pub name: String,
    pub flow: u32,
    pub tunnels: Vec<String>,
}

impl Valve {
    pub fn new(name: &str, flow: u32, tunnels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            flow,
            tunnels: tunnels.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Valves joined by tunnels that each take one minute to walk.
#[derive(Debug, Clone)]
pub struct ValveNetwork {
    valves: Vec<Valve>,
    index: HashMap<String, usize>,
    tunnels: HashMap<usize, Vec<usize>>,
}

impl ValveNetwork {
    pub fn new(valves: Vec<Valve>) -> Result<Self> {
        let mut index = HashMap::with_capacity(valves.len());
        for (i, valve) in valves.iter().enumerate() {
            if index.insert(valve.name.clone(), i).is_some() {
                bail!("Valve {} is listed twice", valve.name);
            }
        }

        let mut tunnels = HashMap::with_capacity(valves.len());
        for (i, valve) in valves.iter().enumerate() {
            let ends = valve
                .tunnels
                .iter()
                .map(|name| {
                    index
                        .get(name)
                        .copied()
                        .ok_or(miette!("Tunnel from {} leads to unknown valve {name}", valve.name))
                })
                .collect::<Result<Vec<_>>>()?;
            tunnels.insert(i, ends);
        }

        Ok(Self {
            valves,
            index,
            tunnels,
        })
    }

    /// Reduces the network to the valves worth opening and the walking
    /// distances between them.
    pub fn schedule(&self, start: &str, minutes: u32, agents: u32) -> Result<ValveSchedule> {
        let start = *self
            .index
            .get(start)
            .ok_or(miette!("Start valve {start} is not in the network"))?;
        ensure!(agents > 0, "At least one agent is needed to open valves");

        let targets: Vec<usize> = (0..self.valves.len())
            .filter(|&i| self.valves[i].flow > 0)
            .collect();
        ensure!(
            targets.len() <= 64,
            "{} valves with positive flow exceed the 64 a schedule can track",
            targets.len()
        );

        let distances_from = |origin: usize| -> Vec<Option<u32>> {
            let reached = shortest_paths(&self.tunnels, origin);
            targets
                .iter()
                .map(|t| reached.get(t).map(|&d| d as u32))
                .collect()
        };

        Ok(ValveSchedule {
            flows: targets.iter().map(|&t| self.valves[t].flow).collect(),
            from_start: distances_from(start),
            travel: targets.iter().map(|&t| distances_from(t)).collect(),
            minutes,
            agents,
        })
    }

    /// Most pressure `agents` can release in `minutes` each, all setting out
    /// from `start`.
    #[tracing::instrument(skip(self))]
    pub fn most_pressure(&self, start: &str, minutes: u32, agents: u32) -> Result<u32> {
        let schedule = self.schedule(start, minutes, agents)?;
        let outcome = Search::new(&schedule).best_score(&schedule.initial(), 0);
        Ok(outcome.score)
    }
}

/// Valve opening as a search problem.
///
/// Agents take turns: the first one plans its whole walk, then hands over to
/// the next, who starts at the start valve with a fresh clock and only the
/// valves still closed. Any split of the valves between agents is reachable
/// this way.
#[derive(Debug, Clone)]
pub struct ValveSchedule {
    flows: Vec<u32>,
    /// Distance from the start valve to each target, if reachable.
    from_start: Vec<Option<u32>>,
    travel: Vec<Vec<Option<u32>>>,
    minutes: u32,
    agents: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crew {
    /// Target the active agent last opened; `None` while still at the start.
    position: Option<usize>,
    minutes: u32,
    closed: u64,
    released: u32,
    /// Agents that have not set out yet.
    waiting: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Open(usize),
    HandOver,
}

impl ValveSchedule {
    pub fn initial(&self) -> Crew {
        Crew {
            position: None,
            minutes: self.minutes,
            closed: if self.flows.len() == 64 {
                u64::MAX
            } else {
                (1 << self.flows.len()) - 1
            },
            released: 0,
            waiting: self.agents - 1,
        }
    }

    fn closed(&self, crew: &Crew) -> impl Iterator<Item = usize> + '_ {
        let closed = crew.closed;
        (0..self.flows.len()).filter(move |&t| closed & (1 << t) != 0)
    }

    fn walk(&self, position: Option<usize>, target: usize) -> Option<u32> {
        match position {
            Some(from) => self.travel[from][target],
            None => self.from_start[target],
        }
    }

    /// Latest minutes at which an agent could possibly open valves, from
    /// `minutes` left at `position`: opening takes a minute and distinct
    /// valves are at least a minute apart.
    fn slots(&self, crew: &Crew, position: Option<usize>, minutes: u32) -> impl Iterator<Item = u32> {
        let on_closed_valve = self
            .closed(crew)
            .any(|t| self.walk(position, t) == Some(0));
        let first = minutes.saturating_sub(if on_closed_valve { 1 } else { 2 });
        (1..=first).rev().step_by(2)
    }
}

impl Problem for ValveSchedule {
    type State = Crew;
    type Action = Move;

    fn budget(&self, crew: &Crew) -> u32 {
        crew.minutes + crew.waiting * self.minutes
    }

    fn value(&self, crew: &Crew) -> u32 {
        crew.released
    }

    /// Pairs the strongest closed valves with the latest opening times any
    /// agent could manage, as if every valve were one step from the next.
    fn upper_bound(&self, crew: &Crew) -> u32 {
        let mut slots: Vec<u32> = self.slots(crew, crew.position, crew.minutes).collect();
        for _ in 0..crew.waiting {
            slots.extend(self.slots(crew, None, self.minutes));
        }

        let potential: u32 = self
            .closed(crew)
            .map(|t| self.flows[t])
            .sorted_unstable_by(|a, b| b.cmp(a))
            .zip(slots.into_iter().sorted_unstable_by(|a, b| b.cmp(a)))
            .map(|(flow, minutes)| flow * minutes)
            .sum();
        crew.released + potential
    }

    fn actions(&self, crew: &Crew) -> Vec<Move> {
        let mut moves: Vec<Move> = self.closed(crew).map(Move::Open).collect();
        if crew.waiting > 0 {
            moves.push(Move::HandOver);
        }
        moves
    }

    fn apply(&self, crew: &Crew, action: Move) -> Option<Crew> {
        match action {
            Move::Open(target) => {
                let distance = self.walk(crew.position, target)?;
                let minutes = crew.minutes.checked_sub(distance + 1).filter(|&m| m > 0)?;
                Some(Crew {
                    position: Some(target),
                    minutes,
                    closed: crew.closed & !(1 << target),
                    released: crew.released + self.flows[target] * minutes,
                    waiting: crew.waiting,
                })
            }
            Move::HandOver => Some(Crew {
                position: None,
                minutes: self.minutes,
                waiting: crew.waiting.checked_sub(1)?,
                ..*crew
            }),
        }
    }
}
