use miette::*;
use rayon::prelude::*;

use crate::search::{Problem, Search};

const ORE: usize = 0;
const CLAY: usize = 1;
const OBSIDIAN: usize = 2;
const GEODE: usize = 3;

/// Costs of each robot kind. Obsidian robots cost ore and clay, geode robots
/// cost ore and obsidian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blueprint {
    pub id: u32,
    pub ore_robot: u32,
    pub clay_robot: u32,
    pub obsidian_robot: (u32, u32),
    pub geode_robot: (u32, u32),
}

impl Blueprint {
    /// Most geodes this blueprint can crack in `minutes`, starting from a
    /// single ore robot.
    #[tracing::instrument(skip(self), fields(id = self.id))]
    pub fn max_geodes(&self, minutes: u32) -> Result<u32> {
        let factory = Factory::new(*self, minutes)?;
        let outcome = Search::new(&factory).best_score(&factory.initial(), 0);
        Ok(outcome.score)
    }
}

/// Sum of `id * geodes` over all blueprints.
#[tracing::instrument(skip(blueprints), fields(blueprints = blueprints.len()))]
pub fn quality_level_sum(blueprints: &[Blueprint], minutes: u32) -> Result<u32> {
    let levels = blueprints
        .par_iter()
        .map(|b| b.max_geodes(minutes).map(|geodes| b.id * geodes))
        .collect::<Result<Vec<u32>>>()?;
    Ok(levels.into_iter().sum())
}

/// Product of the geode counts of the first `take` blueprints.
#[tracing::instrument(skip(blueprints))]
pub fn geode_product(blueprints: &[Blueprint], minutes: u32, take: usize) -> Result<u32> {
    let geodes = blueprints
        .par_iter()
        .take(take)
        .map(|b| b.max_geodes(minutes))
        .collect::<Result<Vec<u32>>>()?;
    Ok(geodes.into_iter().product())
}

/// Robot building as a search problem, one minute per step.
#[derive(Debug, Clone)]
pub struct Factory {
    /// `costs[robot][resource]`, geodes are never spent.
    costs: [[u32; 3]; 4],
    /// More robots of a kind than the most that can be spent in a minute are
    /// useless, since only one robot is built per minute.
    caps: [u32; 3],
    minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stock {
    minutes: u32,
    inventory: [u32; 4],
    robots: [u32; 4],
}

impl Factory {
    pub fn new(blueprint: Blueprint, minutes: u32) -> Result<Self> {
        let Blueprint {
            id,
            ore_robot,
            clay_robot,
            obsidian_robot,
            geode_robot,
        } = blueprint;
        ensure!(
            [ore_robot, clay_robot, obsidian_robot.0, obsidian_robot.1, geode_robot.0, geode_robot.1]
                .iter()
                .all(|&c| c > 0),
            "Blueprint {id} has a robot that costs nothing"
        );

        let costs = [
            [ore_robot, 0, 0],
            [clay_robot, 0, 0],
            [obsidian_robot.0, obsidian_robot.1, 0],
            [geode_robot.0, 0, geode_robot.1],
        ];
        let caps = [
            costs.iter().map(|c| c[ORE]).max().unwrap_or(0),
            obsidian_robot.1,
            geode_robot.1,
        ];
        Ok(Self {
            costs,
            caps,
            minutes,
        })
    }

    pub fn initial(&self) -> Stock {
        Stock {
            minutes: self.minutes,
            inventory: [0; 4],
            robots: [1, 0, 0, 0],
        }
    }

    fn produce(stock: &Stock) -> [u32; 4] {
        std::array::from_fn(|r| stock.inventory[r] + stock.robots[r])
    }
}

impl Problem for Factory {
    type State = Stock;
    type Action = usize;

    fn budget(&self, stock: &Stock) -> u32 {
        stock.minutes
    }

    fn value(&self, stock: &Stock) -> u32 {
        stock.inventory[GEODE] + stock.robots[GEODE] * stock.minutes
    }

    /// Relaxed factory with endless ore that may build one robot of every kind
    /// each minute. Building greedily there never falls behind any real plan:
    /// clay robots are free, so clay production dominates, and in turn
    /// obsidian production and geode robots do too.
    fn upper_bound(&self, stock: &Stock) -> u32 {
        let (clay_cost, obsidian_cost) = (self.costs[OBSIDIAN][CLAY], self.costs[GEODE][OBSIDIAN]);
        let [_, mut clay, mut obsidian, mut geodes] = stock.inventory;
        let [_, mut clay_robots, mut obsidian_robots, mut geode_robots] = stock.robots;

        for _ in 0..stock.minutes {
            let new_geode = obsidian >= obsidian_cost;
            let new_obsidian = clay >= clay_cost;

            clay += clay_robots;
            obsidian += obsidian_robots;
            geodes += geode_robots;

            if new_geode {
                obsidian -= obsidian_cost;
                geode_robots += 1;
            }
            if new_obsidian {
                clay -= clay_cost;
                obsidian_robots += 1;
            }
            clay_robots += 1;
        }
        geodes
    }

    fn actions(&self, _stock: &Stock) -> Vec<usize> {
        vec![GEODE, OBSIDIAN, CLAY, ORE]
    }

    /// Pays for the robot, collects this minute's production, then the new
    /// robot joins.
    fn apply(&self, stock: &Stock, robot: usize) -> Option<Stock> {
        if robot != GEODE && stock.robots[robot] >= self.caps[robot] {
            return None;
        }
        let cost = &self.costs[robot];
        if (0..3).any(|r| stock.inventory[r] < cost[r]) {
            return None;
        }

        let mut inventory = Self::produce(stock);
        for (held, spent) in inventory.iter_mut().zip(cost) {
            *held -= spent;
        }
        let mut robots = stock.robots;
        robots[robot] += 1;
        Some(Stock {
            minutes: stock.minutes - 1,
            inventory,
            robots,
        })
    }

    fn wait(&self, stock: &Stock) -> Option<Stock> {
        Some(Stock {
            minutes: stock.minutes - 1,
            inventory: Self::produce(stock),
            robots: stock.robots,
        })
    }
}
