//! Depth-first branch and bound with admissible estimators, and the two
//! scheduling puzzles solved with it.

pub mod robots;
pub mod search;
pub mod valves;

pub use search::{Outcome, Problem, Pruning, Search, SearchLimits, Visit};
