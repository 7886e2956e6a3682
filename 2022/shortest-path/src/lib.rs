//! Unit-weight shortest paths over lazily expanded graphs, and the puzzles
//! that lean on them.

pub mod basin;
pub mod bfs;
pub mod droplet;
pub mod grid;

pub use bfs::{distance, first_reached, from_fn, reversed, shortest_paths, FromFn, Graph};
