//! Long-running simulations made cheap: a rock tower that repeats, and a
//! number ring mixed in place.

pub mod mixing;
pub mod tower;
