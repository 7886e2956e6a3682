use glam::IVec3;
use std::collections::HashSet;

use crate::bfs::{from_fn, shortest_paths};

const FACES: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

/// Faces of unit cubes not touching another cube, air pockets included.
pub fn surface_area(cubes: &[IVec3]) -> usize {
    let solid: HashSet<IVec3> = cubes.iter().copied().collect();
    solid
        .iter()
        .flat_map(|&cube| FACES.iter().map(move |&d| cube + d))
        .filter(|side| !solid.contains(side))
        .count()
}

/// Faces reachable by air flowing in from outside the droplet.
///
/// Air is flood-filled through a bounding box padded by one cell on every
/// side, so the corner is always outside and every exterior face borders the
/// fill.
#[tracing::instrument(skip_all, fields(cubes = cubes.len()))]
pub fn exterior_surface_area(cubes: &[IVec3]) -> usize {
    let solid: HashSet<IVec3> = cubes.iter().copied().collect();
    let Some(first) = solid.iter().next() else {
        return 0;
    };
    let (lo, hi) = solid
        .iter()
        .fold((*first, *first), |(lo, hi), &c| (lo.min(c), hi.max(c)));
    let (lo, hi) = (lo - IVec3::ONE, hi + IVec3::ONE);

    let air = from_fn(|&p: &IVec3| {
        FACES
            .iter()
            .map(|&d| p + d)
            .filter(|&q| q.cmpge(lo).all() && q.cmple(hi).all() && !solid.contains(&q))
            .collect()
    });
    let outside = shortest_paths(&air, lo);

    solid
        .iter()
        .flat_map(|&cube| FACES.iter().map(move |&d| cube + d))
        .filter(|side| outside.contains_key(side))
        .count()
}
