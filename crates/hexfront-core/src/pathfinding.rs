//! A* pathfinding on hex grids.
//!
//! Movement is uniform-cost (1 per hex step) and bounded by a per-action
//! movement budget. Occupancy and terrain restrictions are supplied by the
//! caller as a side-effect-free blocking predicate, which keeps the search
//! free of any dependency on game state.

use crate::hex::{CubeCoord, OffsetCoord};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// Bounds and budget for one pathfinding request.
#[derive(Clone, Copy, Debug)]
pub struct PathQuery {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Maximum number of hex steps the path may take.
    pub budget: u32,
}

/// Node in the A* priority queue.
#[derive(Clone, Eq, PartialEq)]
struct PathNode {
    coord: CubeCoord,
    g_cost: u32, // Steps from start
    f_cost: u32, // g_cost + heuristic
    seq: u32,    // Insertion order, breaks ties deterministically
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (lowest f_cost first); equal-cost nodes
        // pop in insertion order so neighbor enumeration decides ties
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the shortest path from `start` to `goal` within the movement budget.
///
/// Returns the full path including both endpoints, or `None` when the goal is
/// unreachable in budget. The goal tile itself is exempt from the blocking
/// predicate: a destination may be in the process of being vacated by combat
/// within the same action, and the caller re-validates occupancy before
/// committing the move.
pub fn find_path<F>(
    query: &PathQuery,
    start: OffsetCoord,
    goal: OffsetCoord,
    is_blocked: F,
) -> Option<Vec<OffsetCoord>>
where
    F: Fn(OffsetCoord) -> bool,
{
    if start == goal {
        return Some(vec![start]);
    }
    if !start.in_bounds(query.width, query.height) || !goal.in_bounds(query.width, query.height) {
        return None;
    }

    let start_cube = start.to_cube();
    let goal_cube = goal.to_cube();

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<CubeCoord, CubeCoord> = HashMap::new();
    let mut g_scores: HashMap<CubeCoord, u32> = HashMap::new();
    let mut seq = 0u32;

    g_scores.insert(start_cube, 0);
    open_set.push(PathNode {
        coord: start_cube,
        g_cost: 0,
        f_cost: start_cube.distance(&goal_cube),
        seq,
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal_cube {
            return Some(reconstruct_path(&came_from, goal_cube, start_cube));
        }

        // Skip entries made stale by a better path found later
        if current.g_cost > *g_scores.get(&current.coord).unwrap_or(&u32::MAX) {
            continue;
        }

        for neighbor in current.coord.neighbors() {
            let offset = neighbor.to_offset();
            if !offset.in_bounds(query.width, query.height) {
                continue;
            }
            if offset != goal && is_blocked(offset) {
                continue;
            }

            let tentative_g = current.g_cost + 1;
            if tentative_g > query.budget {
                continue;
            }
            if tentative_g >= *g_scores.get(&neighbor).unwrap_or(&u32::MAX) {
                continue;
            }

            came_from.insert(neighbor, current.coord);
            g_scores.insert(neighbor, tentative_g);

            seq += 1;
            open_set.push(PathNode {
                coord: neighbor,
                g_cost: tentative_g,
                f_cost: tentative_g + neighbor.distance(&goal_cube),
                seq,
            });
        }
    }

    None // No path within budget
}

/// Find all tiles reachable from `start` within the movement budget.
///
/// Returns `(coordinate, step cost)` pairs sorted by cost then row-major
/// position, so identical inputs always produce identical output. Used for
/// client move-range display; unlike [`find_path`] no tile is exempt from
/// the blocking predicate.
pub fn reachable_within<F>(
    query: &PathQuery,
    start: OffsetCoord,
    is_blocked: F,
) -> Vec<(OffsetCoord, u32)>
where
    F: Fn(OffsetCoord) -> bool,
{
    let mut costs: HashMap<CubeCoord, u32> = HashMap::new();
    let mut frontier = VecDeque::new();

    costs.insert(start.to_cube(), 0);
    frontier.push_back(start.to_cube());

    // Uniform edge cost makes plain breadth-first search exact here
    while let Some(current) = frontier.pop_front() {
        let cost = costs[&current];
        if cost == query.budget {
            continue;
        }
        for neighbor in current.neighbors() {
            let offset = neighbor.to_offset();
            if !offset.in_bounds(query.width, query.height) || is_blocked(offset) {
                continue;
            }
            if costs.contains_key(&neighbor) {
                continue;
            }
            costs.insert(neighbor, cost + 1);
            frontier.push_back(neighbor);
        }
    }

    let mut reachable: Vec<(OffsetCoord, u32)> =
        costs.into_iter().map(|(c, cost)| (c.to_offset(), cost)).collect();
    reachable.sort_by_key(|(coord, cost)| (*cost, *coord));
    reachable
}

/// Reconstruct the path from the came_from map.
fn reconstruct_path(
    came_from: &HashMap<CubeCoord, CubeCoord>,
    goal: CubeCoord,
    start: CubeCoord,
) -> Vec<OffsetCoord> {
    let mut path = vec![goal.to_offset()];
    let mut current = goal;

    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev.to_offset());
                current = prev;
            }
            None => break,
        }
    }

    path.reverse();
    path
}
