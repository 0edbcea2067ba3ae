use crate::grid::{Cell, GridSpace};
use std::collections::HashMap;

// Trace logging flag - set to true to enable debug output
const TRACE_PATHFINDING: bool = false;

/// Expansion order: north, east, south, west.
const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

struct SearchNode {
    cell: Cell,
    g: i32,
    f: i32,
    parent: Option<usize>,
}

/// Grid-constrained shortest path from `start` (exclusive) toward `goal`.
///
/// 4-directional A* with a Manhattan heuristic. The open set is scanned
/// linearly and ties on `f` keep the first-inserted node, so the search is
/// fully deterministic. An out-of-bounds goal is clamped to the nearest
/// in-grid cell before searching.
///
/// An unreachable goal is not an error: the result is the path to the
/// visited cell closest to the goal (smallest heuristic, then smallest
/// accumulated cost). The path is empty only when the start has no
/// reachable neighbor at all.
///
/// `max_steps > 0` truncates the returned path; `0` means unlimited.
pub fn find_path<F>(
    grid: &GridSpace,
    start: Cell,
    goal: Cell,
    is_blocked: F,
    max_steps: usize,
) -> Vec<Cell>
where
    F: Fn(Cell) -> bool,
{
    let goal = grid.clamp_inside(goal);
    if !grid.is_inside(start) || start == goal {
        return Vec::new();
    }

    if TRACE_PATHFINDING {
        println!(
            "[find_path] ({},{}) -> ({},{}), max_steps={}",
            start.x, start.y, goal.x, goal.y, max_steps
        );
    }

    let mut nodes = vec![SearchNode {
        cell: start,
        g: 0,
        f: start.manhattan_distance(&goal),
        parent: None,
    }];
    let mut open: Vec<usize> = vec![0];
    let mut best_g: HashMap<Cell, i32> = HashMap::new();
    best_g.insert(start, 0);

    // Closest visited node to the goal, for the partial-progress fallback.
    let mut fallback = 0usize;
    let mut fallback_h = start.manhattan_distance(&goal);

    while !open.is_empty() {
        let mut pick = 0;
        for i in 1..open.len() {
            if nodes[open[i]].f < nodes[open[pick]].f {
                pick = i;
            }
        }
        let current = open.remove(pick);
        let current_cell = nodes[current].cell;

        // Skip entries superseded by a cheaper path to the same cell.
        if let Some(&known) = best_g.get(&current_cell) {
            if nodes[current].g > known {
                continue;
            }
        }

        if current_cell == goal {
            return reconstruct(&nodes, current, max_steps);
        }

        for (dx, dy) in DIRECTIONS {
            let next = current_cell.offset(dx, dy);
            if !grid.is_inside(next) || is_blocked(next) {
                continue;
            }
            let g = nodes[current].g + 1;
            if let Some(&known) = best_g.get(&next) {
                if known <= g {
                    continue;
                }
            }
            best_g.insert(next, g);
            let h = next.manhattan_distance(&goal);
            nodes.push(SearchNode { cell: next, g, f: g + h, parent: Some(current) });
            open.push(nodes.len() - 1);

            if h < fallback_h || (h == fallback_h && g < nodes[fallback].g) {
                fallback = nodes.len() - 1;
                fallback_h = h;
            }
        }
    }

    if TRACE_PATHFINDING {
        let closest = nodes[fallback].cell;
        println!(
            "[find_path] goal unreachable, closest visited ({},{})",
            closest.x, closest.y
        );
    }

    reconstruct(&nodes, fallback, max_steps)
}

fn reconstruct(nodes: &[SearchNode], mut index: usize, max_steps: usize) -> Vec<Cell> {
    let mut path = Vec::new();
    while let Some(parent) = nodes[index].parent {
        path.push(nodes[index].cell);
        index = parent;
    }
    path.reverse();
    if max_steps > 0 && path.len() > max_steps {
        path.truncate(max_steps);
    }
    path
}

/// Format path for display
pub fn format_path(path: &[Cell]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    let mut result = String::new();
    for (i, cell) in path.iter().enumerate() {
        if i > 0 {
            result.push_str(" -> ");
        }
        result.push_str(&format!("({},{})", cell.x, cell.y));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid() -> GridSpace {
        GridSpace::new(10, 10, 40.0)
    }

    #[test]
    fn test_straight_path() {
        let grid = open_grid();
        let path = find_path(&grid, Cell::new(2, 2), Cell::new(6, 2), |_| false, 0);
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], Cell::new(3, 2));
        assert_eq!(path[3], Cell::new(6, 2));
    }

    #[test]
    fn test_one_step_truncation() {
        let grid = open_grid();
        let path = find_path(&grid, Cell::new(2, 2), Cell::new(6, 7), |_| false, 1);
        assert_eq!(path.len(), 1);
        assert!(path[0].is_adjacent(&Cell::new(2, 2)));
    }

    #[test]
    fn test_goal_clamped() {
        let grid = open_grid();
        let path = find_path(&grid, Cell::new(8, 5), Cell::new(30, 5), |_| false, 0);
        assert_eq!(path.last(), Some(&Cell::new(9, 5)));
    }

    #[test]
    fn test_detour_avoids_blocked_cells() {
        let grid = open_grid();
        // Vertical wall with a gap at the bottom.
        let blocked = |c: Cell| c.x == 5 && c.y < 8;
        let path = find_path(&grid, Cell::new(2, 4), Cell::new(8, 4), blocked, 0);
        assert_eq!(path.last(), Some(&Cell::new(8, 4)));
        assert!(path.iter().all(|c| !blocked(*c)));
    }

    #[test]
    fn test_unreachable_goal_returns_closest() {
        let grid = open_grid();
        // Box the goal in completely.
        let blocked = |c: Cell| {
            let dx = (c.x - 7).abs();
            let dy = (c.y - 7).abs();
            dx.max(dy) == 1
        };
        let path = find_path(&grid, Cell::new(1, 1), Cell::new(7, 7), blocked, 0);
        assert!(!path.is_empty());
        let closest = path.last().unwrap();
        // Best achievable is two cells away from the boxed goal.
        assert_eq!(closest.manhattan_distance(&Cell::new(7, 7)), 2);
        assert!(path.iter().all(|c| !blocked(*c)));
    }

    #[test]
    fn test_walled_in_start_returns_empty() {
        let grid = open_grid();
        let blocked = |c: Cell| c.manhattan_distance(&Cell::new(4, 4)) == 1;
        let path = find_path(&grid, Cell::new(4, 4), Cell::new(8, 8), blocked, 0);
        assert!(path.is_empty());
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = open_grid();
        let path = find_path(&grid, Cell::new(3, 3), Cell::new(3, 3), |_| false, 0);
        assert!(path.is_empty());
    }
}
