use snakegrid::pathfinding::{find_path, format_path};
use snakegrid::{Cell, GridSpace};
use std::collections::HashSet;

/// Parse a map: `#` blocked, `S` start, `D` destination, `.` free.
fn parse_map(text: &str) -> (GridSpace, HashSet<Cell>, Cell, Cell) {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let cols = lines[0].chars().count() as i32;
    let rows = lines.len() as i32;

    let mut blocked = HashSet::new();
    let mut start = Cell::new(0, 0);
    let mut dest = Cell::new(0, 0);
    for (y, line) in lines.iter().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            let cell = Cell::new(x as i32, y as i32);
            match ch {
                '#' => {
                    blocked.insert(cell);
                }
                'S' => start = cell,
                'D' => dest = cell,
                _ => {}
            }
        }
    }
    (GridSpace::new(cols, rows, 40.0), blocked, start, dest)
}

/// Visualize a path on the map for failure output.
fn visualize(grid: &GridSpace, blocked: &HashSet<Cell>, path: &[Cell], start: Cell, dest: Cell) -> String {
    let mut result = format!("\nPath: {}\n", format_path(path));
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            let cell = Cell::new(x, y);
            let symbol = if cell == start {
                'S'
            } else if cell == dest {
                'D'
            } else if path.contains(&cell) {
                '*'
            } else if blocked.contains(&cell) {
                '#'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }
    result
}

#[test]
fn test_straight_corridor() {
    let (grid, blocked, start, dest) = parse_map(
        "\
..........
.S......D.
..........",
    );
    let path = find_path(&grid, start, dest, |c| blocked.contains(&c), 0);
    println!("{}", visualize(&grid, &blocked, &path, start, dest));

    assert_eq!(path.len(), 7);
    assert_eq!(path.last(), Some(&dest));
    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan_distance(&pair[1]), 1);
    }
}

#[test]
fn test_detour_around_wall() {
    let (grid, blocked, start, dest) = parse_map(
        "\
..........
..S..#..D.
.....#....
.....#....
..........",
    );
    let path = find_path(&grid, start, dest, |c| blocked.contains(&c), 0);
    println!("{}", visualize(&grid, &blocked, &path, start, dest));

    assert_eq!(path.last(), Some(&dest));
    assert!(path.iter().all(|c| !blocked.contains(c)));
    // The wall forces a detour longer than the Manhattan distance.
    assert!(path.len() as i32 > start.manhattan_distance(&dest));
}

#[test]
fn test_sealed_box_gets_closest() {
    let (grid, blocked, start, dest) = parse_map(
        "\
..........
..#####...
..#.S.#...
..#...#...
..#####...
....D.....",
    );
    let path = find_path(&grid, start, dest, |c| blocked.contains(&c), 0);
    println!("{}", visualize(&grid, &blocked, &path, start, dest));

    // Goal unreachable: the planner still gets as close as it can inside
    // the box.
    assert!(!path.is_empty());
    let closest = *path.last().unwrap();
    assert!(blocked.iter().all(|b| *b != closest));
    let best_possible = Cell::new(4, 3);
    assert!(closest.manhattan_distance(&dest) <= best_possible.manhattan_distance(&dest) + 1);
}

#[test]
fn test_path_never_contains_walls() {
    let (grid, blocked, start, dest) = parse_map(
        "\
S.#....#..
..#.##.#..
..#.##.#..
....##...D",
    );
    for max_steps in [0, 1, 2, 5] {
        let path = find_path(&grid, start, dest, |c| blocked.contains(&c), max_steps);
        assert!(path.iter().all(|c| !blocked.contains(c)));
        if max_steps > 0 {
            assert!(path.len() <= max_steps);
        }
    }
}

#[test]
fn test_one_step_consumer() {
    let (grid, blocked, start, dest) = parse_map(
        "\
S.........
.........D",
    );
    let path = find_path(&grid, start, dest, |c| blocked.contains(&c), 1);
    assert_eq!(path.len(), 1);
    assert!(path[0].is_adjacent(&start));
}
