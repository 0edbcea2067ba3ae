use crate::grid::{Cell, GridSpace};
use crate::occupancy::{BlockerKind, BlockingEntity, ColorTag};
use serde::{Deserialize, Serialize};
use std::fs;

/// Grid dimensions as stored in a level file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridSpec {
    pub cols: i32,
    pub rows: i32,
    pub cell_size: f32,
}

/// One snake as configured by a level: either an explicit body cell list
/// or a head cell plus a length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnakeSpec {
    #[serde(default)]
    pub id: Option<usize>,
    pub color: ColorTag,
    #[serde(default)]
    pub body: Vec<Cell>,
    #[serde(default)]
    pub head: Option<Cell>,
    #[serde(default)]
    pub length: Option<usize>,
    /// Cells per second; None uses the configured default.
    #[serde(default)]
    pub speed: Option<f32>,
}

/// Complete level configuration: grid, snakes and static blockers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpec {
    pub grid: GridSpec,
    pub snakes: Vec<SnakeSpec>,
    #[serde(default)]
    pub blockers: Vec<BlockingEntity>,
}

impl LevelSpec {
    pub fn grid_space(&self) -> GridSpace {
        GridSpace::new(self.grid.cols, self.grid.rows, self.grid.cell_size)
    }

    /// Load from a JSON level file.
    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read level file: {}", e))?;

        let level: LevelSpec = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to parse level file: {}", e))?;

        if !level.grid_space().is_valid() {
            return Err(format!(
                "Level grid {}x{} is not valid",
                level.grid.cols, level.grid.rows
            ));
        }

        Ok(level)
    }

    /// Save to a JSON level file.
    pub fn save_to_file(&self, path: &str) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize level: {}", e))?;

        fs::write(path, json).map_err(|e| format!("Failed to write level file: {}", e))?;

        Ok(())
    }

    /// Parse an ASCII level layout.
    ///
    /// Characters:
    /// - `#` or `■`: wall
    /// - `0`-`9`: hole, colored by digit
    /// - `*`: item
    /// - `A`-`Z`: snake head; the matching lowercase letters are its body,
    ///   chained by adjacency from the head. Snake color follows the letter.
    /// - `.`, `□`, space: free cell
    pub fn parse_layout(text: &str, cell_size: f32) -> Result<Self, String> {
        let lines: Vec<&str> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return Err("No non-empty lines found in layout".into());
        }

        let cols = lines[0].chars().count() as i32;
        let rows = lines.len() as i32;

        let mut blockers = Vec::new();
        let mut heads: Vec<(char, Cell)> = Vec::new();
        let mut segments: Vec<(char, Cell)> = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            if line.chars().count() as i32 != cols {
                return Err(format!("Layout line {} has inconsistent width", y));
            }
            for (x, ch) in line.chars().enumerate() {
                let cell = Cell::new(x as i32, y as i32);
                match ch {
                    '#' | '■' => blockers.push(BlockingEntity::wall(cell)),
                    '*' => blockers.push(BlockingEntity::item(cell)),
                    '.' | '□' | ' ' => {}
                    d if d.is_ascii_digit() => {
                        let color = ColorTag::from_index(d.to_digit(10).unwrap_or(0) as usize);
                        blockers.push(BlockingEntity::hole(cell, color));
                    }
                    u if u.is_ascii_uppercase() => heads.push((u, cell)),
                    l if l.is_ascii_lowercase() => {
                        segments.push((l.to_ascii_uppercase(), cell))
                    }
                    other => return Err(format!("Unknown layout character '{}'", other)),
                }
            }
        }

        let mut snakes = Vec::new();
        heads.sort_by_key(|(letter, _)| *letter);
        for (letter, head) in heads {
            let mut remaining: Vec<Cell> = segments
                .iter()
                .filter(|(l, _)| *l == letter)
                .map(|(_, c)| *c)
                .collect();
            let mut body = vec![head];

            // Chain body cells by adjacency, preferring N, E, S, W.
            while !remaining.is_empty() {
                let current = body[body.len() - 1];
                let next = [(0, -1), (1, 0), (0, 1), (-1, 0)]
                    .iter()
                    .map(|(dx, dy)| current.offset(*dx, *dy))
                    .find(|probe| remaining.contains(probe));
                match next {
                    Some(cell) => {
                        remaining.retain(|c| *c != cell);
                        body.push(cell);
                    }
                    None => {
                        return Err(format!(
                            "Snake '{}' body is not a single adjacent chain",
                            letter
                        ))
                    }
                }
            }

            let color = ColorTag::from_index((letter as u8 - b'A') as usize);
            snakes.push(SnakeSpec {
                id: None,
                color,
                body,
                head: None,
                length: None,
                speed: None,
            });
        }

        Ok(LevelSpec {
            grid: GridSpec { cols, rows, cell_size },
            snakes,
            blockers,
        })
    }

    /// Render the level back to its ASCII layout form.
    pub fn to_layout(&self) -> String {
        let cols = self.grid.cols.max(0) as usize;
        let rows = self.grid.rows.max(0) as usize;
        let mut chars = vec![vec!['.'; cols]; rows];

        let mut put = |cell: Cell, ch: char| {
            if cell.x >= 0 && (cell.x as usize) < cols && cell.y >= 0 && (cell.y as usize) < rows
            {
                chars[cell.y as usize][cell.x as usize] = ch;
            }
        };

        for blocker in &self.blockers {
            let ch = match blocker.kind {
                BlockerKind::Wall => '#',
                BlockerKind::Item => '*',
                BlockerKind::Hole => {
                    let index = blocker.color.map(|c| c.index()).unwrap_or(0);
                    char::from_digit(index as u32 % 10, 10).unwrap_or('0')
                }
            };
            put(blocker.cell, ch);
        }

        for (i, snake) in self.snakes.iter().enumerate() {
            let letter = (b'A' + (i as u8 % 26)) as char;
            for (k, cell) in snake.body.iter().enumerate() {
                let ch = if k == 0 { letter } else { letter.to_ascii_lowercase() };
                put(*cell, ch);
            }
        }

        let mut result = String::new();
        for row in chars {
            result.extend(row);
            result.push('\n');
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_layout() {
        let layout = "\
......\n\
.Aaa..\n\
....#.\n\
.2....\n";
        let level = LevelSpec::parse_layout(layout, 40.0).expect("layout should parse");
        assert_eq!(level.grid.cols, 6);
        assert_eq!(level.grid.rows, 4);
        assert_eq!(level.snakes.len(), 1);
        assert_eq!(
            level.snakes[0].body,
            vec![Cell::new(1, 1), Cell::new(2, 1), Cell::new(3, 1)]
        );
        assert_eq!(level.snakes[0].color, ColorTag::Red);
        assert_eq!(level.blockers.len(), 2);

        let hole = level
            .blockers
            .iter()
            .find(|b| b.kind == BlockerKind::Hole)
            .expect("hole expected");
        assert_eq!(hole.cell, Cell::new(1, 3));
        assert_eq!(hole.color, Some(ColorTag::Yellow));
    }

    #[test]
    fn test_parse_bent_body() {
        let layout = "\
.B....\n\
.b....\n\
.bb...\n";
        let level = LevelSpec::parse_layout(layout, 40.0).expect("layout should parse");
        assert_eq!(
            level.snakes[0].body,
            vec![
                Cell::new(1, 0),
                Cell::new(1, 1),
                Cell::new(1, 2),
                Cell::new(2, 2)
            ]
        );
        assert_eq!(level.snakes[0].color, ColorTag::Orange);
    }

    #[test]
    fn test_parse_rejects_broken_chain() {
        let layout = "\
.Aa.a.\n\
......\n";
        assert!(LevelSpec::parse_layout(layout, 40.0).is_err());
    }

    #[test]
    fn test_layout_roundtrip() {
        let layout = "\
......\n\
.Aaa..\n\
....#.\n\
.2..*.\n";
        let level = LevelSpec::parse_layout(layout, 40.0).expect("layout should parse");
        let reparsed =
            LevelSpec::parse_layout(&level.to_layout(), 40.0).expect("round trip should parse");
        assert_eq!(reparsed.snakes[0].body, level.snakes[0].body);
        assert_eq!(reparsed.blockers.len(), level.blockers.len());
    }
}
