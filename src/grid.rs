use serde::{Deserialize, Serialize};

/// A discrete grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Cell {
        Cell::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan_distance(&self, other: &Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// True when the two cells share an edge.
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// A continuous position in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
}

impl WorldPoint {
    pub fn new(x: f32, y: f32) -> Self {
        WorldPoint { x, y }
    }

    pub fn distance_squared(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &WorldPoint) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Grid geometry: dimensions, cell size and the centered coordinate system.
///
/// The world origin sits at the center of the grid, so cell (0,0) maps to a
/// negative world offset unless the grid is a single cell.
#[derive(Debug, Clone, Copy)]
pub struct GridSpace {
    pub cols: i32,
    pub rows: i32,
    pub cell_size: f32,
}

impl GridSpace {
    pub fn new(cols: i32, rows: i32, cell_size: f32) -> Self {
        GridSpace { cols, rows, cell_size }
    }

    pub fn is_valid(&self) -> bool {
        self.cols > 0 && self.rows > 0
    }

    pub fn is_inside(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.cols && cell.y >= 0 && cell.y < self.rows
    }

    /// Clamp a possibly out-of-bounds cell to the nearest in-grid cell.
    pub fn clamp_inside(&self, cell: Cell) -> Cell {
        Cell::new(
            cell.x.max(0).min(self.cols - 1),
            cell.y.max(0).min(self.rows - 1),
        )
    }

    /// World-space center of a cell.
    pub fn cell_to_world(&self, cell: Cell) -> WorldPoint {
        WorldPoint::new(
            (cell.x as f32 - (self.cols as f32 - 1.0) * 0.5) * self.cell_size,
            (cell.y as f32 - (self.rows as f32 - 1.0) * 0.5) * self.cell_size,
        )
    }

    /// Cell whose center is nearest to a world-space point.
    pub fn world_to_cell(&self, point: WorldPoint) -> Cell {
        Cell::new(
            (point.x / self.cell_size + (self.cols as f32 - 1.0) * 0.5).round() as i32,
            (point.y / self.cell_size + (self.rows as f32 - 1.0) * 0.5).round() as i32,
        )
    }

    /// Total world-space width of the grid.
    pub fn world_width(&self) -> f32 {
        self.cols as f32 * self.cell_size
    }

    /// Total world-space height of the grid.
    pub fn world_height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }
}
