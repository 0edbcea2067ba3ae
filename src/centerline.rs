use crate::grid::{Cell, GridSpace, WorldPoint};

/// Segments shorter than this are treated as zero-length and skipped.
const MIN_SEGMENT: f32 = 1e-4;

/// Integer point on the centerline sub-lattice. One grid cell spans
/// `subdiv` sub-steps per axis; cell centers sit on multiples of `subdiv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubPoint {
    sx: i32,
    sy: i32,
}

/// Shared lead trajectory history and the centerline sampling built on it.
///
/// Only the lead end of a body is ever driven directly; every other
/// segment's continuous position is produced by resampling this trail at
/// fixed arclength offsets, which keeps inter-segment spacing exact and
/// prevents corner cutting.
#[derive(Debug, Clone)]
pub struct Trail {
    /// World-space samples of past lead positions, oldest first.
    samples: Vec<WorldPoint>,
    /// Arclength between neighboring body segments (one cell).
    spacing: f32,
    /// Minimum lead travel before a new sample is recorded.
    sample_step: f32,
    /// Sub-steps per cell on the centerline lattice.
    subdiv: i32,
}

impl Trail {
    pub fn new(spacing: f32, sample_fraction: f32, subdiv: i32) -> Self {
        Trail {
            samples: Vec::new(),
            spacing,
            sample_step: spacing * sample_fraction,
            subdiv: subdiv.max(1),
        }
    }

    /// Rebuild the history from committed cells, lead first. Used at
    /// construction, on lead swaps and at the drag-release checkpoint.
    pub fn seed_from_cells(&mut self, grid: &GridSpace, cells_lead_first: &[Cell]) {
        self.samples.clear();
        for cell in cells_lead_first.iter().skip(1).rev() {
            self.samples.push(grid.cell_to_world(*cell));
        }
    }

    /// Record the lead's new position.
    ///
    /// When the lead moves backward along its own trail, the newest samples
    /// are consumed instead of appended, so a drag-back gesture unwinds the
    /// history rather than folding it.
    pub fn record(&mut self, lead: WorldPoint) {
        while self.samples.len() >= 2 {
            let last = self.samples[self.samples.len() - 1];
            let prev = self.samples[self.samples.len() - 2];
            let trail_dx = last.x - prev.x;
            let trail_dy = last.y - prev.y;
            let lead_dx = lead.x - last.x;
            let lead_dy = lead.y - last.y;
            if trail_dx * lead_dx + trail_dy * lead_dy < 0.0 {
                self.samples.pop();
            } else {
                break;
            }
        }

        match self.samples.last() {
            Some(last) if last.distance(&lead) < self.sample_step => {}
            _ => self.samples.push(lead),
        }
    }

    /// Drop oldest samples beyond what a body of `segment_count` segments
    /// can ever sample: `(segment_count - 1) * spacing` plus two spacings
    /// of slack.
    pub fn prune(&mut self, lead: WorldPoint, segment_count: usize) {
        let needed = (segment_count.saturating_sub(1) as f32 + 2.0) * self.spacing;
        let mut length = 0.0;
        let mut keep = 0;
        let mut cursor = lead;
        for (i, sample) in self.samples.iter().rev().enumerate() {
            length += cursor.distance(sample);
            cursor = *sample;
            keep = i + 1;
            if length >= needed {
                break;
            }
        }
        let drop = self.samples.len() - keep;
        if drop > 0 {
            self.samples.drain(0..drop);
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Continuous positions for a whole body, lead first, spaced exactly
    /// one cell apart along the centerline.
    pub fn body_positions(
        &self,
        grid: &GridSpace,
        lead: WorldPoint,
        segment_count: usize,
    ) -> Vec<WorldPoint> {
        if segment_count <= 1 {
            return vec![lead];
        }
        self.sample_positions(grid, lead, segment_count, self.spacing)
    }

    /// Resample the centerline at an arbitrary spacing. Used for the
    /// optional sub-segment positions as well as the body itself.
    pub fn sample_positions(
        &self,
        grid: &GridSpace,
        lead: WorldPoint,
        count: usize,
        spacing: f32,
    ) -> Vec<WorldPoint> {
        let polyline = self.centerline(grid, lead);
        resample_polyline(&polyline, count, spacing)
    }

    /// Build the centerline polyline: the lead itself, then its snap onto
    /// the sub-lattice, then an axis-aligned walk back through the history.
    fn centerline(&self, grid: &GridSpace, lead: WorldPoint) -> Vec<WorldPoint> {
        let mut points = vec![lead];
        let mut current = self.snap_to_centerline(grid, lead);
        points.push(self.sub_to_world(grid, current));
        for sample in self.samples.iter().rev() {
            let target = self.snap_to_centerline(grid, *sample);
            self.walk(grid, &mut current, target, &mut points);
        }
        points
    }

    fn world_to_sub(&self, grid: &GridSpace, p: WorldPoint) -> (f32, f32) {
        let subdiv = self.subdiv as f32;
        (
            (p.x / grid.cell_size + (grid.cols as f32 - 1.0) * 0.5) * subdiv,
            (p.y / grid.cell_size + (grid.rows as f32 - 1.0) * 0.5) * subdiv,
        )
    }

    fn sub_to_world(&self, grid: &GridSpace, sp: SubPoint) -> WorldPoint {
        let subdiv = self.subdiv as f32;
        WorldPoint::new(
            (sp.sx as f32 / subdiv - (grid.cols as f32 - 1.0) * 0.5) * grid.cell_size,
            (sp.sy as f32 / subdiv - (grid.rows as f32 - 1.0) * 0.5) * grid.cell_size,
        )
    }

    /// Nearest sub-lattice point lying on an axis-aligned line through cell
    /// centers.
    fn snap_to_centerline(&self, grid: &GridSpace, p: WorldPoint) -> SubPoint {
        let (fx, fy) = self.world_to_sub(grid, p);
        let mut sx = fx.round() as i32;
        let mut sy = fy.round() as i32;
        if sx.rem_euclid(self.subdiv) != 0 && sy.rem_euclid(self.subdiv) != 0 {
            // Off every centerline: pull the axis closer to a cell-center
            // line onto it.
            let dx = distance_to_multiple(fx, self.subdiv);
            let dy = distance_to_multiple(fy, self.subdiv);
            if dx <= dy {
                sx = nearest_multiple(fx, self.subdiv);
            } else {
                sy = nearest_multiple(fy, self.subdiv);
            }
        }
        SubPoint { sx, sy }
    }

    /// Step from `current` to `target` one sub-step at a time, axis-aligned
    /// only, turning at cell-center lines. Appends every visited point.
    fn walk(
        &self,
        grid: &GridSpace,
        current: &mut SubPoint,
        target: SubPoint,
        out: &mut Vec<WorldPoint>,
    ) {
        let subdiv = self.subdiv;
        let span = (target.sx - current.sx).abs() + (target.sy - current.sy).abs();
        let limit = (span * 2 + 8 * subdiv) as usize;
        let mut steps = 0;

        while *current != target && steps < limit {
            steps += 1;
            let dx = target.sx - current.sx;
            let dy = target.sy - current.sy;
            let on_row = current.sy.rem_euclid(subdiv) == 0;
            let on_col = current.sx.rem_euclid(subdiv) == 0;

            if dx != 0 && on_row && (dy == 0 || !on_col || dx.abs() >= dy.abs()) {
                current.sx += dx.signum();
            } else if dy != 0 && on_col {
                current.sy += dy.signum();
            } else if dy != 0 {
                // Vertical travel needed but sitting between columns: reach
                // the nearest cell-center column first.
                current.sx += step_toward_multiple(current.sx, subdiv, dx);
            } else if dx != 0 {
                current.sy += step_toward_multiple(current.sy, subdiv, dy);
            } else {
                break;
            }
            out.push(self.sub_to_world(grid, *current));
        }
    }
}

fn nearest_multiple(value: f32, step: i32) -> i32 {
    ((value / step as f32).round() as i32) * step
}

fn distance_to_multiple(value: f32, step: i32) -> f32 {
    (value - nearest_multiple(value, step) as f32).abs()
}

/// One sub-step along an axis toward the nearest multiple of `step`,
/// preferring the side the remaining delta points to.
fn step_toward_multiple(value: i32, step: i32, prefer: i32) -> i32 {
    let rem = value.rem_euclid(step);
    if rem == 0 {
        0
    } else if prefer > 0 {
        1
    } else if prefer < 0 {
        -1
    } else if rem * 2 <= step {
        -1
    } else {
        1
    }
}

/// Resample a polyline at uniform arclength increments. The first output
/// point is the polyline start; zero-length segments are skipped. If the
/// polyline runs out before `count` points, the remainder is extrapolated
/// along the last segment direction (a retreating body extends its far end
/// this way).
pub fn resample_polyline(points: &[WorldPoint], count: usize, spacing: f32) -> Vec<WorldPoint> {
    let mut out = Vec::with_capacity(count);
    if count == 0 {
        return out;
    }
    let first = match points.first() {
        Some(p) => *p,
        None => return out,
    };
    out.push(first);

    let mut cursor = first;
    let mut index = 1usize;
    let mut dir = (0.0f32, 0.0f32);
    let mut remaining = spacing;

    while out.len() < count {
        if index < points.len() {
            let next = points[index];
            let dx = next.x - cursor.x;
            let dy = next.y - cursor.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < MIN_SEGMENT {
                index += 1;
                continue;
            }
            dir = (dx / dist, dy / dist);
            if dist >= remaining {
                cursor = WorldPoint::new(cursor.x + dir.0 * remaining, cursor.y + dir.1 * remaining);
                out.push(cursor);
                remaining = spacing;
            } else {
                cursor = next;
                index += 1;
                remaining -= dist;
            }
        } else {
            if dir == (0.0, 0.0) {
                // Degenerate single-point polyline.
                out.push(cursor);
            } else {
                cursor =
                    WorldPoint::new(cursor.x + dir.0 * remaining, cursor.y + dir.1 * remaining);
                out.push(cursor);
            }
            remaining = spacing;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridSpace {
        GridSpace::new(10, 10, 40.0)
    }

    fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
        list.iter().map(|(x, y)| Cell::new(*x, *y)).collect()
    }

    #[test]
    fn test_seeded_body_positions_sit_on_centers() {
        let grid = grid();
        let body = cells(&[(3, 3), (3, 4), (3, 5), (4, 5)]);
        let mut trail = Trail::new(grid.cell_size, 0.1, 4);
        trail.seed_from_cells(&grid, &body);

        let lead = grid.cell_to_world(body[0]);
        let positions = trail.body_positions(&grid, lead, body.len());
        assert_eq!(positions.len(), body.len());
        for (pos, cell) in positions.iter().zip(body.iter()) {
            let center = grid.cell_to_world(*cell);
            assert!(pos.distance(&center) < 1e-3, "expected {:?} near {:?}", pos, center);
        }
    }

    #[test]
    fn test_spacing_is_exact_mid_move() {
        let grid = grid();
        let body = cells(&[(2, 2), (2, 3), (2, 4), (2, 5), (2, 6)]);
        let mut trail = Trail::new(grid.cell_size, 0.1, 4);
        trail.seed_from_cells(&grid, &body);

        // Lead partway between (2,2) and (3,2).
        let from = grid.cell_to_world(body[0]);
        let lead = WorldPoint::new(from.x + 0.4 * grid.cell_size, from.y);
        trail.record(lead);
        let positions = trail.body_positions(&grid, lead, body.len());

        for pair in positions.windows(2) {
            let d = pair[0].distance(&pair[1]);
            assert!((d - grid.cell_size).abs() < 0.5, "spacing {} off", d);
        }
    }

    #[test]
    fn test_record_unwinds_on_retreat() {
        let grid = grid();
        let mut trail = Trail::new(grid.cell_size, 0.1, 4);
        let a = grid.cell_to_world(Cell::new(2, 2));
        let b = grid.cell_to_world(Cell::new(3, 2));
        let c = grid.cell_to_world(Cell::new(4, 2));
        trail.record(a);
        trail.record(b);
        trail.record(c);
        assert_eq!(trail.sample_count(), 3);

        // Move back past c toward b: c must be consumed.
        let retreat = WorldPoint::new(c.x - 0.6 * grid.cell_size, c.y);
        trail.record(retreat);
        assert!(trail.sample_count() <= 3);
        let newest = trail.samples[trail.sample_count() - 1];
        assert!(newest.x < c.x);
    }

    #[test]
    fn test_prune_keeps_enough_history() {
        let grid = grid();
        let mut trail = Trail::new(grid.cell_size, 0.1, 4);
        for x in 0..9 {
            trail.record(grid.cell_to_world(Cell::new(x, 5)));
        }
        let lead = grid.cell_to_world(Cell::new(8, 5));
        trail.prune(lead, 3);
        // (3 - 1 + 2) spacings = 4 cells of history suffice.
        assert!(trail.sample_count() <= 6);

        let positions = trail.body_positions(&grid, lead, 3);
        assert_eq!(positions.len(), 3);
        assert!(positions[2].distance(&grid.cell_to_world(Cell::new(6, 5))) < 1e-3);
    }

    #[test]
    fn test_centerline_never_moves_diagonally() {
        let grid = grid();
        let body = cells(&[(2, 2), (2, 3), (3, 3), (3, 4), (4, 4)]);
        let mut trail = Trail::new(grid.cell_size, 0.1, 4);
        trail.seed_from_cells(&grid, &body);
        let lead = grid.cell_to_world(body[0]);
        let polyline = trail.centerline(&grid, lead);
        for pair in polyline.windows(2) {
            let dx = (pair[1].x - pair[0].x).abs();
            let dy = (pair[1].y - pair[0].y).abs();
            assert!(
                dx < 1e-3 || dy < 1e-3,
                "diagonal centerline step {:?} -> {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_resample_skips_zero_length_segments() {
        let p = WorldPoint::new(0.0, 0.0);
        let q = WorldPoint::new(0.0, 0.0);
        let r = WorldPoint::new(100.0, 0.0);
        let out = resample_polyline(&[p, q, r], 3, 40.0);
        assert_eq!(out.len(), 3);
        assert!((out[1].x - 40.0).abs() < 1e-3);
        assert!((out[2].x - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_resample_extrapolates_when_short() {
        let p = WorldPoint::new(0.0, 0.0);
        let q = WorldPoint::new(50.0, 0.0);
        let out = resample_polyline(&[p, q], 4, 40.0);
        assert_eq!(out.len(), 4);
        assert!((out[3].x - 120.0).abs() < 1e-3);
        assert!(out[3].y.abs() < 1e-3);
    }
}
