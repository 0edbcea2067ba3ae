use crate::centerline::Trail;
use crate::consume::ConsumptionSequencer;
use crate::grid::{Cell, GridSpace, WorldPoint};
use crate::occupancy::{ColorTag, OccupancyIndex};
use crate::pathfinding::find_path;
use crate::registry::SimContext;
use serde::{Deserialize, Serialize};

// Trace logging flag - set to true to enable debug output
const TRACE_SNAKE: bool = false;

/// Which body end is under active control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadEnd {
    Head,
    Tail,
}

impl LeadEnd {
    pub fn opposite(self) -> LeadEnd {
        match self {
            LeadEnd::Head => LeadEnd::Tail,
            LeadEnd::Tail => LeadEnd::Head,
        }
    }
}

/// Agent lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeState {
    Idle,
    Dragging,
    Reversing,
    Consuming,
    Dead,
}

/// Per-tick update result consumed by the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    /// The agent committed new body cells this tick.
    pub committed: bool,
    /// The agent entered Reversing this tick.
    pub reversed: bool,
    pub started_consuming: bool,
    pub finished_consuming: bool,
}

/// One multi-segment agent: committed body cells, continuous segment
/// positions derived from the lead trail, and the drag state machine.
pub struct SnakeAgent {
    id: usize,
    color: ColorTag,
    /// Speed in cells per second.
    speed: f32,
    state: SnakeState,
    /// Committed cells, head first. Never empty; consecutive cells are
    /// edge-adjacent and no cell repeats.
    body: Vec<Cell>,
    /// Continuous per-segment positions, head first.
    positions: Vec<WorldPoint>,
    lead_end: LeadEnd,
    lead_pos: WorldPoint,
    drag_target: Option<WorldPoint>,
    /// Cell currently being moved toward; None while at a cell center.
    step_target: Option<Cell>,
    trail: Trail,
    consume: Option<ConsumptionSequencer>,
}

impl SnakeAgent {
    /// Build from an explicit body layout. Invalid layouts (duplicate or
    /// non-adjacent cells) are discarded in favor of a straight line from
    /// the head cell.
    pub fn from_body(
        ctx: &SimContext,
        id: usize,
        color: ColorTag,
        speed: f32,
        body: Vec<Cell>,
    ) -> Self {
        let body = if layout_is_valid(&ctx.grid, &body) {
            body
        } else {
            let head = ctx
                .grid
                .clamp_inside(body.first().copied().unwrap_or(Cell::new(0, 0)));
            let length = body.len().max(1);
            eprintln!(
                "Warning: snake {} has an invalid body layout, using a straight line from ({},{})",
                id, head.x, head.y
            );
            straight_line_body(&ctx.grid, head, length)
        };
        Self::assemble(ctx, id, color, speed, body)
    }

    /// Build from a head cell and a length, laid out in a straight line.
    pub fn from_head(
        ctx: &SimContext,
        id: usize,
        color: ColorTag,
        speed: f32,
        head: Cell,
        length: usize,
    ) -> Self {
        let head = ctx.grid.clamp_inside(head);
        Self::assemble(ctx, id, color, speed, straight_line_body(&ctx.grid, head, length.max(1)))
    }

    fn assemble(ctx: &SimContext, id: usize, color: ColorTag, speed: f32, body: Vec<Cell>) -> Self {
        let mut trail = Trail::new(
            ctx.grid.cell_size,
            ctx.tuning.sample_fraction,
            ctx.tuning.centerline_subdiv,
        );
        trail.seed_from_cells(&ctx.grid, &body);
        let positions = body.iter().map(|c| ctx.grid.cell_to_world(*c)).collect();
        let lead_pos = ctx.grid.cell_to_world(body[0]);
        SnakeAgent {
            id,
            color,
            speed,
            state: SnakeState::Idle,
            body,
            positions,
            lead_end: LeadEnd::Head,
            lead_pos,
            drag_target: None,
            step_target: None,
            trail,
            consume: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn color(&self) -> ColorTag {
        self.color
    }

    pub fn state(&self) -> SnakeState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state != SnakeState::Dead
    }

    /// Committed cells, head first.
    pub fn body(&self) -> &[Cell] {
        &self.body
    }

    pub fn segment_count(&self) -> usize {
        self.body.len()
    }

    pub fn head_cell(&self) -> Cell {
        self.body[0]
    }

    pub fn tail_cell(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    /// Continuous per-segment positions, head first.
    pub fn positions(&self) -> &[WorldPoint] {
        &self.positions
    }

    pub fn lead_end(&self) -> LeadEnd {
        self.lead_end
    }

    pub fn consumption(&self) -> Option<&ConsumptionSequencer> {
        self.consume.as_ref()
    }

    /// Half-spacing interpolated positions for renderers that draw beads
    /// between segments. Empty unless the capability flag is set.
    pub fn sub_positions(&self, ctx: &SimContext) -> Vec<WorldPoint> {
        if !ctx.tuning.sub_segments || self.body.len() < 2 {
            return Vec::new();
        }
        let count = self.body.len() * 2 - 1;
        let points =
            self.trail
                .sample_positions(&ctx.grid, self.lead_pos, count, ctx.grid.cell_size * 0.5);
        oriented(points, self.lead_end)
    }

    /// Grab one end of an idle agent. Returns false otherwise.
    pub fn begin_drag(&mut self, ctx: &SimContext, end: LeadEnd) -> bool {
        if self.state != SnakeState::Idle {
            return false;
        }
        self.lead_end = end;
        self.reseed_trail(ctx);
        self.state = SnakeState::Dragging;
        self.drag_target = None;
        self.step_target = None;
        true
    }

    /// Per-tick pointer sample in world space.
    pub fn set_drag_target(&mut self, target: WorldPoint) {
        if matches!(self.state, SnakeState::Dragging | SnakeState::Reversing) {
            self.drag_target = Some(target);
        }
    }

    /// Release the drag: snap every segment to its nearest cell, rebuild
    /// the body from the snapped cells and return to Idle. This is the
    /// discretization checkpoint that stops fractional drift for good.
    pub fn end_drag(&mut self, ctx: &SimContext) {
        if !matches!(self.state, SnakeState::Dragging | SnakeState::Reversing) {
            return;
        }
        let snapped: Vec<Cell> = self
            .positions
            .iter()
            .map(|p| ctx.grid.world_to_cell(*p))
            .collect();
        if layout_is_valid(&ctx.grid, &snapped) {
            self.body = snapped;
        }
        self.positions = self.body.iter().map(|c| ctx.grid.cell_to_world(*c)).collect();
        self.reseed_trail(ctx);
        self.state = SnakeState::Idle;
        self.drag_target = None;
        self.step_target = None;
    }

    pub fn update(&mut self, ctx: &SimContext, occupancy: &OccupancyIndex, dt: f32) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        match self.state {
            SnakeState::Idle | SnakeState::Dead => {}
            SnakeState::Dragging => self.drag_tick(ctx, occupancy, dt, &mut outcome),
            SnakeState::Reversing => self.reverse_tick(ctx, occupancy, dt, &mut outcome),
            SnakeState::Consuming => {
                if let Some(seq) = self.consume.as_mut() {
                    if seq.advance(dt) {
                        self.state = SnakeState::Dead;
                        outcome.finished_consuming = true;
                    }
                }
            }
        }
        outcome
    }

    fn drag_tick(
        &mut self,
        ctx: &SimContext,
        occupancy: &OccupancyIndex,
        dt: f32,
        outcome: &mut TickOutcome,
    ) {
        let target_world = match self.drag_target {
            Some(target) => target,
            None => return,
        };
        if self.step_target.is_none() {
            let goal = ctx.grid.clamp_inside(ctx.grid.world_to_cell(target_world));
            let lead = self.lead_cell();
            if goal != lead {
                let id = self.id;
                let color = self.color;
                let path = find_path(
                    &ctx.grid,
                    lead,
                    goal,
                    |c| occupancy.is_blocked(c, id, color),
                    1,
                );
                if let Some(&next) = path.first() {
                    let cells = self.lead_cells();
                    if cells.len() >= 2 && next == cells[1] {
                        // Retreat along the own trail: the body slides
                        // backward, so the far end must have room to go.
                        if self.rear_can_extend(ctx, occupancy) {
                            self.step_target = Some(next);
                        }
                    } else if self.hits_own_body(next) {
                        if TRACE_SNAKE {
                            println!(
                                "[snake {}] step ({},{}) hits own body, reversing",
                                self.id, next.x, next.y
                            );
                        }
                        self.enter_reversing(ctx);
                        outcome.reversed = true;
                        return;
                    } else {
                        self.step_target = Some(next);
                    }
                }
            }
        }
        self.advance_lead(ctx, occupancy, dt, outcome);
    }

    fn reverse_tick(
        &mut self,
        ctx: &SimContext,
        occupancy: &OccupancyIndex,
        dt: f32,
        outcome: &mut TickOutcome,
    ) {
        if self.step_target.is_none() {
            match self.pick_reversal_step(ctx, occupancy) {
                Some(next) => self.step_target = Some(next),
                // Boxed in on every side: hold position this tick.
                None => return,
            }
        }
        self.advance_lead(ctx, occupancy, dt, outcome);
    }

    /// True when a one-step target lands on the agent's own body, excluding
    /// the cell adjacent to the lead (moving there is a legal retreat along
    /// the own trail).
    fn hits_own_body(&self, next: Cell) -> bool {
        let cells = self.lead_cells();
        cells.iter().skip(2).any(|c| *c == next)
    }

    /// A retreating body extends its far end straight along that end's
    /// facing once the trail history runs out. The cell it would extend
    /// into must be usable.
    fn rear_can_extend(&self, ctx: &SimContext, occupancy: &OccupancyIndex) -> bool {
        let cells = self.lead_cells();
        let n = cells.len();
        if n < 2 {
            return true;
        }
        let rear = cells[n - 1];
        let ext = Cell::new(
            rear.x + (rear.x - cells[n - 2].x),
            rear.y + (rear.y - cells[n - 2].y),
        );
        ctx.grid.is_inside(ext)
            && !occupancy.is_blocked(ext, self.id, self.color)
            && !cells.contains(&ext)
    }

    /// Candidate directions straight, left, right relative to the lead's
    /// outward facing; the first in-bounds, unblocked, not self-occupied
    /// cell wins.
    fn pick_reversal_step(&self, ctx: &SimContext, occupancy: &OccupancyIndex) -> Option<Cell> {
        let cells = self.lead_cells();
        let lead = cells[0];
        let facing = if cells.len() >= 2 {
            (lead.x - cells[1].x, lead.y - cells[1].y)
        } else {
            (0, -1)
        };
        let candidates = [
            facing,
            (facing.1, -facing.0),
            (-facing.1, facing.0),
        ];
        for (dx, dy) in candidates {
            let cell = lead.offset(dx, dy);
            if !ctx.grid.is_inside(cell) {
                continue;
            }
            if occupancy.is_blocked(cell, self.id, self.color) {
                continue;
            }
            if cells.contains(&cell) {
                continue;
            }
            return Some(cell);
        }
        None
    }

    fn enter_reversing(&mut self, ctx: &SimContext) {
        self.lead_end = self.lead_end.opposite();
        self.step_target = None;
        self.reseed_trail(ctx);
        self.state = SnakeState::Reversing;
    }

    /// Constant-speed lead advance plus trail upkeep; commits the body and
    /// checks the consumption trigger on arrival.
    fn advance_lead(
        &mut self,
        ctx: &SimContext,
        occupancy: &OccupancyIndex,
        dt: f32,
        outcome: &mut TickOutcome,
    ) {
        let step = match self.step_target {
            Some(step) => step,
            None => return,
        };
        let target = ctx.grid.cell_to_world(step);
        let travel = self.speed * ctx.grid.cell_size * dt;
        let dx = target.x - self.lead_pos.x;
        let dy = target.y - self.lead_pos.y;
        let dist = (dx * dx + dy * dy).sqrt();

        let arrived = dist <= travel || dist < f32::EPSILON;
        if arrived {
            self.lead_pos = target;
            self.step_target = None;
        } else {
            self.lead_pos = WorldPoint::new(
                self.lead_pos.x + dx / dist * travel,
                self.lead_pos.y + dy / dist * travel,
            );
        }

        self.trail.record(self.lead_pos);
        self.trail.prune(self.lead_pos, self.body.len());

        let lead_first = self
            .trail
            .body_positions(&ctx.grid, self.lead_pos, self.body.len());
        self.positions = oriented(lead_first.clone(), self.lead_end);

        if arrived {
            let cells: Vec<Cell> = lead_first
                .iter()
                .map(|p| ctx.grid.world_to_cell(*p))
                .collect();
            self.body = oriented(cells, self.lead_end);
            outcome.committed = true;
            if TRACE_SNAKE {
                let head = self.head_cell();
                println!("[snake {}] committed, head at ({},{})", self.id, head.x, head.y);
            }
            if self.check_consume_trigger(ctx, occupancy) {
                outcome.started_consuming = true;
            }
        }
    }

    /// Entering range of a color-matched hole starts the consumption
    /// sequence; it cannot be cancelled afterwards.
    fn check_consume_trigger(&mut self, ctx: &SimContext, occupancy: &OccupancyIndex) -> bool {
        let lead = self.lead_cell();
        if occupancy.matching_hole_near(lead, self.color).is_none() {
            return false;
        }
        self.consume = Some(ConsumptionSequencer::new(
            ctx.tuning.consume_interval,
            self.body.len(),
        ));
        self.state = SnakeState::Consuming;
        self.drag_target = None;
        self.step_target = None;
        true
    }

    fn lead_cell(&self) -> Cell {
        match self.lead_end {
            LeadEnd::Head => self.body[0],
            LeadEnd::Tail => self.body[self.body.len() - 1],
        }
    }

    /// Body cells reordered so the active lead comes first.
    fn lead_cells(&self) -> Vec<Cell> {
        oriented(self.body.clone(), self.lead_end)
    }

    fn reseed_trail(&mut self, ctx: &SimContext) {
        let cells = self.lead_cells();
        self.trail.seed_from_cells(&ctx.grid, &cells);
        self.lead_pos = ctx.grid.cell_to_world(cells[0]);
        self.positions = self.body.iter().map(|c| ctx.grid.cell_to_world(*c)).collect();
    }
}

fn oriented<T>(mut list: Vec<T>, end: LeadEnd) -> Vec<T> {
    if end == LeadEnd::Tail {
        list.reverse();
    }
    list
}

/// A configured layout is usable when every cell is in-bounds and unique
/// and consecutive cells share an edge.
pub fn layout_is_valid(grid: &GridSpace, body: &[Cell]) -> bool {
    if body.is_empty() {
        return false;
    }
    for (i, cell) in body.iter().enumerate() {
        if !grid.is_inside(*cell) {
            return false;
        }
        if body[..i].contains(cell) {
            return false;
        }
        if i > 0 && !body[i - 1].is_adjacent(cell) {
            return false;
        }
    }
    true
}

/// Straight-line fallback layout: the first of east, south, west, north
/// that fits in-bounds from the head cell.
pub fn straight_line_body(grid: &GridSpace, head: Cell, length: usize) -> Vec<Cell> {
    for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
        let cells: Vec<Cell> = (0..length as i32)
            .map(|i| head.offset(dx * i, dy * i))
            .collect();
        if cells.iter().all(|c| grid.is_inside(*c)) {
            return cells;
        }
    }
    vec![grid.clamp_inside(head)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MotionTuning;

    fn ctx() -> SimContext {
        SimContext {
            grid: GridSpace::new(8, 8, 40.0),
            tuning: MotionTuning::default(),
        }
    }

    fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
        list.iter().map(|(x, y)| Cell::new(*x, *y)).collect()
    }

    #[test]
    fn test_layout_validation() {
        let grid = GridSpace::new(8, 8, 40.0);
        assert!(layout_is_valid(&grid, &cells(&[(0, 0), (0, 1), (1, 1)])));
        assert!(!layout_is_valid(&grid, &cells(&[(0, 0), (1, 1)])));
        assert!(!layout_is_valid(&grid, &cells(&[(0, 0), (0, 1), (0, 0)])));
        assert!(!layout_is_valid(&grid, &cells(&[(0, 0), (0, -1)])));
        assert!(!layout_is_valid(&grid, &[]));
    }

    #[test]
    fn test_invalid_layout_falls_back_to_straight_line() {
        let ctx = ctx();
        let agent = SnakeAgent::from_body(
            &ctx,
            0,
            ColorTag::Red,
            8.0,
            cells(&[(2, 2), (5, 5), (2, 2)]),
        );
        assert_eq!(agent.body(), &cells(&[(2, 2), (3, 2), (4, 2)])[..]);
    }

    #[test]
    fn test_straight_line_avoids_leaving_grid() {
        let grid = GridSpace::new(8, 8, 40.0);
        // Head in the bottom-right corner: east and south do not fit.
        let body = straight_line_body(&grid, Cell::new(7, 7), 4);
        assert_eq!(body, cells(&[(7, 7), (6, 7), (5, 7), (4, 7)]));
    }

    #[test]
    fn test_from_head_layout() {
        let ctx = ctx();
        let agent = SnakeAgent::from_head(&ctx, 1, ColorTag::Blue, 8.0, Cell::new(1, 1), 3);
        assert_eq!(agent.segment_count(), 3);
        assert_eq!(agent.head_cell(), Cell::new(1, 1));
        assert_eq!(agent.tail_cell(), Cell::new(3, 1));
        assert_eq!(agent.state(), SnakeState::Idle);
    }

    #[test]
    fn test_begin_drag_only_when_idle() {
        let ctx = ctx();
        let mut agent = SnakeAgent::from_head(&ctx, 0, ColorTag::Red, 8.0, Cell::new(1, 1), 3);
        assert!(agent.begin_drag(&ctx, LeadEnd::Tail));
        assert_eq!(agent.state(), SnakeState::Dragging);
        assert!(!agent.begin_drag(&ctx, LeadEnd::Head));
        agent.end_drag(&ctx);
        assert_eq!(agent.state(), SnakeState::Idle);
        assert!(agent.begin_drag(&ctx, LeadEnd::Head));
    }

    #[test]
    fn test_hits_own_body_excludes_neighbor() {
        let ctx = ctx();
        let agent = SnakeAgent::from_body(
            &ctx,
            0,
            ColorTag::Red,
            8.0,
            cells(&[(0, 1), (0, 0), (1, 0), (1, 1), (2, 1)]),
        );
        // Neighbor body cell: retreat, not a self hit.
        assert!(!agent.hits_own_body(Cell::new(0, 0)));
        // Deeper body cell adjacent to the head: self hit.
        assert!(agent.hits_own_body(Cell::new(1, 1)));
        assert!(!agent.hits_own_body(Cell::new(5, 5)));
    }
}
