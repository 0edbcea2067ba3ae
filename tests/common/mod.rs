use snakegrid::level::LevelSpec;
use snakegrid::registry::{MotionTuning, SimContext};
use snakegrid::{Cell, SnakeRegistry};

pub const CELL_SIZE: f32 = 40.0;
pub const DT: f32 = 1.0 / 60.0;

/// Build a context and registry from an ASCII level layout.
///
/// Layout characters: `#` wall, digits holes (colored by digit), `*` item,
/// uppercase letter = snake head with its lowercase letters as body cells,
/// `.` free.
#[allow(dead_code)]
pub fn setup(layout: &str) -> (SimContext, SnakeRegistry) {
    let level = LevelSpec::parse_layout(layout, CELL_SIZE).expect("test layout should parse");
    let ctx = SimContext {
        grid: level.grid_space(),
        tuning: MotionTuning::default(),
    };
    let registry = SnakeRegistry::from_level(&ctx, &level);
    (ctx, registry)
}

/// Feed a pointer sample at a cell center and tick, `ticks` times.
#[allow(dead_code)]
pub fn drag_ticks(
    ctx: &SimContext,
    registry: &mut SnakeRegistry,
    id: usize,
    target: Cell,
    ticks: usize,
) {
    let point = ctx.grid.cell_to_world(target);
    for _ in 0..ticks {
        registry.drag_to(id, point);
        registry.tick(ctx, DT);
    }
}

/// Assert the body invariant: no duplicates, consecutive cells adjacent.
#[allow(dead_code)]
pub fn assert_valid_body(body: &[Cell]) {
    assert!(!body.is_empty(), "body must never be empty");
    for (i, cell) in body.iter().enumerate() {
        assert!(
            !body[..i].contains(cell),
            "duplicate body cell ({},{}) in {:?}",
            cell.x,
            cell.y,
            body
        );
        if i > 0 {
            assert_eq!(
                body[i - 1].manhattan_distance(cell),
                1,
                "non-adjacent cells in {:?}",
                body
            );
        }
    }
}

#[allow(dead_code)]
pub fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
    list.iter().map(|(x, y)| Cell::new(*x, *y)).collect()
}
