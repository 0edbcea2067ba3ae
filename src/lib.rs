pub mod centerline;
pub mod config;
pub mod consume;
pub mod event_log;
pub mod grid;
pub mod level;
pub mod occupancy;
pub mod pathfinding;
pub mod registry;
pub mod snake;

pub use grid::{Cell, GridSpace, WorldPoint};
pub use occupancy::{BlockerKind, BlockingEntity, ColorTag, OccupancyIndex};
pub use registry::{MotionTuning, SimContext, SnakeEvent, SnakeRegistry};
pub use snake::{LeadEnd, SnakeAgent, SnakeState};
