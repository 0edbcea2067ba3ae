use crate::grid::{GridSpace, WorldPoint};
use crate::level::LevelSpec;
use crate::occupancy::{BlockingEntity, OccupancyIndex};
use crate::snake::{LeadEnd, SnakeAgent};

/// Motion tuning knobs, normally filled in from `[motion]` in config.toml.
#[derive(Debug, Clone, Copy)]
pub struct MotionTuning {
    /// Default agent speed in cells per second.
    pub cells_per_sec: f32,
    /// Fraction of one cell the lead must travel before a trail sample is
    /// recorded.
    pub sample_fraction: f32,
    /// Seconds spent consuming each body segment.
    pub consume_interval: f32,
    /// Sub-steps per cell on the centerline lattice.
    pub centerline_subdiv: i32,
    /// Capability flag: agents also expose half-spacing sub-segment
    /// positions for renderers that draw them.
    pub sub_segments: bool,
}

impl Default for MotionTuning {
    fn default() -> Self {
        MotionTuning {
            cells_per_sec: 16.0,
            sample_fraction: 0.1,
            consume_interval: 0.12,
            centerline_subdiv: 4,
            sub_segments: false,
        }
    }
}

/// Immutable simulation context, constructed once and passed by reference
/// to every component that needs it.
#[derive(Debug, Clone, Copy)]
pub struct SimContext {
    pub grid: GridSpace,
    pub tuning: MotionTuning,
}

/// Notifications raised by the registry for external controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeEvent {
    DragStarted { id: usize, end: LeadEnd },
    DragReleased { id: usize },
    Reversed { id: usize },
    ConsumeStarted { id: usize },
    /// The agent finished its consumption sequence and was removed.
    Consumed { id: usize },
}

/// Owns every agent and the occupancy index; drives one synchronous update
/// pass per external tick.
pub struct SnakeRegistry {
    agents: Vec<SnakeAgent>,
    occupancy: OccupancyIndex,
    events: Vec<SnakeEvent>,
    total_count: usize,
}

impl SnakeRegistry {
    pub fn new(blockers: Vec<BlockingEntity>) -> Self {
        SnakeRegistry {
            agents: Vec::new(),
            occupancy: OccupancyIndex::new(blockers),
            events: Vec::new(),
            total_count: 0,
        }
    }

    /// Build a registry from a level: blockers plus one agent per snake
    /// spec. Specs with neither a body nor a head cell are skipped with a
    /// warning.
    pub fn from_level(ctx: &SimContext, level: &LevelSpec) -> Self {
        let mut registry = SnakeRegistry::new(level.blockers.clone());
        for (index, spec) in level.snakes.iter().enumerate() {
            let id = spec.id.unwrap_or(index);
            let speed = spec.speed.unwrap_or(ctx.tuning.cells_per_sec);
            let agent = if !spec.body.is_empty() {
                SnakeAgent::from_body(ctx, id, spec.color, speed, spec.body.clone())
            } else if let Some(head) = spec.head {
                SnakeAgent::from_head(ctx, id, spec.color, speed, head, spec.length.unwrap_or(4))
            } else {
                eprintln!("Warning: snake spec {} has neither body nor head, skipping", index);
                continue;
            };
            registry.spawn(agent);
        }
        registry
    }

    pub fn spawn(&mut self, agent: SnakeAgent) {
        self.total_count += 1;
        self.occupancy.invalidate();
        self.agents.push(agent);
    }

    pub fn agents(&self) -> &[SnakeAgent] {
        &self.agents
    }

    pub fn agent(&self, id: usize) -> Option<&SnakeAgent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    /// Agents still present (everything not yet fully consumed).
    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    /// Agents ever spawned into this registry.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn invalidate_occupancy(&mut self) {
        self.occupancy.invalidate();
    }

    /// Grab one end of an idle agent.
    pub fn begin_drag(&mut self, ctx: &SimContext, id: usize, end: LeadEnd) -> bool {
        let started = match self.agents.iter_mut().find(|a| a.id() == id) {
            Some(agent) => agent.begin_drag(ctx, end),
            None => false,
        };
        if started {
            self.events.push(SnakeEvent::DragStarted { id, end });
        }
        started
    }

    /// Forward the per-tick pointer sample to a dragged agent.
    pub fn drag_to(&mut self, id: usize, target: WorldPoint) {
        if let Some(agent) = self.agents.iter_mut().find(|a| a.id() == id) {
            agent.set_drag_target(target);
        }
    }

    pub fn end_drag(&mut self, ctx: &SimContext, id: usize) {
        if let Some(agent) = self.agents.iter_mut().find(|a| a.id() == id) {
            let was_dragging = matches!(
                agent.state(),
                crate::snake::SnakeState::Dragging | crate::snake::SnakeState::Reversing
            );
            agent.end_drag(ctx);
            if was_dragging {
                self.occupancy.invalidate();
                self.events.push(SnakeEvent::DragReleased { id });
            }
        }
    }

    /// One synchronous pass over all agents, in creation order. The
    /// occupancy snapshot is rebuilt whenever a previous agent's commit
    /// invalidated it, so a cell claimed earlier in the tick blocks later
    /// agents deterministically.
    pub fn tick(&mut self, ctx: &SimContext, dt: f32) {
        for i in 0..self.agents.len() {
            if !self.occupancy.is_fresh() {
                self.occupancy.rebuild(&self.agents);
            }
            let outcome = {
                let occupancy = &self.occupancy;
                let agent = &mut self.agents[i];
                agent.update(ctx, occupancy, dt)
            };
            let id = self.agents[i].id();
            if outcome.committed {
                self.occupancy.invalidate();
            }
            if outcome.reversed {
                self.events.push(SnakeEvent::Reversed { id });
            }
            if outcome.started_consuming {
                self.events.push(SnakeEvent::ConsumeStarted { id });
            }
            if outcome.finished_consuming {
                self.events.push(SnakeEvent::Consumed { id });
            }
        }

        let before = self.agents.len();
        self.agents.retain(|a| a.is_alive());
        if self.agents.len() != before {
            self.occupancy.invalidate();
        }
    }

    /// Take all notifications raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<SnakeEvent> {
        std::mem::take(&mut self.events)
    }
}
