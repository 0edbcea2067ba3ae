use arboard::Clipboard;
use macroquad::prelude::*;
use snakegrid::config::Config;
use snakegrid::event_log::EventLog;
use snakegrid::level::LevelSpec;
use snakegrid::occupancy::{BlockerKind, BlockingEntity};
use snakegrid::snake::{LeadEnd, SnakeAgent, SnakeState};
use snakegrid::{ColorTag, SimContext, SnakeRegistry, WorldPoint};

/// Built-in level used when the configured level file is missing.
const DEFAULT_LAYOUT: &str = "\
############\n\
#..........#\n\
#.Aaaa.....#\n\
#..........#\n\
#....##....#\n\
#.bbB.#..1.#\n\
#..........#\n\
#..0.......#\n\
#......cccC#\n\
#..2.......#\n\
############\n";

struct GameState {
    ctx: SimContext,
    registry: SnakeRegistry,
    log: EventLog,
    /// Id of the agent currently being dragged.
    drag: Option<usize>,
    background: Color,
    show_grid_lines: bool,
}

impl GameState {
    fn new(config: &Config) -> Self {
        let level = match LevelSpec::load_from_file(&config.level.path) {
            Ok(level) => {
                println!("Loaded level from {}", config.level.path);
                level
            }
            Err(e) => {
                println!("{}; using built-in level", e);
                LevelSpec::parse_layout(DEFAULT_LAYOUT, config.grid.cell_size)
                    .expect("built-in level layout is valid")
            }
        };

        let ctx = SimContext {
            grid: level.grid_space(),
            tuning: config.tuning(),
        };
        let registry = SnakeRegistry::from_level(&ctx, &level);

        GameState {
            ctx,
            registry,
            log: EventLog::new(),
            drag: None,
            background: Color::from_rgba(
                config.visual.background_r,
                config.visual.background_g,
                config.visual.background_b,
                255,
            ),
            show_grid_lines: config.visual.show_grid_lines,
        }
    }

    /// World origin is the grid center; the screen just recenters it.
    fn world_to_screen(&self, p: WorldPoint) -> Vec2 {
        vec2(
            p.x + screen_width() * 0.5,
            p.y + screen_height() * 0.5,
        )
    }

    fn screen_to_world(&self, x: f32, y: f32) -> WorldPoint {
        WorldPoint::new(x - screen_width() * 0.5, y - screen_height() * 0.5)
    }

    /// Drag-begin gesture: grab the nearest head or tail segment under the
    /// pointer, if any.
    fn handle_press(&mut self, mouse_x: f32, mouse_y: f32) {
        let pointer = self.screen_to_world(mouse_x, mouse_y);
        let grab_radius = self.ctx.grid.cell_size * 0.6;

        let mut best: Option<(usize, LeadEnd, f32)> = None;
        for agent in self.registry.agents() {
            if agent.state() != SnakeState::Idle {
                continue;
            }
            let positions = agent.positions();
            let ends = [
                (LeadEnd::Head, positions[0]),
                (LeadEnd::Tail, positions[positions.len() - 1]),
            ];
            for (end, pos) in ends {
                let dist = pos.distance(&pointer);
                if dist <= grab_radius && best.map(|(_, _, d)| dist < d).unwrap_or(true) {
                    best = Some((agent.id(), end, dist));
                }
            }
        }

        if let Some((id, end, _)) = best {
            if self.registry.begin_drag(&self.ctx, id, end) {
                self.drag = Some(id);
            }
        }
    }

    fn update(&mut self) {
        if is_mouse_button_pressed(MouseButton::Left) {
            let (mx, my) = mouse_position();
            self.handle_press(mx, my);
        }

        if let Some(id) = self.drag {
            if is_mouse_button_down(MouseButton::Left) {
                let (mx, my) = mouse_position();
                let pointer = self.screen_to_world(mx, my);
                self.registry.drag_to(id, pointer);
            } else {
                self.registry.end_drag(&self.ctx, id);
                self.drag = None;
            }
        }

        self.registry.tick(&self.ctx, get_frame_time());

        for event in self.registry.drain_events() {
            self.log.record_sim(&event);
        }
    }

    /// Rebuild a level spec from the current world, for clipboard export.
    fn current_level(&self) -> LevelSpec {
        let mut level = LevelSpec {
            grid: snakegrid::level::GridSpec {
                cols: self.ctx.grid.cols,
                rows: self.ctx.grid.rows,
                cell_size: self.ctx.grid.cell_size,
            },
            snakes: Vec::new(),
            blockers: self.registry.occupancy().blockers().to_vec(),
        };
        for agent in self.registry.agents() {
            level.snakes.push(snakegrid::level::SnakeSpec {
                id: Some(agent.id()),
                color: agent.color(),
                body: agent.body().to_vec(),
                head: None,
                length: None,
                speed: None,
            });
        }
        level
    }

    fn copy_to_clipboard(&self) {
        let layout = self.current_level().to_layout();
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(&layout) {
                    println!("Failed to copy to clipboard: {}", e);
                } else {
                    println!("Level layout copied to clipboard!");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => {
                println!("Failed to access clipboard: {}", e);
            }
        }
    }

    fn draw(&self) {
        clear_background(self.background);
        let cell = self.ctx.grid.cell_size;

        if self.show_grid_lines {
            let line = Color::from_rgba(50, 52, 60, 255);
            for x in 0..=self.ctx.grid.cols {
                let wx = (x as f32 - self.ctx.grid.cols as f32 * 0.5) * cell;
                let top = self.world_to_screen(WorldPoint::new(wx, -self.ctx.grid.world_height() * 0.5));
                let bottom = self.world_to_screen(WorldPoint::new(wx, self.ctx.grid.world_height() * 0.5));
                draw_line(top.x, top.y, bottom.x, bottom.y, 1.0, line);
            }
            for y in 0..=self.ctx.grid.rows {
                let wy = (y as f32 - self.ctx.grid.rows as f32 * 0.5) * cell;
                let left = self.world_to_screen(WorldPoint::new(-self.ctx.grid.world_width() * 0.5, wy));
                let right = self.world_to_screen(WorldPoint::new(self.ctx.grid.world_width() * 0.5, wy));
                draw_line(left.x, left.y, right.x, right.y, 1.0, line);
            }
        }

        for blocker in self.registry.occupancy().blockers() {
            self.draw_blocker(blocker);
        }

        for agent in self.registry.agents() {
            self.draw_snake(agent);
        }

        let info = format!(
            "Snakes: {} / {}\nDrag a snake end to steer it into its hole\nC: copy level to clipboard\nEsc: quit",
            self.registry.alive_count(),
            self.registry.total_count()
        );
        draw_text(&info, 10.0, 20.0, 20.0, WHITE);

        if self.registry.alive_count() == 0 {
            let msg = "All snakes cleared!";
            let size = measure_text(msg, None, 40, 1.0);
            draw_text(
                msg,
                (screen_width() - size.width) * 0.5,
                screen_height() * 0.5,
                40.0,
                GOLD,
            );
        }
    }

    fn draw_blocker(&self, blocker: &BlockingEntity) {
        let cell = self.ctx.grid.cell_size;
        let center = self.world_to_screen(self.ctx.grid.cell_to_world(blocker.cell));
        match blocker.kind {
            BlockerKind::Wall => {
                draw_rectangle(
                    center.x - cell * 0.5,
                    center.y - cell * 0.5,
                    cell,
                    cell,
                    Color::from_rgba(90, 90, 100, 255),
                );
            }
            BlockerKind::Hole => {
                let color = blocker.color.map(tag_color).unwrap_or(GRAY);
                draw_circle(center.x, center.y, cell * 0.45, Color::from_rgba(15, 15, 18, 255));
                draw_circle_lines(center.x, center.y, cell * 0.45, 3.0, color);
            }
            BlockerKind::Item => {
                draw_circle(center.x, center.y, cell * 0.2, GOLD);
            }
        }
    }

    fn draw_snake(&self, agent: &SnakeAgent) {
        let cell = self.ctx.grid.cell_size;
        let color = tag_color(agent.color());
        let positions = agent.positions();

        // Segments already swallowed by the hole are hidden; the one being
        // swallowed shrinks.
        let (eaten, fraction) = match agent.consumption() {
            Some(seq) => (seq.segments_eaten(), seq.current_fraction()),
            None => (0, 0.0),
        };

        for (i, pos) in positions.iter().enumerate().rev() {
            // Count from the active lead end inward.
            let from_lead = match agent.lead_end() {
                LeadEnd::Head => i,
                LeadEnd::Tail => positions.len() - 1 - i,
            };
            let radius = if from_lead < eaten {
                continue;
            } else if from_lead == eaten && agent.consumption().is_some() {
                cell * 0.42 * (1.0 - fraction)
            } else {
                cell * 0.42
            };
            let screen = self.world_to_screen(*pos);
            draw_circle(screen.x, screen.y, radius, color);
            if i == 0 {
                draw_circle(screen.x, screen.y, radius * 0.35, WHITE);
            }
        }

        for pos in agent.sub_positions(&self.ctx) {
            let screen = self.world_to_screen(pos);
            draw_circle(screen.x, screen.y, cell * 0.12, color);
        }
    }
}

fn tag_color(tag: ColorTag) -> Color {
    match tag {
        ColorTag::Red => Color::from_rgba(220, 70, 70, 255),
        ColorTag::Orange => Color::from_rgba(235, 140, 50, 255),
        ColorTag::Yellow => Color::from_rgba(230, 210, 70, 255),
        ColorTag::Green => Color::from_rgba(90, 200, 90, 255),
        ColorTag::Blue => Color::from_rgba(80, 140, 235, 255),
        ColorTag::Purple => Color::from_rgba(170, 90, 220, 255),
    }
}

fn window_conf() -> Conf {
    let config = Config::load();
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: (config.grid.cols as f32 * config.grid.cell_size) as i32 + 120,
        window_height: (config.grid.rows as f32 * config.grid.cell_size) as i32 + 120,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = Config::load();
    let mut state = GameState::new(&config);

    loop {
        state.update();

        if is_key_pressed(KeyCode::C) {
            state.copy_to_clipboard();
        }

        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.draw();

        next_frame().await
    }

    if config.logging.enable_event_log && !state.log.is_empty() {
        println!("{}", state.log.summary());
        if let Err(e) = state.log.save_to_file(&config.logging.event_log_path) {
            eprintln!("Warning: {}", e);
        } else {
            println!("Event log saved to {}", config.logging.event_log_path);
        }
    }
}
