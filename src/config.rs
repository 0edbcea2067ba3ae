use crate::grid::GridSpace;
use crate::registry::{MotionTuning, SimContext};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub level: LevelFileConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_cols")]
    pub cols: i32,
    #[serde(default = "default_rows")]
    pub rows: i32,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
}

#[derive(Debug, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_cells_per_sec")]
    pub cells_per_sec: f32,
    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f32,
    #[serde(default = "default_consume_interval")]
    pub consume_interval: f32,
    #[serde(default = "default_centerline_subdiv")]
    pub centerline_subdiv: i32,
    /// Capability flag for the sub-segment rendering mode.
    #[serde(default)]
    pub sub_segments: bool,
}

#[derive(Debug, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
    #[serde(default = "default_show_grid_lines")]
    pub show_grid_lines: bool,
}

#[derive(Debug, Deserialize)]
pub struct LevelFileConfig {
    #[serde(default = "default_level_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_enable_event_log")]
    pub enable_event_log: bool,
    #[serde(default = "default_event_log_path")]
    pub event_log_path: String,
}

// Default values
fn default_cols() -> i32 { 12 }
fn default_rows() -> i32 { 14 }
fn default_cell_size() -> f32 { 48.0 }
fn default_cells_per_sec() -> f32 { 16.0 }
fn default_sample_fraction() -> f32 { 0.1 }
fn default_consume_interval() -> f32 { 0.12 }
fn default_centerline_subdiv() -> i32 { 4 }
fn default_window_title() -> String { "SnakeGrid - Drag Puzzle".to_string() }
fn default_bg_r() -> u8 { 24 }
fn default_bg_g() -> u8 { 26 }
fn default_bg_b() -> u8 { 32 }
fn default_show_grid_lines() -> bool { true }
fn default_level_path() -> String { "levels/default_level.json".to_string() }
fn default_enable_event_log() -> bool { true }
fn default_event_log_path() -> String { "event_log.json".to_string() }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            cell_size: default_cell_size(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            cells_per_sec: default_cells_per_sec(),
            sample_fraction: default_sample_fraction(),
            consume_interval: default_consume_interval(),
            centerline_subdiv: default_centerline_subdiv(),
            sub_segments: false,
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
            show_grid_lines: default_show_grid_lines(),
        }
    }
}

impl Default for LevelFileConfig {
    fn default() -> Self {
        Self { path: default_level_path() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_event_log: default_enable_event_log(),
            event_log_path: default_event_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            motion: MotionConfig::default(),
            visual: VisualConfig::default(),
            level: LevelFileConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Self {
        match fs::read_to_string("config.toml") {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    println!("Loaded configuration from config.toml");
                    config
                }
                Err(e) => {
                    eprintln!("Warning: Failed to parse config.toml: {}", e);
                    eprintln!("Using default configuration");
                    Config::default()
                }
            },
            Err(_) => {
                println!("No config.toml found, using default configuration");
                Config::default()
            }
        }
    }

    pub fn grid_space(&self) -> GridSpace {
        GridSpace::new(self.grid.cols, self.grid.rows, self.grid.cell_size)
    }

    pub fn tuning(&self) -> MotionTuning {
        MotionTuning {
            cells_per_sec: self.motion.cells_per_sec,
            sample_fraction: self.motion.sample_fraction,
            consume_interval: self.motion.consume_interval,
            centerline_subdiv: self.motion.centerline_subdiv,
            sub_segments: self.motion.sub_segments,
        }
    }

    /// The shared simulation context built from this configuration.
    pub fn context(&self) -> SimContext {
        SimContext {
            grid: self.grid_space(),
            tuning: self.tuning(),
        }
    }
}
