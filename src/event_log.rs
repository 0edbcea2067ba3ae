use crate::registry::SnakeEvent;
use crate::snake::LeadEnd;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Gameplay events worth recording for a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GameEvent {
    /// A drag began on one end of a snake.
    DragBegin { snake: usize, end: LeadEnd },
    /// The drag was released.
    DragRelease { snake: usize },
    /// The snake was steered into itself and swapped its lead end.
    Reversed { snake: usize },
    /// The snake reached a matching hole and started shrinking.
    ConsumeStarted { snake: usize },
    /// The snake finished its consumption sequence and was removed.
    Consumed { snake: usize },
}

/// Logged event with timestamp
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    pub event: GameEvent,
}

/// Session event logger
pub struct EventLog {
    start_time: Instant,
    events: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog {
            start_time: Instant::now(),
            events: Vec::new(),
        }
    }

    /// Log an event with the current timestamp
    pub fn record(&mut self, event: GameEvent) {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.events.push(LoggedEvent { timestamp_ms, event });
    }

    /// Log a registry notification
    pub fn record_sim(&mut self, event: &SnakeEvent) {
        let mapped = match *event {
            SnakeEvent::DragStarted { id, end } => GameEvent::DragBegin { snake: id, end },
            SnakeEvent::DragReleased { id } => GameEvent::DragRelease { snake: id },
            SnakeEvent::Reversed { id } => GameEvent::Reversed { snake: id },
            SnakeEvent::ConsumeStarted { id } => GameEvent::ConsumeStarted { snake: id },
            SnakeEvent::Consumed { id } => GameEvent::Consumed { snake: id },
        };
        self.record(mapped);
    }

    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), String> {
        let json = serde_json::to_string_pretty(&self.events)
            .map_err(|e| format!("Failed to serialize event log: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write event log: {}", e))?;
        Ok(())
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut drags = 0;
        let mut reversals = 0;
        let mut consumed = 0;

        for logged in &self.events {
            match logged.event {
                GameEvent::DragBegin { .. } => drags += 1,
                GameEvent::Reversed { .. } => reversals += 1,
                GameEvent::Consumed { .. } => consumed += 1,
                _ => {}
            }
        }

        let duration = self.events.last().map(|e| e.timestamp_ms).unwrap_or(0);

        format!(
            "Session Duration: {}ms\n\
             Total Events: {}\n\
             Drags: {}, Reversals: {}, Snakes Consumed: {}",
            duration,
            self.events.len(),
            drags,
            reversals,
            consumed
        )
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
