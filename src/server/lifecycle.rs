use std::collections::HashMap;
use std::time::Instant;

/// Maximum number of events retained across all servers.
const MAX_EVENTS: usize = 1000;

/// Lifecycle state of one logical server name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Nothing registered under the name
    Absent,
    /// Process spawned, warm-up in progress
    Starting,
    /// Registered and tracked
    Running,
    /// Termination signal sent, waiting for exit
    Stopping,
}

/// Server lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerLifecycleEvent {
    /// Server started and registered
    Started,
    /// Server stopped after a termination signal
    Stopped,
    /// Server was found already exited when stopping
    Exited,
    /// Server restarted
    Restarted,
    /// A lifecycle operation failed
    Failed,
}

/// Server lifecycle event
#[derive(Debug, Clone)]
pub struct ServerEvent {
    /// Logical server name
    pub name: String,
    /// Event type
    pub event: ServerLifecycleEvent,
    /// Event timestamp
    pub timestamp: Instant,
    /// Event details
    pub details: Option<String>,
}

/// Tracks per-name state and a bounded event history.
#[derive(Debug, Default)]
pub struct ServerLifecycleManager {
    events: Vec<ServerEvent>,
    states: HashMap<String, ServerState>,
}

impl ServerLifecycleManager {
    /// Create a new server lifecycle manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `name` into `state`; `Absent` forgets the name.
    pub fn transition(&mut self, name: &str, state: ServerState) {
        tracing::trace!(server_name = %name, state = ?state, "State transition");
        if state == ServerState::Absent {
            self.states.remove(name);
        } else {
            self.states.insert(name.to_string(), state);
        }
    }

    /// Current state of `name`
    pub fn state(&self, name: &str) -> ServerState {
        self.states.get(name).copied().unwrap_or(ServerState::Absent)
    }

    /// Record a server event
    pub fn record_event(&mut self, name: &str, event: ServerLifecycleEvent, details: Option<String>) {
        self.events.push(ServerEvent {
            name: name.to_string(),
            event,
            timestamp: Instant::now(),
            details,
        });

        // Limit event history
        if self.events.len() > MAX_EVENTS {
            self.events.remove(0);
        }
    }

    /// Get recent events for a server, newest first
    pub fn get_server_events(&self, name: &str, limit: Option<usize>) -> Vec<ServerEvent> {
        let mut server_events: Vec<ServerEvent> = self
            .events
            .iter()
            .rev()
            .filter(|e| e.name == name)
            .cloned()
            .collect();

        if let Some(limit) = limit {
            server_events.truncate(limit);
        }

        server_events
    }

    /// Get all events, newest first
    pub fn get_all_events(&self, limit: Option<usize>) -> Vec<ServerEvent> {
        let mut all_events: Vec<ServerEvent> = self.events.iter().rev().cloned().collect();

        if let Some(limit) = limit {
            all_events.truncate(limit);
        }

        all_events
    }
}
