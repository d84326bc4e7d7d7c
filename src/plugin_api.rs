//! Host API: how the shelter core talks to the editor that embeds it.
//!
//! The core never touches editor state directly. It reads buffers through
//! [`BufferSource`] and asks the host to draw overlays, toggle completion,
//! schedule deferred work and run timers by sending [`ShelterCommand`]s.

use crate::model::{BufferId, ExtmarkSpec};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Identifier of a host timer requested by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Shelter command - a request for the host editor
#[derive(Debug, Clone, PartialEq)]
pub enum ShelterCommand {
    /// Remove every shelter overlay from a buffer
    ClearOverlays { buffer_id: BufferId },

    /// Draw a batch of overlays on a buffer
    AddOverlays {
        buffer_id: BufferId,
        overlays: Vec<ExtmarkSpec>,
    },

    /// Turn buffer-local completion on or off
    SetBufferCompletion { buffer_id: BufferId, enabled: bool },

    /// Call `Shelter::resume(buffer_id, generation)` on the next tick
    Defer { buffer_id: BufferId, generation: u64 },

    /// Start a repeating timer; the host calls `Shelter::on_timer` on each tick
    StartTimer { timer_id: TimerId, interval: Duration },

    /// Stop a repeating timer
    StopTimer { timer_id: TimerId },

    /// Set status message
    SetStatus { message: String },
}

/// Read access to the host's buffers
pub trait BufferSource {
    /// Current lines of a buffer, or `None` if it no longer exists
    fn get_lines(&self, buffer_id: BufferId) -> Option<Vec<String>>;

    fn is_valid(&self, buffer_id: BufferId) -> bool;

    /// Path of the file shown in the buffer
    fn file_path(&self, buffer_id: BufferId) -> Option<PathBuf>;

    /// 1-based cursor line, when the buffer is shown in a window
    fn cursor_line(&self, buffer_id: BufferId) -> Option<usize>;
}

/// Sending half of the host command channel
#[derive(Debug, Clone)]
pub struct HostApi {
    command_sender: Sender<ShelterCommand>,
}

impl HostApi {
    pub fn new(command_sender: Sender<ShelterCommand>) -> Self {
        Self { command_sender }
    }

    /// Send a command to the host (non-blocking)
    pub fn send_command(&self, command: ShelterCommand) -> Result<(), String> {
        self.command_sender
            .send(command)
            .map_err(|e| format!("Failed to send command: {}", e))
    }

    pub fn clear_overlays(&self, buffer_id: BufferId) -> Result<(), String> {
        self.send_command(ShelterCommand::ClearOverlays { buffer_id })
    }

    pub fn add_overlays(&self, buffer_id: BufferId, overlays: Vec<ExtmarkSpec>) -> Result<(), String> {
        self.send_command(ShelterCommand::AddOverlays {
            buffer_id,
            overlays,
        })
    }

    pub fn set_buffer_completion(&self, buffer_id: BufferId, enabled: bool) -> Result<(), String> {
        self.send_command(ShelterCommand::SetBufferCompletion { buffer_id, enabled })
    }

    pub fn defer(&self, buffer_id: BufferId, generation: u64) -> Result<(), String> {
        self.send_command(ShelterCommand::Defer {
            buffer_id,
            generation,
        })
    }

    pub fn start_timer(&self, timer_id: TimerId, interval: Duration) -> Result<(), String> {
        self.send_command(ShelterCommand::StartTimer { timer_id, interval })
    }

    pub fn stop_timer(&self, timer_id: TimerId) -> Result<(), String> {
        self.send_command(ShelterCommand::StopTimer { timer_id })
    }

    pub fn set_status(&self, message: String) -> Result<(), String> {
        self.send_command(ShelterCommand::SetStatus { message })
    }
}

/// Log a failed send. The host dropping its receiver only means nobody is
/// listening any more.
pub(crate) fn log_send_failure(result: Result<(), String>) {
    if let Err(e) = result {
        tracing::debug!("Host command dropped: {}", e);
    }
}
