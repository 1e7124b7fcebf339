//=========================================================================
// Command Collector
//=========================================================================
//
// World command collector with bounded polling and shutdown detection.
//
// Architecture:
//   Receiver<WorldCommand> → collect_frame() → commands → TickControl
//
// Bounded polling prevents starvation. Idle sleep reduces CPU usage.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{info, warn};

//=== Internal Dependencies ===============================================

use super::WorldCommand;

//=== TickControl =========================================================

/// Update loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== CommandCollector ====================================================

/// Collects world commands with bounded polling.
pub(crate) struct CommandCollector {
    receiver: Receiver<WorldCommand>,
    commands: Vec<WorldCommand>,
}

impl CommandCollector {
    pub(crate) fn new(receiver: Receiver<WorldCommand>) -> Self {
        Self {
            receiver,
            commands: Vec::with_capacity(16),
        }
    }

    /// Collects pending commands (bounded to prevent starvation).
    ///
    /// Commands received before a shutdown request are kept so the
    /// final frame still applies them.
    pub(crate) fn collect_frame(&mut self) -> TickControl {
        const MAX_COMMANDS_PER_FRAME: usize = 100;
        const IDLE_SLEEP_MS: u64 = 10;

        self.commands.clear();
        let mut drained = 0;

        while drained < MAX_COMMANDS_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(WorldCommand::Shutdown) => {
                    info!("Shutdown requested");
                    return TickControl::Exit;
                }
                Ok(command) => {
                    self.commands.push(command);
                    drained += 1;
                }
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= MAX_COMMANDS_PER_FRAME {
            warn!("Command queue backlog: drained {} commands this frame", drained);
        }

        if drained == 0 {
            thread::sleep(Duration::from_millis(IDLE_SLEEP_MS));
        }

        TickControl::Continue
    }

    /// Commands collected this frame.
    pub(crate) fn commands(&self) -> &[WorldCommand] {
        &self.commands
    }

    /// Takes ownership of collected commands, leaving an empty vec.
    pub(crate) fn take_commands(&mut self) -> Vec<WorldCommand> {
        std::mem::take(&mut self.commands)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
