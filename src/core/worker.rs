//! The drain worker
//!
//! A single background thread pops lines in acceptance order and hands each
//! one to the sink manager. Its lifecycle is
//! `Starting -> Waiting <-> Dispatching -> DrainingOnShutdown -> Stopped`.

use super::engine::Shared;
use crossbeam_channel::Sender;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    /// Opening sinks, before the first pop
    Starting = 0,
    /// Blocked until a line arrives or shutdown is requested
    Waiting = 1,
    /// Writing one line to the sinks
    Dispatching = 2,
    /// Writing whatever was queued when shutdown was requested
    DrainingOnShutdown = 3,
    /// Sinks closed, thread exiting
    Stopped = 4,
}

impl WorkerState {
    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WorkerState::Starting),
            1 => Some(WorkerState::Waiting),
            2 => Some(WorkerState::Dispatching),
            3 => Some(WorkerState::DrainingOnShutdown),
            4 => Some(WorkerState::Stopped),
            _ => None,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Starting => "starting",
            WorkerState::Waiting => "waiting",
            WorkerState::Dispatching => "dispatching",
            WorkerState::DrainingOnShutdown => "draining",
            WorkerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Why the queue is full, as far as a producer can tell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerHealth {
    /// The worker is making progress but producers are faster
    Busy,
    /// The worker has been stuck on one line for too long
    Stalled,
    /// No worker is running
    Stopped,
}

impl fmt::Display for WorkerHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WorkerHealth::Busy => "worker busy",
            WorkerHealth::Stalled => "worker stalled",
            WorkerHealth::Stopped => "worker stopped",
        };
        f.write_str(text)
    }
}

/// Thread body; `ready` is signalled once the sinks are open
pub(crate) fn run(shared: Arc<Shared>, ready: Sender<()>) {
    shared.set_state(WorkerState::Starting);
    {
        let config = shared.config_snapshot();
        shared.sinks.lock().reconcile(&config);
    }
    shared.touch();
    let _ = ready.send(());

    loop {
        shared.set_state(WorkerState::Waiting);
        let Some(line) = shared.queue.pop_blocking() else {
            break;
        };

        shared.set_state(WorkerState::Dispatching);
        shared.touch();
        dispatch_one(&shared, &line);

        if shared.queue.is_empty() {
            shared.sinks.lock().flush();
        }
    }

    shared.set_state(WorkerState::DrainingOnShutdown);
    while let Some(line) = shared.queue.try_pop() {
        dispatch_one(&shared, &line);
    }

    shared.sinks.lock().close();
    shared.set_state(WorkerState::Stopped);
}

fn dispatch_one(shared: &Shared, line: &str) {
    let config = shared.config_snapshot();

    let started = Instant::now();
    let errors = shared.sinks.lock().dispatch(line, &config);
    let elapsed = started.elapsed();

    shared.stats.record_dispatched(elapsed);
    for _ in 0..errors {
        shared.stats.record_sink_error();
    }
    shared.touch();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [
            WorkerState::Starting,
            WorkerState::Waiting,
            WorkerState::Dispatching,
            WorkerState::DrainingOnShutdown,
            WorkerState::Stopped,
        ] {
            assert_eq!(WorkerState::from_u8(state as u8), Some(state));
        }
        assert_eq!(WorkerState::from_u8(5), None);
    }

    #[test]
    fn test_health_display() {
        assert_eq!(WorkerHealth::Stalled.to_string(), "worker stalled");
        assert_eq!(WorkerState::DrainingOnShutdown.to_string(), "draining");
    }
}
