//! Timer scheduler - fires registered callbacks at fixed intervals
//!
//! `tick` is driven by the host's own loop; the scheduler never spawns
//! anything. Fixed-rate, drift uncompensated: a timer whose interval
//! elapsed more than once since the last tick still fires exactly once,
//! missed intervals are skipped rather than queued.

use std::collections::HashMap;
use std::time::Instant;

use crate::application::registry::{RegistrationId, SharedRegistry};

pub struct TimerScheduler {
    registry: SharedRegistry,
    last_fired: HashMap<RegistrationId, Instant>,
}

impl TimerScheduler {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            last_fired: HashMap::new(),
        }
    }

    /// Fire every timer whose interval has elapsed since its last fire
    ///
    /// A failing handler is caught and logged; the timer stays scheduled
    /// for its next interval regardless.
    pub fn tick(&mut self, now: Instant) {
        let timers = match self.registry.read() {
            Ok(registry) => registry.timers(),
            Err(_) => {
                tracing::error!("Registry lock poisoned, skipping tick");
                return;
            }
        };

        // Drop state for registrations removed since the last tick
        self.last_fired
            .retain(|id, _| timers.iter().any(|t| t.id == *id));

        for timer in timers {
            let last = self
                .last_fired
                .entry(timer.id)
                .or_insert(timer.registered_at);
            if now.saturating_duration_since(*last) < timer.interval {
                continue;
            }
            *last = now;

            // Fired outside the registry lock; the handler may re-enter
            // the facade to register or show output
            if let Err(e) = timer.handler.fire() {
                tracing::warn!("Timer from plugin '{}' failed: {}", timer.owner, e);
            }
        }
    }
}
