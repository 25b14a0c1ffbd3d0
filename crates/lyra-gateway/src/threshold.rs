//! Event threshold monitor
//!
//! An availability safety valve against event storms: when the inbound
//! state-change rate stays over the ceiling for several consecutive
//! sampling intervals, the gateway coarsens all upstream state
//! subscriptions to a single system pattern. The degraded mode clears
//! unconditionally after a fixed cooldown - a monitor that never
//! recovers is worse than one that briefly widens unrelated traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Threshold configuration
#[derive(Clone, Debug)]
pub struct ThresholdConfig {
    /// Duration of one sampling interval
    pub check_interval: Duration,
    /// Events allowed per interval before it counts as an accident
    pub ceiling: u64,
    /// Consecutive over-ceiling intervals required to activate
    pub consecutive: u32,
    /// Degraded mode clears unconditionally after this long
    pub cooldown: Duration,
    /// Coarse pattern standing in for all state subscriptions
    pub coarse_pattern: String,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            check_interval: Duration::from_secs(1),
            ceiling: 200,
            consecutive: 3,
            cooldown: Duration::from_secs(60),
            coarse_pattern: "system.adapter.*".to_owned(),
        }
    }
}

/// Transition decided by a sampling tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdTransition {
    Activated,
    Deactivated,
}

#[derive(Debug, Default)]
struct ThresholdState {
    accidents: u32,
    active: bool,
    activated_at: Option<Instant>,
}

/// Process-wide event rate monitor
pub struct EventThresholdMonitor {
    config: ThresholdConfig,
    /// Events observed since the last tick; atomic so the publish hot
    /// path never takes the state lock
    count: AtomicU64,
    state: Mutex<ThresholdState>,
}

impl EventThresholdMonitor {
    pub fn new(config: ThresholdConfig) -> Self {
        EventThresholdMonitor {
            config,
            count: AtomicU64::new(0),
            state: Mutex::new(ThresholdState::default()),
        }
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Count one inbound change event
    pub fn record_event(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// One sampling tick. Returns the transition to apply, if any.
    pub fn tick(&self) -> Option<ThresholdTransition> {
        let count = self.count.swap(0, Ordering::Relaxed);
        let mut state = self.state.lock();

        if !state.active {
            if count > self.config.ceiling {
                state.accidents += 1;
                if state.accidents >= self.config.consecutive {
                    return Some(self.activate(&mut state, count));
                }
            } else {
                state.accidents = 0;
            }
            None
        } else if state
            .activated_at
            .is_some_and(|at| at.elapsed() >= self.config.cooldown)
        {
            // unconditional clear, even if the rate is still high
            Some(self.deactivate(&mut state))
        } else {
            None
        }
    }

    /// Manually force the threshold on or off (admin command path).
    /// Returns the transition if the state actually changed.
    pub fn force(&self, active: bool) -> Option<ThresholdTransition> {
        let mut state = self.state.lock();
        match (state.active, active) {
            (false, true) => Some(self.activate(&mut state, 0)),
            (true, false) => Some(self.deactivate(&mut state)),
            _ => None,
        }
    }

    fn activate(&self, state: &mut ThresholdState, count: u64) -> ThresholdTransition {
        tracing::info!(
            count,
            ceiling = self.config.ceiling,
            intervals = self.config.consecutive,
            "event threshold activated, coarsening state subscriptions"
        );
        state.active = true;
        state.activated_at = Some(Instant::now());
        state.accidents = 0;
        ThresholdTransition::Activated
    }

    fn deactivate(&self, state: &mut ThresholdState) -> ThresholdTransition {
        tracing::info!("event threshold cleared, restoring state subscriptions");
        state.active = false;
        state.activated_at = None;
        state.accidents = 0;
        self.count.store(0, Ordering::Relaxed);
        ThresholdTransition::Deactivated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ThresholdConfig {
        ThresholdConfig {
            ceiling: 10,
            consecutive: 3,
            cooldown: Duration::ZERO,
            ..ThresholdConfig::default()
        }
    }

    fn flood(monitor: &EventThresholdMonitor, events: u64) {
        for _ in 0..events {
            monitor.record_event();
        }
    }

    #[test]
    fn test_activates_after_consecutive_overloads() {
        let monitor = EventThresholdMonitor::new(config());

        flood(&monitor, 11);
        assert_eq!(monitor.tick(), None);
        flood(&monitor, 11);
        assert_eq!(monitor.tick(), None);
        flood(&monitor, 11);
        assert_eq!(monitor.tick(), Some(ThresholdTransition::Activated));
        assert!(monitor.is_active());
    }

    #[test]
    fn test_quiet_interval_resets_accidents() {
        let monitor = EventThresholdMonitor::new(config());

        flood(&monitor, 11);
        assert_eq!(monitor.tick(), None);
        flood(&monitor, 11);
        assert_eq!(monitor.tick(), None);
        // quiet interval breaks the streak
        assert_eq!(monitor.tick(), None);
        flood(&monitor, 11);
        assert_eq!(monitor.tick(), None);
        assert!(!monitor.is_active());
    }

    #[test]
    fn test_clears_unconditionally_after_cooldown() {
        let monitor = EventThresholdMonitor::new(config());
        for _ in 0..3 {
            flood(&monitor, 11);
            monitor.tick();
        }
        assert!(monitor.is_active());

        // the rate is still over the ceiling, the clear happens anyway
        flood(&monitor, 1000);
        assert_eq!(monitor.tick(), Some(ThresholdTransition::Deactivated));
        assert!(!monitor.is_active());
    }

    #[test]
    fn test_force_is_idempotent() {
        let monitor = EventThresholdMonitor::new(config());
        assert_eq!(monitor.force(true), Some(ThresholdTransition::Activated));
        assert_eq!(monitor.force(true), None);
        assert_eq!(monitor.force(false), Some(ThresholdTransition::Deactivated));
        assert_eq!(monitor.force(false), None);
    }
}
