//! Actuator Driver Facade.
//!
//! [`ActuatorBank`] remembers the last level applied to every output and only
//! forwards a write to the [`OutputDriver`] when that level changes. Applying
//! the same level twice is therefore a no-op at the driver.
//!
//! Levels are never read back from hardware; the bank's record is the source
//! of truth for what has been applied.

use lamp_types::{ActuatorHandle, ExternalId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// The physical output layer.
///
/// Writes are assumed infallible; a hardware fault is not observable here.
pub trait OutputDriver: Send {
    /// Drive the output line high (`true`) or low (`false`).
    fn write(&mut self, handle: ActuatorHandle, level: bool);
}

/// Result of applying a level to one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// The output moved to a new level and the driver was written.
    Changed {
        /// The new level.
        to: bool,
    },
    /// The output already held this level; nothing was written.
    Unchanged {
        /// The level it holds.
        level: bool,
    },
}

impl Transition {
    /// The level the output holds after the apply.
    pub fn level(&self) -> bool {
        match *self {
            Self::Changed { to } => to,
            Self::Unchanged { level } => level,
        }
    }

    /// Whether the driver was written.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Current state of one actuator, for listings and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActuatorState {
    /// Platform identifier.
    pub external_id: ExternalId,
    /// Output line.
    pub handle: ActuatorHandle,
    /// Last applied level.
    pub state: bool,
}

/// Idempotent facade over an [`OutputDriver`].
pub struct ActuatorBank {
    driver: Box<dyn OutputDriver>,
    levels: BTreeMap<ActuatorHandle, bool>,
}

impl std::fmt::Debug for ActuatorBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorBank")
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}

impl ActuatorBank {
    /// Create a bank for the given outputs, driving every one of them low.
    pub fn new<I>(handles: I, mut driver: Box<dyn OutputDriver>) -> Self
    where
        I: IntoIterator<Item = ActuatorHandle>,
    {
        let mut levels = BTreeMap::new();
        for handle in handles {
            driver.write(handle, false);
            levels.insert(handle, false);
        }
        Self { driver, levels }
    }

    /// Apply a level. Writes the driver only if the level differs from the
    /// last one applied.
    pub fn apply(&mut self, handle: ActuatorHandle, level: bool) -> Transition {
        let previous = self.levels.insert(handle, level);
        if previous == Some(level) {
            return Transition::Unchanged { level };
        }
        self.driver.write(handle, level);
        Transition::Changed { to: level }
    }

    /// Last applied level for a handle.
    pub fn level(&self, handle: ActuatorHandle) -> Option<bool> {
        self.levels.get(&handle).copied()
    }
}

/// A driver that records every write, for tests and dry runs.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    writes: Arc<Mutex<Vec<(ActuatorHandle, bool)>>>,
}

impl RecordingDriver {
    /// Create an empty recording driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes so far, in order.
    pub fn writes(&self) -> Vec<(ActuatorHandle, bool)> {
        self.writes.lock().unwrap().clone()
    }

    /// Writes made to one handle, in order.
    pub fn writes_to(&self, handle: ActuatorHandle) -> Vec<bool> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, level)| *level)
            .collect()
    }

    /// Forget all recorded writes.
    pub fn clear(&self) {
        self.writes.lock().unwrap().clear();
    }
}

impl OutputDriver for RecordingDriver {
    fn write(&mut self, handle: ActuatorHandle, level: bool) {
        self.writes.lock().unwrap().push((handle, level));
    }
}
