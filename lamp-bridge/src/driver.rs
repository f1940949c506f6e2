//! Output drivers shipped with the bridge.
//!
//! The physical GPIO layer sits behind [`OutputDriver`]; this build only
//! logs levels, which is enough to run the bridge on a host without GPIO.

use lamp_core::OutputDriver;
use lamp_types::ActuatorHandle;

/// Driver that reports every write to the `gpio` tracing target.
#[derive(Debug, Default)]
pub struct LogDriver;

impl LogDriver {
    /// Create a log driver.
    pub fn new() -> Self {
        Self
    }
}

impl OutputDriver for LogDriver {
    fn write(&mut self, handle: ActuatorHandle, level: bool) {
        tracing::info!(
            target: "gpio",
            "{} <- {}",
            handle,
            if level { "HIGH" } else { "LOW" }
        );
    }
}
