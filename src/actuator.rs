//! ==============================================================================
//! actuator.rs - control backend seam
//! ==============================================================================
//!
//! purpose:
//!     the dashboard's toggles, slider, and reset button have no device
//!     behind them. this trait is the minimal command interface they would
//!     drive if one existed; NoopBackend is the documented stub that only
//!     logs. wiring a real site controller means implementing ControlBackend
//!     and handing it to the router state - nothing else changes.
//!
//! relationships:
//!     - used by: main.rs (POST /api/controls, POST /api/reset)
//!
//! ==============================================================================

use anyhow::Result;

pub trait ControlBackend: Send + Sync {
    fn set_pump(&self, on: bool) -> Result<()>;
    fn set_generator(&self, on: bool) -> Result<()>;
    /// run the pump for a bounded number of seconds
    fn run_pump(&self, seconds: u32) -> Result<()>;
    /// the "Reset Slave" button
    fn reset_slave(&self) -> Result<()>;
}

/// stub backend: acknowledges every command in the log and does nothing
pub struct NoopBackend;

impl ControlBackend for NoopBackend {
    fn set_pump(&self, on: bool) -> Result<()> {
        log::info!("[ACTUATOR] pump -> {} (no backend wired)", if on { "ON" } else { "OFF" });
        Ok(())
    }

    fn set_generator(&self, on: bool) -> Result<()> {
        log::info!("[ACTUATOR] generator -> {} (no backend wired)", if on { "ON" } else { "OFF" });
        Ok(())
    }

    fn run_pump(&self, seconds: u32) -> Result<()> {
        log::info!("[ACTUATOR] pump run for {}s (no backend wired)", seconds);
        Ok(())
    }

    fn reset_slave(&self) -> Result<()> {
        log::info!("[ACTUATOR] reset slave (no backend wired)");
        Ok(())
    }
}
