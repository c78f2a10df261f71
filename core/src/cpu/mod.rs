use crate::core::Bus;

/// Contract for the external CPU core.
///
/// The interpreter itself lives outside this workspace; machines consume it
/// as a black-box ticking engine. `exec` runs whole instructions against the
/// bus until at least `budget` clock periods have elapsed, invoking
/// [`Bus::tick`] once per bus cycle, and returns the ticks actually
/// executed (which may overshoot the budget).
pub trait Cpu {
    /// Reset vector fetch.
    fn reset(&mut self);

    /// Execute instructions worth at least `budget` ticks.
    fn exec(&mut self, bus: &mut dyn Bus, budget: u64) -> u64;
}

pub mod pins;
pub mod script;

pub use pins::{Ctrl, Pins};
pub use script::{BusOp, ScriptCpu};
