//! A scripted bus master.
//!
//! Machine tests need to drive a board through the same pin protocol the
//! real Z80 uses, with exact control over every cycle. [`ScriptCpu`]
//! implements [`Cpu`] from a queue of bus operations, each costing one
//! tick, and records what came back: the data bus on reads and the number
//! of ticks on which the board asserted INT.

use std::collections::VecDeque;

use crate::core::Bus;

use super::pins::Pins;
use super::Cpu;

/// One scripted bus cycle.
pub enum BusOp {
    Read(u16),
    Write(u16, u8),
    IntAck,
    /// `n` internal cycles with no bus activity.
    Idle(u32),
}

/// Deterministic stand-in for the external Z80 core.
#[derive(Default)]
pub struct ScriptCpu {
    ops: VecDeque<BusOp>,
    /// Data returned by the bus for each scripted `Read`, in order.
    pub read_data: Vec<u8>,
    /// Number of ticks on which the returned pin word had INT asserted.
    pub int_ticks: u64,
    /// Pin word returned by the most recent cycle.
    pub last_pins: Pins,
}

impl ScriptCpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(ops: impl IntoIterator<Item = BusOp>) -> Self {
        Self {
            ops: ops.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, op: BusOp) {
        self.ops.push_back(op);
    }

    fn cycle(&mut self, bus: &mut dyn Bus, pins: Pins) -> Pins {
        let out = bus.tick(1, pins);
        if out.int_asserted() {
            self.int_ticks += 1;
        }
        self.last_pins = out;
        out
    }
}

impl Cpu for ScriptCpu {
    fn reset(&mut self) {
        self.ops.clear();
        self.read_data.clear();
        self.int_ticks = 0;
        self.last_pins = Pins::idle();
    }

    fn exec(&mut self, bus: &mut dyn Bus, budget: u64) -> u64 {
        let mut executed = 0;
        while executed < budget {
            match self.ops.pop_front() {
                Some(BusOp::Read(addr)) => {
                    let out = self.cycle(bus, Pins::mem_read(addr));
                    self.read_data.push(out.data);
                    executed += 1;
                }
                Some(BusOp::Write(addr, data)) => {
                    self.cycle(bus, Pins::mem_write(addr, data));
                    executed += 1;
                }
                Some(BusOp::IntAck) => {
                    self.cycle(bus, Pins::int_ack());
                    executed += 1;
                }
                // Like a real core finishing its current instruction, an
                // idle burst runs to completion and may overshoot the budget.
                Some(BusOp::Idle(n)) => {
                    for _ in 0..n {
                        self.cycle(bus, Pins::idle());
                        executed += 1;
                    }
                }
                None => {
                    self.cycle(bus, Pins::idle());
                    executed += 1;
                }
            }
        }
        executed
    }
}
