//! Z80 pin-bus modeling.
//!
//! One bus cycle is described by a [`Pins`] value: the address and data
//! buses plus the control lines the board's decode logic cares about. The
//! word travels CPU → bus callback → CPU by value each cycle.

use bitflags::bitflags;

bitflags! {
    /// Z80 control lines visible to the board.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ctrl: u8 {
        /// Memory request: the address bus holds a memory address.
        const MREQ = 1 << 0;
        /// I/O request: the address bus holds a port address.
        const IORQ = 1 << 1;
        /// Read cycle.
        const RD = 1 << 2;
        /// Write cycle.
        const WR = 1 << 3;
        /// Opcode fetch; combined with IORQ it signals interrupt acknowledge.
        const M1 = 1 << 4;
        /// Maskable interrupt line, driven by the board toward the CPU.
        const INT = 1 << 5;
    }
}

/// Snapshot of the CPU pins for one bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pins {
    pub addr: u16,
    pub data: u8,
    pub ctrl: Ctrl,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            addr: 0,
            data: 0,
            ctrl: Ctrl::empty(),
        }
    }
}

impl Pins {
    /// An internal cycle with no bus activity.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn mem_read(addr: u16) -> Self {
        Self {
            addr,
            data: 0,
            ctrl: Ctrl::MREQ | Ctrl::RD,
        }
    }

    pub fn mem_write(addr: u16, data: u8) -> Self {
        Self {
            addr,
            data,
            ctrl: Ctrl::MREQ | Ctrl::WR,
        }
    }

    /// The interrupt-acknowledge cycle (`IORQ` together with `M1`).
    pub fn int_ack() -> Self {
        Self {
            addr: 0,
            data: 0,
            ctrl: Ctrl::IORQ | Ctrl::M1,
        }
    }

    pub fn is_mem_read(&self) -> bool {
        self.ctrl.contains(Ctrl::MREQ | Ctrl::RD)
    }

    pub fn is_mem_write(&self) -> bool {
        self.ctrl.contains(Ctrl::MREQ | Ctrl::WR)
    }

    pub fn is_int_ack(&self) -> bool {
        self.ctrl.contains(Ctrl::IORQ | Ctrl::M1)
    }

    pub fn int_asserted(&self) -> bool {
        self.ctrl.contains(Ctrl::INT)
    }

    pub fn set_int(&mut self, level: bool) {
        self.ctrl.set(Ctrl::INT, level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_read_shape() {
        let pins = Pins::mem_read(0xC123);
        assert_eq!(pins.addr, 0xC123);
        assert!(pins.is_mem_read());
        assert!(!pins.is_mem_write());
        assert!(!pins.is_int_ack());
    }

    #[test]
    fn mem_write_shape() {
        let pins = Pins::mem_write(0xE800, 0x55);
        assert_eq!(pins.addr, 0xE800);
        assert_eq!(pins.data, 0x55);
        assert!(pins.is_mem_write());
        assert!(!pins.is_mem_read());
    }

    #[test]
    fn int_ack_shape() {
        let pins = Pins::int_ack();
        assert!(pins.is_int_ack());
        assert!(!pins.is_mem_read());
        assert!(!pins.is_mem_write());
    }

    #[test]
    fn int_line_set_and_clear() {
        let mut pins = Pins::idle();
        assert!(!pins.int_asserted());
        pins.set_int(true);
        assert!(pins.int_asserted());
        pins.set_int(false);
        assert!(!pins.int_asserted());
    }

    #[test]
    fn idle_has_no_control_lines() {
        assert_eq!(Pins::idle().ctrl, Ctrl::empty());
    }
}
