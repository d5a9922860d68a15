
use std::fmt;
use std::str::FromStr;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

use crate::constants::WRITE_FLAG;


// Status register bits. Each device uses a subset.
pub const GO: u16 = 0o1; // Reader enable
pub const INT_ENB: u16 = 0o100;
pub const DONE: u16 = 0o200; // DONE on the reader, READY on the punch and printer
pub const BUSY: u16 = 0o4000; // Reader only
pub const ERROR: u16 = 0o100000;

// Only INT ENB and GO are writable on the reader.
pub const PRS_WRITE_MASK: u16 = INT_ENB | GO;

// Everything but ERROR and READY is writable on the punch and printer.
pub const OUTPUT_STATUS_WRITE_MASK: u16 = !(ERROR | DONE);

pub const BUFFER_MASK: u16 = 0o377;

// What a read of PRS returns while a reset is in progress.
pub const PRS_RESET_VALUE: u16 = BUSY;

// What a read of PPS returns while a reset is in progress.
pub const PPS_RESET_VALUE: u16 = 0;

// Loaded into PRB when GO is set, and visible until the byte arrives.
pub const PRB_GO_FILL: u16 = 0o123;


/// The six device registers, numbered by their bus address.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq, Hash)]
pub enum Reg {
    /// Line printer status
    Lps = 0o14,
    /// Line printer buffer
    Lpb = 0o16,
    /// Paper tape reader status
    Prs = 0o50,
    /// Paper tape reader buffer
    Prb = 0o52,
    /// Paper tape punch status
    Pps = 0o54,
    /// Paper tape punch buffer
    Ppb = 0o56,
}

impl Reg {
    pub const ALL: [Reg; 6] = [Reg::Lps, Reg::Lpb, Reg::Prs, Reg::Prb, Reg::Pps, Reg::Ppb];

    pub fn addr(self) -> u8 {
        self.to_u8().unwrap()
    }

    pub fn write_addr(self) -> u8 {
        self.addr() | WRITE_FLAG
    }

    // Decodes an address byte with the write flag already stripped.
    pub fn from_addr(addr: u8) -> Option<Reg> {
        Reg::from_u8(addr)
    }

    // Bits a bus write may change. Buffers are masked to a byte.
    pub fn write_mask(self) -> u16 {
        match self {
            Reg::Prs => PRS_WRITE_MASK,
            Reg::Pps | Reg::Lps => OUTPUT_STATUS_WRITE_MASK,
            Reg::Ppb | Reg::Lpb => BUFFER_MASK,
            Reg::Prb => 0,
        }
    }

    // The status register that governs a buffer (or itself, for a status).
    pub fn status(self) -> Reg {
        match self {
            Reg::Lps | Reg::Lpb => Reg::Lps,
            Reg::Prs | Reg::Prb => Reg::Prs,
            Reg::Pps | Reg::Ppb => Reg::Pps,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Reg::Lps => "LPS",
            Reg::Lpb => "LPB",
            Reg::Prs => "PRS",
            Reg::Prb => "PRB",
            Reg::Pps => "PPS",
            Reg::Ppb => "PPB",
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Reg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reg::ALL
            .into_iter()
            .find(|reg| reg.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown register {s}"))
    }
}
