use std::sync::{Arc, Mutex, MutexGuard};

use common::regs::*;

use log::{trace, warn};


// The punch and the printer behave identically from the engine's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Punch,
    Printer,
}

impl Output {
    pub fn status(self) -> Reg {
        match self {
            Output::Punch => Reg::Pps,
            Output::Printer => Reg::Lps,
        }
    }

    pub fn buffer(self) -> Reg {
        match self {
            Output::Punch => Reg::Ppb,
            Output::Printer => Reg::Lpb,
        }
    }
}


// PC11 and LP11 registers plus the reset flag. Bus-side accesses go through
// read() and write(); everything else is a device-side transition.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    prs: u16,
    prb: u16,
    pps: u16,
    ppb: u16,
    lps: u16,
    lpb: u16,
    resetting: bool,
}

impl RegisterFile {
    pub fn new() -> RegisterFile {
        Default::default()
    }

    // Raw value, without the reset sentinels or read side effects.
    pub fn get(&self, reg: Reg) -> u16 {
        match reg {
            Reg::Prs => self.prs,
            Reg::Prb => self.prb,
            Reg::Pps => self.pps,
            Reg::Ppb => self.ppb,
            Reg::Lps => self.lps,
            Reg::Lpb => self.lpb,
        }
    }

    fn set(&mut self, reg: Reg, val: u16) {
        match reg {
            Reg::Prs => self.prs = val,
            Reg::Prb => self.prb = val,
            Reg::Pps => self.pps = val,
            Reg::Ppb => self.ppb = val,
            Reg::Lps => self.lps = val,
            Reg::Lpb => self.lpb = val,
        }
    }

    pub fn resetting(&self) -> bool {
        self.resetting
    }

    pub fn set_resetting(&mut self, val: bool) {
        self.resetting = val;
    }

    ///////////////////////////////////////////////////////////////////////////
    // Bus side
    ///////////////////////////////////////////////////////////////////////////

    pub fn read(&mut self, reg: Reg) -> u16 {
        match reg {
            Reg::Prs if self.resetting => PRS_RESET_VALUE,
            Reg::Pps if self.resetting => PPS_RESET_VALUE,
            Reg::Prb => {
                self.prs &= !DONE;
                self.prb
            }
            _ => self.get(reg),
        }
    }

    pub fn write(&mut self, reg: Reg, val: u16) {
        match reg {
            Reg::Prs => self.prs_write(val),
            Reg::Pps | Reg::Lps => {
                let mask = reg.write_mask();
                self.set(reg, (self.get(reg) & !mask) | (val & mask));
            }
            Reg::Ppb | Reg::Lpb => self.buffer_write(reg, val),
            Reg::Prb => trace!("{reg}: ignoring write of {val:#o}, read-only"),
        }
    }

    fn prs_write(&mut self, val: u16) {
        let mut prs = (self.prs & !PRS_WRITE_MASK) | (val & PRS_WRITE_MASK);
        if prs & GO != 0 {
            prs = (prs & !DONE) | BUSY;
            self.prb = PRB_GO_FILL;
        }
        self.prs = prs;
    }

    fn buffer_write(&mut self, reg: Reg, val: u16) {
        let status = reg.status();
        if self.get(status) & DONE == 0 {
            warn!("{reg}: write of {val:#o} when not ready");
            return;
        }
        self.set(reg, val & BUFFER_MASK);
        self.set(status, self.get(status) & !DONE);
    }

    ///////////////////////////////////////////////////////////////////////////
    // Device side
    ///////////////////////////////////////////////////////////////////////////

    pub fn reader_enabled(&self) -> bool {
        self.prs & GO != 0
    }

    // A tape byte arrived, or None if the read failed.
    pub fn complete_read(&mut self, byte: Option<u8>) {
        let mut prs = (self.prs & !(GO | BUSY)) | DONE;
        match byte {
            Some(val) => self.prb = val as u16,
            None => prs |= ERROR,
        }
        self.prs = prs;
    }

    pub fn ready(&self, output: Output) -> bool {
        self.get(output.status()) & DONE != 0
    }

    // The byte waiting to go out, if the bus has queued one.
    pub fn pending(&self, output: Output) -> Option<u8> {
        if self.ready(output) {
            None
        } else {
            Some(self.get(output.buffer()) as u8)
        }
    }

    pub fn complete_output(&mut self, output: Output, ok: bool) {
        let status = output.status();
        let mut val = self.get(status) | DONE;
        if !ok {
            val |= ERROR;
        }
        self.set(status, val);
    }

    // Clears interrupt enable and errors, sets ready.
    pub fn reset_output(&mut self, output: Output) {
        self.set(output.status(), DONE);
    }

    pub fn reset_reader(&mut self) {
        self.prs = 0;
    }

    // Reader stopped, punch ready, printer ready.
    pub fn idle(&self) -> bool {
        !self.reader_enabled() && self.ready(Output::Punch) && self.ready(Output::Printer)
    }
}


// The registers as shared between the bus handler and the polling loop. Each
// access holds the lock for exactly one register operation.
#[derive(Default, Clone)]
pub struct SharedRegisters(Arc<Mutex<RegisterFile>>);

impl SharedRegisters {
    pub fn new() -> SharedRegisters {
        Default::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegisterFile> {
        self.0.lock().unwrap()
    }

    pub fn read(&self, reg: Reg) -> u16 {
        let val = self.lock().read(reg);
        trace!("Regs: read {val:#o} from {reg}");
        val
    }

    pub fn write(&self, reg: Reg, val: u16) {
        trace!("Regs: writing {val:#o} to {reg}");
        self.lock().write(reg, val);
    }

    pub fn request_reset(&self) {
        self.lock().set_resetting(true);
    }

    pub fn resetting(&self) -> bool {
        self.lock().resetting()
    }

    // Side-effect-free view of one register.
    pub fn peek(&self, reg: Reg) -> u16 {
        self.lock().get(reg)
    }

    pub fn snapshot(&self) -> RegisterFile {
        *self.lock()
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut RegisterFile) -> T) -> T {
        f(&mut self.lock())
    }
}
