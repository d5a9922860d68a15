use crate::config::Config;
use crate::error::StorageError;
use crate::registers::{Output, SharedRegisters};
use crate::storage::{OpenMode, Storage, StorageFile};

use log::{debug, error, info, trace};


// Things the front panel should show. The engine never draws directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(&'static str),
    Progress { size: u64, pos: u64 },
}

// The tape on the reader. `delivered` is informational; the file's own
// cursor is the real position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapeBinding {
    pub name: String,
    pub size: u64,
    pub delivered: u64,
}


pub struct Engine<S: Storage> {
    storage: S,
    regs: SharedRegisters,

    binding: TapeBinding,
    tape: Option<S::File>,
    punch: Option<S::File>,
    printer: Option<S::File>,

    punch_name: String,
    printer_name: String,

    progress_ticks: u64,
    idle_ticks: u64,
    transferred: bool,

    notices: Vec<Notice>,
}

impl<S: Storage> Engine<S> {
    pub fn new(storage: S, regs: SharedRegisters, config: &Config) -> Self {
        Engine {
            storage,
            regs,
            binding: TapeBinding {
                name: config.default_tape.clone(),
                ..Default::default()
            },
            tape: None,
            punch: None,
            printer: None,
            punch_name: config.punch_file.clone(),
            printer_name: config.printer_file.clone(),
            progress_ticks: config.progress_ticks,
            idle_ticks: 0,
            transferred: false,
            notices: vec![],
        }
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn binding(&self) -> &TapeBinding {
        &self.binding
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        debug!("Engine: {notice:?}");
        self.notices.push(notice);
    }

    fn progress(&mut self) {
        let notice = Notice::Progress { size: self.binding.size, pos: self.binding.delivered };
        self.notify(notice);
    }

    // One pass of the polling loop: at most one byte per device.
    pub fn tick(&mut self) {
        if self.regs.resetting() {
            self.reset();
            return;
        }

        self.refresh_progress();
        self.step_reader();
        self.step_output(Output::Punch);
        self.step_output(Output::Printer);
    }

    // Showing progress is slow, so only do it once things have been quiet for
    // a while after the reader moved.
    fn refresh_progress(&mut self) {
        if !self.transferred || !self.regs.snapshot().idle() {
            return;
        }
        self.idle_ticks += 1;
        if self.idle_ticks > self.progress_ticks {
            self.idle_ticks = 0;
            self.transferred = false;
            self.progress();
        }
    }

    fn step_reader(&mut self) {
        if !self.regs.update(|r| r.reader_enabled()) {
            return;
        }

        let mut buf = [0u8; 1];
        let res = match self.tape.as_mut() {
            Some(tape) => tape.read(&mut buf),
            None => Err(StorageError::NotOpen("tape")),
        };

        let byte = match res {
            Ok(1) => {
                self.binding.delivered += 1;
                self.transferred = true;
                trace!("Engine: tape byte {:#o} at {}", buf[0], self.binding.delivered - 1);
                Some(buf[0])
            }
            Ok(_) => {
                debug!("Engine: end of tape {} after {} bytes", self.binding.name, self.binding.delivered);
                None
            }
            Err(e) => {
                error!("Engine: tape read failed: {e}");
                None
            }
        };

        self.regs.update(|r| r.complete_read(byte));
    }

    fn step_output(&mut self, output: Output) {
        let Some(val) = self.regs.update(|r| r.pending(output)) else {
            return;
        };

        let file = match output {
            Output::Punch => self.punch.as_mut(),
            Output::Printer => self.printer.as_mut(),
        };
        let res = match file {
            Some(file) => write_synced(file, val, output),
            None => Err(StorageError::NotOpen(output_label(output))),
        };
        if let Err(e) = &res {
            error!("Engine: {} write failed: {e}", output_label(output));
        }

        self.regs.update(|r| r.complete_output(output, res.is_ok()));
    }

    ///////////////////////////////////////////////////////////////////////////
    // Reset
    ///////////////////////////////////////////////////////////////////////////

    // Reset both devices: empty the output files, rewind the tape. Safe to
    // repeat while the reset flag stays up.
    pub fn reset(&mut self) {
        info!("Engine: reset");
        self.regs.update(|r| {
            r.set_resetting(true);
            r.reset_output(Output::Punch);
            r.reset_output(Output::Printer);
        });

        self.punch = None;
        self.punch = self.recreate(Output::Punch, "PTP OPEN ERR");
        self.printer = None;
        self.printer = self.recreate(Output::Printer, "PRT OPEN ERR");

        self.reopen_tape();

        self.regs.update(|r| r.set_resetting(false));
    }

    fn recreate(&mut self, output: Output, msg: &'static str) -> Option<S::File> {
        let name = match output {
            Output::Punch => self.punch_name.clone(),
            Output::Printer => self.printer_name.clone(),
        };
        let res = self.storage.open(&name, OpenMode::CreateTruncate).and_then(|mut file| {
            file.seek(0)?;
            file.truncate()?;
            Ok(file)
        });
        match res {
            Ok(file) => Some(file),
            Err(e) => {
                error!("Engine: {} reset failed: {e}", output_label(output));
                self.notify(Notice::Error(msg));
                None
            }
        }
    }

    // Close the tape and open the bound name again from the start.
    pub fn reopen_tape(&mut self) {
        self.regs.update(|r| r.reset_reader());
        self.tape = None;
        self.binding.size = 0;
        self.binding.delivered = 0;
        self.idle_ticks = 0;
        self.transferred = false;

        let name = self.binding.name.clone();
        let mut tape = match self.storage.open(&name, OpenMode::Read) {
            Ok(tape) => tape,
            Err(e) => {
                error!("Engine: unable to open tape: {e}");
                self.notify(Notice::Error("PTR OPEN ERR"));
                return;
            }
        };
        if let Err(e) = tape.seek(0) {
            error!("Engine: unable to rewind tape: {e}");
        }
        self.tape = Some(tape);

        match self.storage.stat(&name) {
            Ok(size) => {
                info!("Engine: tape {name} mounted, {size} bytes");
                self.binding.size = size;
                self.progress();
            }
            Err(e) => {
                error!("Engine: unable to stat tape: {e}");
                self.notify(Notice::Error("PTR STAT ERR"));
            }
        }
    }

    // Bind another tape. Holds the reset flag while the tape changes so the
    // bus sees the reader busy. A reset the bus asked for in the meantime
    // stays pending for the next tick.
    pub fn select_tape(&mut self, name: &str) {
        info!("Engine: selecting tape {name}");
        self.binding.name = name.to_string();
        let pending = self.regs.update(|r| {
            let pending = r.resetting();
            r.set_resetting(true);
            pending
        });
        self.reopen_tape();
        self.regs.update(|r| r.set_resetting(pending));
    }
}

fn output_label(output: Output) -> &'static str {
    match output {
        Output::Punch => "punch",
        Output::Printer => "printer",
    }
}

fn write_synced(file: &mut impl StorageFile, val: u8, output: Output) -> Result<(), StorageError> {
    if file.write(&[val])? != 1 {
        return Err(StorageError::Short { op: "write", name: output_label(output).to_string() });
    }
    file.sync()
}
