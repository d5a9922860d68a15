use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use common::constants::{ACK, RESET_ADDR};
use common::mem::{ReadU16, WriteU16};
use common::regs::*;

use crate::error::{BusError, Phase};
use crate::registers::Output;

use log::{debug, trace};


// Drives the device the way a host driver would, over the wire protocol.
pub struct BusMaster<S: Read + Write> {
    stream: S,
    poll_interval: Duration,
    ready_timeout: Duration,
}

impl BusMaster<TcpStream> {
    pub fn connect(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(Self::DEFAULT_READY_TIMEOUT))?;
        Ok(Self::new(stream))
    }
}

impl<S: Read + Write> BusMaster<S> {
    pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(stream: S) -> Self {
        BusMaster {
            stream,
            poll_interval: Duration::from_millis(1),
            ready_timeout: Self::DEFAULT_READY_TIMEOUT,
        }
    }

    fn check_ack(&mut self) -> Result<(), BusError> {
        let mut ack = [0u8];
        self.stream.read_exact(&mut ack)?;
        if ack[0] != ACK {
            return Err(BusError::BadAck(ack[0]));
        }
        Ok(())
    }

    pub fn read(&mut self, reg: Reg) -> Result<u16, BusError> {
        self.stream.write_all(&[reg.addr()])?;
        self.stream.flush()?;
        let val = self.stream.read_u16()?;
        self.check_ack()?;
        trace!("Master: {reg} = {val:#o}");
        Ok(val)
    }

    pub fn write(&mut self, reg: Reg, val: u16) -> Result<(), BusError> {
        trace!("Master: {reg} <- {val:#o}");
        let mut frame = vec![reg.write_addr()];
        frame.write_u16(val)?;
        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        self.check_ack()
    }

    pub fn reset(&mut self) -> Result<(), BusError> {
        debug!("Master: reset");
        self.stream.write_all(&[RESET_ADDR])?;
        self.stream.flush()?;
        Ok(())
    }

    // Poll a status register until one of the mask bits comes up.
    pub fn wait_for(&mut self, reg: Reg, mask: u16) -> Result<u16, BusError> {
        let deadline = Instant::now() + self.ready_timeout;
        loop {
            let val = self.read(reg)?;
            if val & mask != 0 {
                return Ok(val);
            }
            if Instant::now() >= deadline {
                return Err(BusError::Timeout(Phase::DeviceReady));
            }
            thread::sleep(self.poll_interval);
        }
    }

    // Send bytes to the punch or the printer, one at a time as each is taken.
    pub fn output(&mut self, output: Output, data: &[u8]) -> Result<(), BusError> {
        let status = output.status();
        for val in data {
            let ready = self.wait_for(status, DONE)?;
            if ready & ERROR != 0 {
                return Err(BusError::Device(status));
            }
            self.write(output.buffer(), *val as u16)?;
        }
        let ready = self.wait_for(status, DONE)?;
        if ready & ERROR != 0 {
            return Err(BusError::Device(status));
        }
        Ok(())
    }

    pub fn punch(&mut self, data: &[u8]) -> Result<(), BusError> {
        self.output(Output::Punch, data)
    }

    pub fn print(&mut self, data: &[u8]) -> Result<(), BusError> {
        self.output(Output::Printer, data)
    }

    // Read tape bytes until the reader reports an error (end of tape) or
    // `max` bytes have arrived.
    pub fn read_tape(&mut self, max: usize) -> Result<Vec<u8>, BusError> {
        let mut data = vec![];
        while data.len() < max {
            self.write(Reg::Prs, GO)?;
            let status = self.wait_for(Reg::Prs, DONE | ERROR)?;
            if status & ERROR != 0 {
                debug!("Master: end of tape after {} bytes", data.len());
                break;
            }
            data.push(self.read(Reg::Prb)? as u8);
        }
        Ok(data)
    }
}
