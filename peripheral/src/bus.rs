use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use common::constants::{ACK, RESET_ADDR, WRITE_FLAG};
use common::mem::{lower_byte, upper_byte, word_from_bytes};
use common::regs::Reg;

use crate::error::{BusError, Phase};
use crate::registers::SharedRegisters;

use derive_more::IsVariant;
use log::{debug, info, trace, warn};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    // The master wrote bytes to us.
    Receive,
    // The master wants bytes back.
    Request,
    // Stop condition.
    Finish,
}

pub trait BusPort {
    fn read_available(&mut self) -> bool;
    fn read_byte(&mut self) -> Result<u8, BusError>;
    fn write_byte(&mut self, val: u8) -> Result<(), BusError>;

    fn is_closed(&self) -> bool {
        false
    }
}

// Activity light: off while a transaction is being handled.
pub trait Indicator: Send {
    fn set(&mut self, on: bool);
}

#[derive(Default, Clone, Copy)]
pub struct LogIndicator();

impl Indicator for LogIndicator {
    fn set(&mut self, on: bool) {
        trace!("Indicator: {}", if on { "on" } else { "off" });
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Command {
    Reset,
    Read(Reg),
    Write(Reg),
    // Not a register. Writes still carry a value, which is discarded.
    Unknown(u8),
}

impl Command {
    pub fn decode(addr: u8) -> Command {
        if addr == RESET_ADDR {
            return Command::Reset;
        }
        match Reg::from_addr(addr & !WRITE_FLAG) {
            Some(reg) if addr & WRITE_FLAG != 0 => Command::Write(reg),
            Some(reg) => Command::Read(reg),
            None => Command::Unknown(addr),
        }
    }

    fn has_value(addr: u8) -> bool {
        addr != RESET_ADDR && addr & WRITE_FLAG != 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Transaction {
    cmd: Command,
    value: u16,
}


pub struct BusHandler<I: Indicator> {
    regs: SharedRegisters,
    ctx: Option<Transaction>,
    byte_timeout: Duration,
    indicator: I,
}

impl<I: Indicator> BusHandler<I> {
    pub fn new(regs: SharedRegisters, byte_timeout: Duration, indicator: I) -> Self {
        BusHandler {
            regs,
            ctx: None,
            byte_timeout,
            indicator,
        }
    }

    pub fn handle(&mut self, port: &mut impl BusPort, event: BusEvent) -> Result<(), BusError> {
        match event {
            BusEvent::Receive => {
                self.indicator.set(false);
                let res = self.receive(port);
                self.indicator.set(true);
                res
            }
            BusEvent::Request => {
                self.indicator.set(false);
                let res = self.respond(port);
                self.indicator.set(true);
                res
            }
            BusEvent::Finish => {
                self.indicator.set(false);
                Ok(())
            }
        }
    }

    fn wait_byte(&self, port: &mut impl BusPort, phase: Phase) -> Result<u8, BusError> {
        let deadline = Instant::now() + self.byte_timeout;
        while !port.read_available() {
            if port.is_closed() {
                return Err(BusError::Closed);
            }
            if Instant::now() >= deadline {
                return Err(BusError::Timeout(phase));
            }
            std::hint::spin_loop();
        }
        port.read_byte()
    }

    fn receive(&mut self, port: &mut impl BusPort) -> Result<(), BusError> {
        self.ctx = None;

        let addr = self.wait_byte(port, Phase::Address)?;
        let cmd = Command::decode(addr);
        trace!("Bus: address {addr:#o} ({cmd:?})");

        if cmd.is_reset() {
            info!("Bus: reset requested");
            self.regs.request_reset();
        }

        let value = if Command::has_value(addr) {
            self.wait_word(port)
                .inspect_err(|e| warn!("Bus: dropping write to {addr:#o}: {e}"))?
        } else {
            0
        };

        self.ctx = Some(Transaction { cmd, value });
        Ok(())
    }

    // Low byte first.
    fn wait_word(&self, port: &mut impl BusPort) -> Result<u16, BusError> {
        let lower = self.wait_byte(port, Phase::ValueLow)?;
        let upper = self.wait_byte(port, Phase::ValueHigh)?;
        Ok(word_from_bytes(lower, upper))
    }

    fn respond(&mut self, port: &mut impl BusPort) -> Result<(), BusError> {
        let Some(Transaction { cmd, value }) = self.ctx else {
            return Ok(());
        };

        match cmd {
            Command::Read(reg) => {
                let val = self.regs.read(reg);
                port.write_byte(lower_byte(val))?;
                port.write_byte(upper_byte(val))?;
                port.write_byte(ACK)
            }
            Command::Write(reg) => {
                self.regs.write(reg, value);
                port.write_byte(ACK)
            }
            Command::Reset => Ok(()),
            Command::Unknown(addr) => {
                debug!("Bus: no register at {addr:#o}");
                Ok(())
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

// A byte stream standing in for the bus. A reader thread pumps incoming bytes
// into a channel so availability can be polled.
pub struct StreamPort<W: Write> {
    rx: Receiver<u8>,
    pending: Option<u8>,
    closed: bool,
    out: W,
}

impl<W: Write> StreamPort<W> {
    pub fn new<R: Read + Send + 'static>(input: R, out: W) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for byte in input.bytes() {
                match byte {
                    Ok(val) => {
                        if tx.send(val).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("Bus: input ended: {e}");
                        break;
                    }
                }
            }
        });

        StreamPort {
            rx,
            pending: None,
            closed: false,
            out,
        }
    }

    // Block until the master starts a transaction. False once the stream ends.
    pub fn wait_for_data(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        match self.rx.recv() {
            Ok(val) => {
                self.pending = Some(val);
                true
            }
            Err(_) => {
                self.closed = true;
                false
            }
        }
    }
}

impl<W: Write> BusPort for StreamPort<W> {
    fn read_available(&mut self) -> bool {
        if self.pending.is_none() {
            match self.rx.try_recv() {
                Ok(val) => self.pending = Some(val),
                Err(TryRecvError::Disconnected) => self.closed = true,
                Err(TryRecvError::Empty) => (),
            }
        }
        self.pending.is_some()
    }

    fn read_byte(&mut self) -> Result<u8, BusError> {
        if let Some(val) = self.pending.take() {
            return Ok(val);
        }
        self.rx.recv().map_err(|_| BusError::Closed)
    }

    fn write_byte(&mut self, val: u8) -> Result<(), BusError> {
        self.out.write_all(&[val])?;
        self.out.flush()?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed && self.pending.is_none()
    }
}


// Drive the handler from a stream until it closes. Every transaction is a
// receive, then a request, then a finish.
pub fn serve<I, W>(handler: &mut BusHandler<I>, port: &mut StreamPort<W>)
where
    I: Indicator,
    W: Write,
{
    while port.wait_for_data() {
        let res = handler
            .handle(port, BusEvent::Receive)
            .and_then(|_| handler.handle(port, BusEvent::Request));
        match res {
            Ok(()) => (),
            Err(BusError::Closed) => break,
            Err(e) => warn!("Bus: transaction dropped: {e}"),
        }
        let _ = handler.handle(port, BusEvent::Finish);
    }
    debug!("Bus: stream closed");
}

pub fn serve_tcp<I: Indicator>(handler: &mut BusHandler<I>, stream: TcpStream) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    let input = stream.try_clone()?;
    let mut port = StreamPort::new(input, stream);
    serve(handler, &mut port);
    Ok(())
}

// Accept masters one at a time on a background thread.
pub fn listen<I>(addr: impl ToSocketAddrs, mut handler: BusHandler<I>) -> std::io::Result<JoinHandle<()>>
where
    I: Indicator + 'static,
{
    let listener = TcpListener::bind(addr)?;
    info!("Bus: listening on {}", listener.local_addr()?);

    Ok(thread::spawn(move || {
        for stream in listener.incoming() {
            let res = stream.and_then(|stream| {
                debug!("Bus: master connected from {}", stream.peer_addr()?);
                serve_tcp(&mut handler, stream)
            });
            if let Err(e) = res {
                warn!("Bus: connection failed: {e}");
            }
        }
    }))
}
