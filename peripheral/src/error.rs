use std::io;
use std::path::PathBuf;

use common::regs::Reg;
use derive_more::Display;
use thiserror::Error;


#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unable to mount {path:?}: {source}")]
    Mount { path: PathBuf, source: io::Error },

    #[error("Storage is not mounted")]
    NotMounted,

    #[error("Invalid file name {0:?}")]
    InvalidName(String),

    #[error("No files match {0}")]
    NoMatches(String),

    #[error("No {0} file is open")]
    NotOpen(&'static str),

    #[error("Short {op} on {name}")]
    Short { op: &'static str, name: String },

    #[error("Unable to {op} {name}: {source}")]
    Io { op: &'static str, name: String, source: io::Error },
}

impl StorageError {
    pub fn io(op: &'static str, name: &str, source: io::Error) -> Self {
        StorageError::Io { op, name: name.to_string(), source }
    }
}


// Where in a transaction the bus was when something went wrong.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[display(fmt = "address byte")]
    Address,
    #[display(fmt = "value low byte")]
    ValueLow,
    #[display(fmt = "value high byte")]
    ValueHigh,
    #[display(fmt = "device ready")]
    DeviceReady,
}


#[derive(Debug, Error)]
pub enum BusError {
    #[error("Timed out waiting for {0}")]
    Timeout(Phase),

    #[error("Bus connection closed")]
    Closed,

    #[error("Bad acknowledgment {0:#o}")]
    BadAck(u8),

    #[error("{0} reports an error")]
    Device(Reg),

    #[error(transparent)]
    Io(#[from] io::Error),
}
