pub mod bus;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod front_panel;
pub mod input;
pub mod master;
pub mod registers;
pub mod storage;
pub mod tapes;
pub mod term;

pub use bus::{BusHandler, BusEvent, BusPort, Indicator};
pub use config::Config;
pub use engine::{Engine, Notice, TapeBinding};
pub use error::{BusError, StorageError};
pub use front_panel::FrontPanel;
pub use master::BusMaster;
pub use registers::{Output, RegisterFile, SharedRegisters};
pub use storage::{DirStorage, OpenMode, Storage, StorageFile};
pub use tapes::TapeCatalog;
