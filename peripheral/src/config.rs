use std::path::PathBuf;
use std::time::Duration;


#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the tape collection and the output files.
    pub root: PathBuf,

    /// Tapes offered by the selector.
    pub tape_pattern: String,

    /// Tape bound to the reader at power on.
    pub default_tape: String,

    pub punch_file: String,
    pub printer_file: String,

    /// Tapes listed per selector page.
    pub page_size: usize,

    /// Idle ticks between progress refreshes after the reader moves.
    pub progress_ticks: u64,

    /// How long the bus waits for each byte of a transaction.
    pub byte_timeout: Duration,
}

impl Config {
    pub const DEFAULT_PAGE_SIZE: usize = 7;
    pub const DEFAULT_PROGRESS_TICKS: u64 = 10_000_000;
    pub const DEFAULT_BYTE_TIMEOUT: Duration = Duration::from_millis(50);

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Config {
            root: root.into(),
            ..Default::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: PathBuf::from("."),
            tape_pattern: "*.TAP".to_string(),
            default_tape: "PTR.TAP".to_string(),
            punch_file: "PTP.TAP".to_string(),
            printer_file: "PRT.TXT".to_string(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            progress_ticks: Self::DEFAULT_PROGRESS_TICKS,
            byte_timeout: Self::DEFAULT_BYTE_TIMEOUT,
        }
    }
}
