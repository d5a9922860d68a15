use std::io::Stdout;
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

use pclp_lib::bus::{self, BusHandler, LogIndicator};
use pclp_lib::display::{Color, Display, Font, LogDisplay};
use pclp_lib::input::{Button, Buttons, NoButtons};
use pclp_lib::term::{TermButtons, TermDisplay, TermGuard};
use pclp_lib::{Config, DirStorage, Engine, FrontPanel, SharedRegisters};

use clap::Parser;
use delegate::delegate;
use log::error;


/// PC11 paper tape reader/punch and LP11 line printer, backed by files
#[derive(Parser)]
#[command(about)]
struct Args {
    /// Directory holding the tapes and the punch and printer output
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Address to accept bus masters on
    #[arg(long, default_value = "127.0.0.1:11050")]
    listen: String,

    /// Tape on the reader at start
    #[arg(long)]
    tape: Option<String>,

    /// Tapes per selector page
    #[arg(long, default_value_t = Config::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// How long the bus waits for each byte of a transaction
    #[arg(long, default_value_t = 50)]
    byte_timeout_ms: u64,

    /// Idle ticks before the tape position is redrawn
    #[arg(long, default_value_t = Config::DEFAULT_PROGRESS_TICKS)]
    progress_ticks: u64,

    /// Pause between polling loop iterations
    #[arg(long, default_value_t = 0)]
    tick_us: u64,

    /// No terminal panel; log panel output instead
    #[arg(long)]
    headless: bool,
}

enum HostDisplay {
    Term(TermDisplay<Stdout>),
    Log(LogDisplay),
}

impl Display for HostDisplay {
    delegate! {
        to match self {
            HostDisplay::Term(d) => d,
            HostDisplay::Log(d) => d,
        } {
            fn clear_screen(&mut self, color: Color);
            fn clear(&mut self, color: Color);
            fn set_foreground(&mut self, color: Color);
            fn draw_text(&mut self, x: u16, y: u16, text: &str, font: Font, bg: Color);
            fn draw_number(&mut self, x: u16, y: u16, val: u64, font: Font, bg: Color);
            fn flush_region(&mut self, x0: u16, y0: u16, x1: u16, y1: u16);
        }
    }
}

enum HostButtons {
    Term(TermButtons),
    None(NoButtons),
}

impl Buttons for HostButtons {
    delegate! {
        to match self {
            HostButtons::Term(b) => b,
            HostButtons::None(b) => b,
        } {
            fn poll(&mut self) -> Option<Button>;
            fn quit_requested(&self) -> bool;
        }
    }
}


fn main() {
    env_logger::init();

    let args = Args::parse();
    let mut config = Config::with_root(args.dir);
    config.page_size = args.page_size;
    config.progress_ticks = args.progress_ticks;
    config.byte_timeout = Duration::from_millis(args.byte_timeout_ms);
    if let Some(tape) = args.tape {
        config.default_tape = tape;
    }

    let regs = SharedRegisters::new();
    let handler = BusHandler::new(regs.clone(), config.byte_timeout, LogIndicator());
    if let Err(e) = bus::listen(args.listen.as_str(), handler) {
        eprintln!("Unable to listen on {}: {e}", args.listen);
        exit(1);
    }

    let (display, buttons, _guard) = if args.headless {
        (HostDisplay::Log(LogDisplay::default()), HostButtons::None(NoButtons()), None)
    } else {
        let guard = TermGuard::enter().unwrap_or_else(|e| {
            eprintln!("Unable to set up terminal: {e}");
            exit(1);
        });
        (HostDisplay::Term(TermDisplay::stdout()), HostButtons::Term(TermButtons::default()), Some(guard))
    };

    let engine = Engine::new(DirStorage::new(&config.root), regs, &config);
    let mut panel = FrontPanel::new(engine, display, buttons, &config);

    if let Err(e) = panel.start() {
        error!("{e}");
        panel.fault(&mut LogIndicator());
        return;
    }

    if args.tick_us == 0 {
        panel.run();
    } else {
        panel.run_paced(Duration::from_micros(args.tick_us));
    }
}
