use std::path::PathBuf;
use std::process::exit;

use common::regs::Reg;
use pclp_lib::BusMaster;

use clap::{Parser, Subcommand};


/// Talk to a PC11/LP11 peripheral as its bus master
#[derive(Parser)]
#[command(about)]
struct Args {
    /// Address of the peripheral
    #[arg(long, default_value = "127.0.0.1:11050")]
    connect: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Read a register (LPS, LPB, PRS, PRB, PPS, PPB)
    Read { reg: Reg },

    /// Write an octal value to a register
    Write {
        reg: Reg,
        #[arg(value_parser = parse_octal)]
        value: u16,
    },

    /// Reset both devices
    Reset,

    /// Punch the contents of a file
    Punch { file: PathBuf },

    /// Print the contents of a file
    Print { file: PathBuf },

    /// Read the tape, writing it to a file or to stdout as octal
    ReadTape {
        /// Stop after this many bytes
        #[arg(long, default_value_t = usize::MAX)]
        max: usize,

        out: Option<PathBuf>,
    },
}

fn parse_octal(s: &str) -> Result<u16, String> {
    u16::from_str_radix(s.trim_start_matches("0o"), 8).map_err(|e| format!("{s}: {e}"))
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    exit(1);
}


fn main() {
    env_logger::init();

    let args = Args::parse();
    let mut master = BusMaster::connect(args.connect.as_str())
        .unwrap_or_else(|e| fail(format!("Unable to connect to {}: {e}", args.connect)));

    let res = match args.cmd {
        Cmd::Read { reg } => master.read(reg).map(|val| println!("{reg}: {val:06o}")),
        Cmd::Write { reg, value } => master.write(reg, value),
        Cmd::Reset => master.reset(),
        Cmd::Punch { file } => {
            let data = std::fs::read(&file).unwrap_or_else(|e| fail(format!("{file:?}: {e}")));
            master.punch(&data)
        }
        Cmd::Print { file } => {
            let data = std::fs::read(&file).unwrap_or_else(|e| fail(format!("{file:?}: {e}")));
            master.print(&data)
        }
        Cmd::ReadTape { max, out } => master.read_tape(max).map(|data| match out {
            Some(path) => std::fs::write(&path, &data).unwrap_or_else(|e| fail(format!("{path:?}: {e}"))),
            None => {
                for line in data.chunks(8) {
                    let words: Vec<String> = line.iter().map(|val| format!("{val:03o}")).collect();
                    println!("{}", words.join(" "));
                }
            }
        }),
    };

    if let Err(e) = res {
        fail(e);
    }
}
