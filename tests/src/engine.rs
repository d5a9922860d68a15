use crate::fakes::Fixture;

use common::regs::*;
use pclp_lib::{Notice, Output};

use std::fs;


#[test]
fn reader_three_byte_tape() {
    let fx = Fixture::new(&[("PTR.TAP", &[0o1, 0o377, 0o52])]);
    let mut engine = fx.engine();
    assert_eq!(engine.binding().size, 3);

    for expected in [0o1, 0o377, 0o52] {
        fx.regs.write(Reg::Prs, GO);
        let prs = fx.regs.peek(Reg::Prs);
        assert_eq!(prs & (BUSY | DONE), BUSY);

        engine.tick();
        assert_eq!(fx.regs.peek(Reg::Prs), DONE);
        assert_eq!(fx.regs.read(Reg::Prb), expected);
        assert_eq!(fx.regs.peek(Reg::Prs) & DONE, 0);
    }
    assert_eq!(engine.binding().delivered, 3);

    // Past the end of the tape.
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.regs.peek(Reg::Prs), ERROR | DONE);
    assert_eq!(engine.binding().delivered, 3);
}

#[test]
fn reader_waits_for_go() {
    let fx = Fixture::new(&[("PTR.TAP", b"abc")]);
    let mut engine = fx.engine();
    for _ in 0..10 {
        engine.tick();
    }
    assert_eq!(fx.regs.peek(Reg::Prs), 0);
    assert_eq!(engine.binding().delivered, 0);
}

#[test]
fn one_byte_per_tick() {
    let fx = Fixture::new(&[("PTR.TAP", b"xy")]);
    let mut engine = fx.engine();
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    engine.tick();
    assert_eq!(engine.binding().delivered, 1);
    assert_eq!(fx.regs.read(Reg::Prb), b'x' as u16);
}

#[test]
fn interrupt_enable_survives_read() {
    let fx = Fixture::new(&[("PTR.TAP", b"z")]);
    let mut engine = fx.engine();
    fx.regs.write(Reg::Prs, INT_ENB | GO);
    engine.tick();
    assert_eq!(fx.regs.peek(Reg::Prs), INT_ENB | DONE);
}

fn output_round_trip(output: Output, file: &str) {
    let fx = Fixture::new(&[]);
    let mut engine = fx.engine();
    let data = b"\x00PDP-11\r\n\xff";

    for val in data {
        assert_ne!(fx.regs.read(output.status()) & DONE, 0);
        fx.regs.write(output.buffer(), *val as u16);
        assert_eq!(fx.regs.read(output.status()) & DONE, 0);
        engine.tick();
    }
    assert_eq!(fx.regs.read(output.status()), DONE);
    assert_eq!(fx.read(file), data);
}

#[test]
fn punch_round_trip() {
    output_round_trip(Output::Punch, "PTP.TAP");
}

#[test]
fn printer_round_trip() {
    output_round_trip(Output::Printer, "PRT.TXT");
}

#[test]
fn output_write_while_busy_dropped() {
    let fx = Fixture::new(&[]);
    let mut engine = fx.engine();
    fx.regs.write(Reg::Lpb, b'A' as u16);
    fx.regs.write(Reg::Lpb, b'B' as u16);
    engine.tick();
    engine.tick();
    assert_eq!(fx.read("PRT.TXT"), b"A");
}

#[test]
fn punch_open_failure_sets_error() {
    let fx = Fixture::new(&[]);
    fs::create_dir(fx.path("PTP.TAP")).unwrap();

    let mut engine = fx.engine();
    engine.reset();
    assert!(engine.take_notices().contains(&Notice::Error("PTP OPEN ERR")));

    fx.regs.write(Reg::Ppb, 0o101);
    engine.tick();
    assert_eq!(fx.regs.peek(Reg::Pps), ERROR | DONE);

    // The printer is unaffected.
    fx.regs.write(Reg::Lpb, 0o101);
    engine.tick();
    assert_eq!(fx.regs.peek(Reg::Lps), DONE);
}

#[test]
fn reset_is_idempotent() {
    let fx = Fixture::new(&[("PTR.TAP", b"tape")]);
    let mut engine = fx.engine();

    fx.regs.write(Reg::Ppb, b'p' as u16);
    fx.regs.write(Reg::Lpb, b'l' as u16);
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    fx.regs.write(Reg::Pps, INT_ENB);
    assert_eq!(fx.read("PTP.TAP"), b"p");
    assert_eq!(engine.binding().delivered, 1);

    fx.regs.request_reset();
    engine.tick();
    let once = fx.regs.snapshot();
    let binding = engine.binding().clone();

    fx.regs.request_reset();
    engine.tick();
    assert_eq!(fx.regs.snapshot(), once);
    assert_eq!(engine.binding(), &binding);

    assert!(!once.resetting());
    assert_eq!(once.get(Reg::Prs), 0);
    assert_eq!(once.get(Reg::Pps), DONE);
    assert_eq!(once.get(Reg::Lps), DONE);
    assert!(fx.read("PTP.TAP").is_empty());
    assert!(fx.read("PRT.TXT").is_empty());
    assert_eq!(binding.delivered, 0);
    assert_eq!(binding.size, 4);

    // Back at the start of the tape.
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.regs.read(Reg::Prb), b't' as u16);
}

#[test]
fn reset_masks_status() {
    let fx = Fixture::new(&[("PTR.TAP", b"t")]);
    let mut engine = fx.engine();
    fx.regs.write(Reg::Prs, INT_ENB);

    fx.regs.request_reset();
    assert_eq!(fx.regs.read(Reg::Prs), PRS_RESET_VALUE);
    assert_eq!(fx.regs.read(Reg::Pps), PPS_RESET_VALUE);

    // No I/O on the reset tick.
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(engine.binding().delivered, 0);
    assert_eq!(fx.regs.read(Reg::Prs), 0);
}

#[test]
fn missing_tape_reads_as_error() {
    let fx = Fixture::new(&[]);
    let mut engine = fx.engine();
    engine.select_tape("GONE.TAP");
    assert_eq!(engine.binding().name, "GONE.TAP");
    assert_eq!(engine.binding().size, 0);

    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.regs.peek(Reg::Prs), ERROR | DONE);
}

#[test]
fn unopenable_tape_reads_as_error() {
    let fx = Fixture::new(&[]);
    let mut engine = fx.engine();
    engine.select_tape("../OUTSIDE.TAP");
    assert_eq!(engine.take_notices(), [Notice::Error("PTR OPEN ERR")]);
    assert!(!fx.regs.resetting());

    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.regs.peek(Reg::Prs), ERROR | DONE);
}

#[test]
fn select_tape_rebinds() {
    let fx = Fixture::new(&[("PTR.TAP", b"a"), ("OTHER.TAP", b"bc")]);
    let mut engine = fx.engine();
    fx.regs.write(Reg::Prs, GO);
    engine.tick();

    engine.select_tape("OTHER.TAP");
    assert_eq!(engine.take_notices(), [Notice::Progress { size: 2, pos: 0 }]);
    assert_eq!(fx.regs.peek(Reg::Prs), 0);

    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.regs.read(Reg::Prb), b'b' as u16);
}

#[test]
fn progress_after_idle() {
    let mut fx = Fixture::new(&[("PTR.TAP", b"abc")]);
    fx.config.progress_ticks = 3;
    let mut engine = fx.engine();

    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    for _ in 0..3 {
        engine.tick();
    }
    assert!(engine.take_notices().is_empty());

    engine.tick();
    assert_eq!(engine.take_notices(), [Notice::Progress { size: 3, pos: 1 }]);

    // Nothing new moved.
    for _ in 0..10 {
        engine.tick();
    }
    assert!(engine.take_notices().is_empty());
}

#[test]
fn progress_waits_for_idle() {
    let mut fx = Fixture::new(&[("PTR.TAP", b"abc")]);
    fx.config.progress_ticks = 1;
    let mut engine = fx.engine();

    fx.regs.write(Reg::Prs, GO);
    engine.tick();

    // A byte pending on the punch holds off the count for a tick.
    fx.regs.write(Reg::Ppb, 1);
    engine.tick();
    engine.tick();
    assert!(engine.take_notices().is_empty());

    engine.tick();
    assert_eq!(engine.take_notices(), [Notice::Progress { size: 3, pos: 1 }]);
}

#[test]
fn reset_survives_tape_change() {
    let fx = Fixture::new(&[("PTR.TAP", b"a"), ("OTHER.TAP", b"bc")]);
    let mut engine = fx.engine();
    fx.regs.write(Reg::Ppb, b'p' as u16);
    engine.tick();
    assert_eq!(fx.read("PTP.TAP"), b"p");

    // The bus asks for a reset, then the operator confirms a tape before the
    // next tick.
    fx.regs.request_reset();
    engine.select_tape("OTHER.TAP");
    assert!(fx.regs.resetting());
    assert_eq!(engine.binding().name, "OTHER.TAP");

    engine.tick();
    assert!(!fx.regs.resetting());
    assert!(fx.read("PTP.TAP").is_empty());
    assert_eq!(fx.regs.peek(Reg::Pps), DONE);
    assert_eq!(engine.binding().name, "OTHER.TAP");
    assert_eq!(engine.binding().size, 2);

    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.regs.read(Reg::Prb), b'b' as u16);
}

#[test]
fn tape_change_without_reset_clears_flag() {
    let fx = Fixture::new(&[("OTHER.TAP", b"bc")]);
    let mut engine = fx.engine();
    engine.select_tape("OTHER.TAP");
    assert!(!fx.regs.resetting());
}

#[test]
fn reset_requested_before_reset() {
    let fx = Fixture::new(&[("PTR.TAP", b"ab")]);
    let mut engine = fx.engine();
    fx.regs.write(Reg::Lpb, b'l' as u16);
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.read("PRT.TXT"), b"l");

    fx.regs.request_reset();
    engine.reset();
    assert!(!fx.regs.resetting());
    assert!(fx.read("PRT.TXT").is_empty());
    assert_eq!(fx.regs.peek(Reg::Lps), DONE);
    assert_eq!(engine.binding().delivered, 0);

    // Nothing left over for the next tick to redo.
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.regs.read(Reg::Prb), b'a' as u16);
    assert_eq!(engine.binding().delivered, 1);
}

#[test]
fn interrupt_enable_set_mid_read() {
    let fx = Fixture::new(&[("PTR.TAP", b"q")]);
    let mut engine = fx.hooked_engine(|regs| regs.write(Reg::Prs, INT_ENB));
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(fx.regs.peek(Reg::Prs), INT_ENB | DONE);
    assert_eq!(fx.regs.read(Reg::Prb), b'q' as u16);
}

#[test]
fn reset_requested_mid_read() {
    let fx = Fixture::new(&[("PTR.TAP", b"qr")]);
    let mut engine = fx.hooked_engine(|regs| regs.request_reset());
    fx.regs.write(Reg::Prs, GO);
    engine.tick();
    assert_eq!(engine.binding().delivered, 1);
    assert!(fx.regs.resetting());

    engine.tick();
    assert!(!fx.regs.resetting());
    assert_eq!(engine.binding().delivered, 0);
    assert_eq!(fx.regs.peek(Reg::Prs), 0);
}
