use std::io::{self, Write};
use std::time::Duration;

use crate::display::{Color, Display, Font, Panel, TextRow};
use crate::input::{Button, Buttons};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use log::error;


fn term_color(color: Color) -> style::Color {
    let (r, g, b) = color.to_rgb();
    style::Color::Rgb { r, g, b }
}

// Puts the terminal in raw mode on an alternate screen until dropped.
pub struct TermGuard();

impl TermGuard {
    pub fn enter() -> io::Result<TermGuard> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(TermGuard())
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

////////////////////////////////////////////////////////////////////////////////

// Each 32px panel row is one terminal line.
pub struct TermDisplay<W: Write> {
    out: W,
    fg: Color,
    bg: Color,
    row: TextRow,
}

impl TermDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TermDisplay<W> {
    pub fn new(out: W) -> Self {
        TermDisplay {
            out,
            fg: Color::WHITE,
            bg: Color::SCREEN_BG,
            row: TextRow::default(),
        }
    }

    fn push_row(&mut self, line: u16) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(0, line),
            SetBackgroundColor(term_color(self.bg)),
            SetForegroundColor(term_color(self.fg)),
            Clear(ClearType::CurrentLine),
            Print(self.row.render()),
            ResetColor,
        )?;
        self.out.flush()
    }
}

impl<W: Write> Display for TermDisplay<W> {
    fn clear_screen(&mut self, color: Color) {
        let res = execute!(self.out, SetBackgroundColor(term_color(color)), Clear(ClearType::All), ResetColor);
        if let Err(e) = res {
            error!("Display: clear failed: {e}");
        }
    }

    fn clear(&mut self, color: Color) {
        self.bg = color;
        self.row.clear();
    }

    fn set_foreground(&mut self, color: Color) {
        self.fg = color;
    }

    fn draw_text(&mut self, x: u16, _y: u16, text: &str, _font: Font, bg: Color) {
        self.bg = bg;
        self.row.put(x, text);
    }

    fn draw_number(&mut self, x: u16, y: u16, val: u64, font: Font, bg: Color) {
        self.draw_text(x, y, &val.to_string(), font, bg);
    }

    fn flush_region(&mut self, _x0: u16, y0: u16, _x1: u16, _y1: u16) {
        let line = y0 / Panel::<Self>::ROW_HEIGHT;
        if let Err(e) = self.push_row(line) {
            error!("Display: flush of row {line} failed: {e}");
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

// Keyboard stand-ins for the panel buttons. A key press reads as the button
// being held for a single poll.
#[derive(Default)]
pub struct TermButtons {
    quit: bool,
}

impl TermButtons {
    fn map(code: KeyCode) -> Option<Button> {
        match code {
            KeyCode::Up => Some(Button::Up),
            KeyCode::Down => Some(Button::Down),
            KeyCode::Left => Some(Button::Left),
            KeyCode::Right => Some(Button::Right),
            KeyCode::Enter => Some(Button::Ctrl),
            KeyCode::Char('a') => Some(Button::A),
            KeyCode::Char('b') => Some(Button::B),
            KeyCode::Char('x') => Some(Button::X),
            KeyCode::Char('y') => Some(Button::Y),
            _ => None,
        }
    }
}

impl Buttons for TermButtons {
    fn poll(&mut self) -> Option<Button> {
        match event::poll(Duration::ZERO) {
            Ok(true) => (),
            Ok(false) => return None,
            Err(e) => {
                error!("Buttons: poll failed: {e}");
                return None;
            }
        }

        match event::read() {
            Ok(Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. })) => {
                let ctrl_c = code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL);
                if ctrl_c || code == KeyCode::Char('q') {
                    self.quit = true;
                    return None;
                }
                Self::map(code)
            }
            Ok(_) => None,
            Err(e) => {
                error!("Buttons: read failed: {e}");
                None
            }
        }
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}
