use log::info;


// RGB565, as the panel takes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u16);

impl Color {
    pub const WHITE: Color = Color(0xffff);
    pub const BLACK: Color = Color(0x0000);
    pub const RED: Color = Color(0xf800);
    pub const YELLOW: Color = Color(0xffe0);
    pub const SCREEN_BG: Color = Color(0x01e0);

    pub fn to_rgb(self) -> (u8, u8, u8) {
        let r = ((self.0 >> 11) & 0x1f) << 3;
        let g = ((self.0 >> 5) & 0x3f) << 2;
        let b = (self.0 & 0x1f) << 3;
        (r as u8, g as u8, b as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Small, // 16px
    Large, // 24px
}

// Drawing happens into a one-row scratch image which flush_region() then
// pushes to a region of the panel.
pub trait Display {
    fn clear_screen(&mut self, color: Color);

    fn clear(&mut self, color: Color);
    fn set_foreground(&mut self, color: Color);
    fn draw_text(&mut self, x: u16, y: u16, text: &str, font: Font, bg: Color);
    fn draw_number(&mut self, x: u16, y: u16, val: u64, font: Font, bg: Color);
    fn flush_region(&mut self, x0: u16, y0: u16, x1: u16, y1: u16);
}

////////////////////////////////////////////////////////////////////////////////

// Text placed in the scratch row, for displays that only show characters.
#[derive(Default, Debug, Clone)]
pub struct TextRow {
    pieces: Vec<(u16, String)>,
}

impl TextRow {
    // Pixels per character column.
    pub const CHAR_WIDTH: u16 = 8;

    pub fn clear(&mut self) {
        self.pieces.clear();
    }

    pub fn put(&mut self, x: u16, text: &str) {
        self.pieces.push((x / Self::CHAR_WIDTH, text.to_string()));
    }

    pub fn render(&self) -> String {
        let mut line = String::new();
        for (col, text) in &self.pieces {
            let col = *col as usize;
            if line.len() < col {
                line.extend(std::iter::repeat_n(' ', col - line.len()));
            } else if line.len() > col {
                line.push(' ');
            }
            line.push_str(text);
        }
        line
    }
}


// Headless display: every flushed region becomes a log line.
#[derive(Default)]
pub struct LogDisplay {
    row: TextRow,
}

impl LogDisplay {
    // The row as it would be logged by the next flush.
    pub fn line(&self) -> String {
        self.row.render()
    }
}

impl Display for LogDisplay {
    fn clear_screen(&mut self, _color: Color) {}

    fn clear(&mut self, _color: Color) {
        self.row.clear();
    }

    fn set_foreground(&mut self, _color: Color) {}

    fn draw_text(&mut self, x: u16, _y: u16, text: &str, _font: Font, _bg: Color) {
        self.row.put(x, text);
    }

    fn draw_number(&mut self, x: u16, _y: u16, val: u64, _font: Font, _bg: Color) {
        self.row.put(x, &val.to_string());
    }

    fn flush_region(&mut self, _x0: u16, y0: u16, _x1: u16, _y1: u16) {
        info!("Panel row {}: {}", y0 / Panel::<Self>::ROW_HEIGHT, self.line());
    }
}

////////////////////////////////////////////////////////////////////////////////

pub struct Panel<D: Display> {
    display: D,
}

impl<D: Display> Panel<D> {
    pub const ROW_HEIGHT: u16 = 32;
    const LEFT: u16 = 8;
    const RIGHT: u16 = 232;
    const TEXT_X: u16 = 10;
    const TEXT_Y: u16 = 6;

    const TAPE_NAME_ROW: u16 = 104;
    const PROGRESS_ROW: u16 = 168;

    // Fits a 24px line.
    pub const MAX_MESSAGE: usize = 12;
    const MAX_NAME: usize = 9;

    pub fn new(display: D) -> Self {
        Panel { display }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn clear_screen(&mut self) {
        self.display.clear_screen(Color::SCREEN_BG);
    }

    pub fn show_error(&mut self, msg: &str) {
        let msg: String = msg.chars().take(Self::MAX_MESSAGE).collect();
        self.display.clear(Color::RED);
        self.display.set_foreground(Color::WHITE);
        self.display.draw_text(Self::TEXT_X, Self::TEXT_Y, &msg, Font::Large, Color::RED);
        self.flush_row(Self::TAPE_NAME_ROW);
    }

    pub fn show_tape_name(&mut self, name: &str) {
        self.display.clear(Color::BLACK);
        self.display.set_foreground(Color::WHITE);
        self.display.draw_text(Self::TEXT_X, Self::TEXT_Y, short_name(name), Font::Large, Color::BLACK);
        self.flush_row(Self::TAPE_NAME_ROW);
    }

    pub fn show_progress(&mut self, size: u64, pos: u64) {
        let bg = Color::SCREEN_BG;
        self.display.clear(bg);
        self.display.set_foreground(Color::WHITE);
        self.display.draw_text(Self::TEXT_X, Self::TEXT_Y, "pos", Font::Small, bg);
        self.display.draw_number(64, Self::TEXT_Y, size, Font::Small, bg);
        self.display.draw_number(150, Self::TEXT_Y, pos, Font::Small, bg);
        self.flush_row(Self::PROGRESS_ROW);
    }

    pub fn show_list_item(&mut self, slot: usize, name: &str, selected: bool) {
        let (bg, fg) = if selected {
            (Color::BLACK, Color::WHITE)
        } else {
            (Color::SCREEN_BG, Color::YELLOW)
        };
        self.display.clear(bg);
        self.display.set_foreground(fg);
        self.display.draw_text(Self::TEXT_X, Self::TEXT_Y, short_name(name), Font::Large, bg);
        self.flush_row(slot as u16 * Self::ROW_HEIGHT);
    }

    fn flush_row(&mut self, y: u16) {
        self.display.flush_region(Self::LEFT, y, Self::RIGHT, y + Self::ROW_HEIGHT);
    }
}

// Tape names are shown without their extension.
pub fn short_name(name: &str) -> &str {
    let stem = match name.find(".TAP") {
        Some(end) => &name[..end],
        None => name,
    };
    match stem.char_indices().nth(Panel::<LogDisplay>::MAX_NAME) {
        Some((end, _)) => &stem[..end],
        None => stem,
    }
}
