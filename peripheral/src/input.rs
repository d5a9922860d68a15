use log::trace;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Up,
    Down,
    Left,
    Right,
    Ctrl,
}

// What the tape selector and front panel do in response to a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Rescan,
    Previous,
    Next,
    Confirm,
    Remount,
}

impl Button {
    pub fn action(self) -> PanelAction {
        match self {
            Button::Left | Button::Right => PanelAction::Rescan,
            Button::Up | Button::B => PanelAction::Previous,
            Button::Down | Button::Y => PanelAction::Next,
            Button::Ctrl | Button::X => PanelAction::Confirm,
            Button::A => PanelAction::Remount,
        }
    }
}

pub trait Buttons {
    // The button held down right now, if any.
    fn poll(&mut self) -> Option<Button>;

    fn quit_requested(&self) -> bool {
        false
    }
}

#[derive(Default, Clone, Copy)]
pub struct NoButtons();

impl Buttons for NoButtons {
    fn poll(&mut self) -> Option<Button> {
        None
    }
}

////////////////////////////////////////////////////////////////////////////////

// Reports a button once, on the first poll that finds everything released.
#[derive(Default, Debug, Clone, Copy)]
pub struct ButtonLatch {
    held: Option<Button>,
}

impl ButtonLatch {
    pub fn update(&mut self, pressed: Option<Button>) -> Option<Button> {
        match pressed {
            Some(button) => {
                self.held = Some(button);
                None
            }
            None => {
                let released = self.held.take();
                if let Some(button) = released {
                    trace!("Buttons: {button:?} released");
                }
                released
            }
        }
    }
}
