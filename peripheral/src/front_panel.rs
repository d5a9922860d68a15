use std::thread;
use std::time::Duration;

use crate::bus::Indicator;
use crate::config::Config;
use crate::display::{Display, Panel};
use crate::engine::{Engine, Notice};
use crate::error::StorageError;
use crate::input::{ButtonLatch, Buttons, PanelAction};
use crate::storage::Storage;
use crate::tapes::TapeCatalog;

use log::{error, info, warn};


// The polling loop: buttons drive the tape selector, then the engine gets its
// tick. Everything here runs on one thread.
pub struct FrontPanel<S: Storage, D: Display, B: Buttons> {
    engine: Engine<S>,
    catalog: TapeCatalog,
    panel: Panel<D>,
    buttons: B,
    latch: ButtonLatch,
}

impl<S: Storage, D: Display, B: Buttons> FrontPanel<S, D, B> {
    const FAULT_BLINK: Duration = Duration::from_millis(200);

    pub fn new(engine: Engine<S>, display: D, buttons: B, config: &Config) -> Self {
        FrontPanel {
            engine,
            catalog: TapeCatalog::new(config.page_size, &config.tape_pattern),
            panel: Panel::new(display),
            buttons,
            latch: ButtonLatch::default(),
        }
    }

    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    pub fn catalog(&self) -> &TapeCatalog {
        &self.catalog
    }

    pub fn panel(&self) -> &Panel<D> {
        &self.panel
    }

    pub fn buttons_mut(&mut self) -> &mut B {
        &mut self.buttons
    }

    // Mount storage and bring both devices up. A failure here is fatal.
    pub fn start(&mut self) -> Result<(), StorageError> {
        self.panel.clear_screen();
        if let Err(e) = self.engine.storage_mut().mount() {
            self.panel.show_error("SDCARD ERROR");
            return Err(e);
        }
        let name = self.engine.binding().name.clone();
        self.panel.show_tape_name(&name);
        self.engine.reset();
        self.show_notices();
        Ok(())
    }

    pub fn run(&mut self) {
        while !self.buttons.quit_requested() {
            self.step();
        }
    }

    // Run with a pause between iterations, for hosts where spinning flat out
    // isn't wanted.
    pub fn run_paced(&mut self, pause: Duration) {
        while !self.buttons.quit_requested() {
            self.step();
            thread::sleep(pause);
        }
    }

    pub fn step(&mut self) {
        let pressed = self.buttons.poll();
        if let Some(button) = self.latch.update(pressed) {
            self.handle(button.action());
        }
        self.engine.tick();
        self.show_notices();
    }

    pub fn handle(&mut self, action: PanelAction) {
        info!("Panel: {action:?}");
        match action {
            PanelAction::Rescan => {
                self.catalog.rescan();
                self.list_tapes();
            }
            PanelAction::Previous => {
                self.catalog.previous();
                self.list_tapes();
            }
            PanelAction::Next => {
                self.catalog.next();
                self.list_tapes();
            }
            PanelAction::Confirm => self.confirm(),
            PanelAction::Remount => self.remount(),
        }
        self.show_notices();
    }

    fn list_tapes(&mut self) {
        self.panel.clear_screen();
        if let Err(e) = self.catalog.enumerate(self.engine.storage_mut()) {
            warn!("Panel: tape listing failed: {e}");
            self.panel.show_error("NO TAPES ...");
            return;
        }
        for (slot, name) in self.catalog.visible() {
            self.panel.show_list_item(slot, name, self.catalog.is_selected(slot));
        }
    }

    fn confirm(&mut self) {
        let Some(name) = self.catalog.selected().map(str::to_string) else {
            warn!("Panel: nothing selected");
            return;
        };
        self.panel.clear_screen();
        self.panel.show_tape_name(&name);
        self.engine.select_tape(&name);
    }

    fn remount(&mut self) {
        self.catalog.forget();
        self.engine.storage_mut().unmount();
        self.panel.clear_screen();
        if let Err(e) = self.engine.storage_mut().mount() {
            error!("Panel: remount failed: {e}");
            self.panel.show_error("SDCARD ERROR");
            return;
        }
        let name = self.engine.binding().name.clone();
        self.panel.show_tape_name(&name);
        self.engine.reset();
    }

    fn show_notices(&mut self) {
        for notice in self.engine.take_notices() {
            match notice {
                Notice::Error(msg) => self.panel.show_error(msg),
                Notice::Progress { size, pos } => self.panel.show_progress(size, pos),
            }
        }
    }

    // Storage never came up. Blink until told to quit.
    pub fn fault(&mut self, indicator: &mut impl Indicator) {
        let mut on = true;
        while !self.buttons.quit_requested() {
            indicator.set(on);
            on = !on;
            thread::sleep(Self::FAULT_BLINK);
            self.buttons.poll();
        }
    }
}
