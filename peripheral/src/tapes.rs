use crate::error::StorageError;
use crate::storage::Storage;

use log::debug;


// A page of tape names from the storage directory, and which one is selected.
// `found` counts files seen by the directory scan so far, across pages; the
// scan is only extended as far as the current page needs.
#[derive(Debug, Clone)]
pub struct TapeCatalog {
    pattern: String,
    page_size: usize,
    page: usize,
    found: usize,
    sel: Option<usize>,
    names: Vec<Option<String>>,
}

impl TapeCatalog {
    pub fn new(page_size: usize, pattern: &str) -> Self {
        let page_size = page_size.max(1);
        TapeCatalog {
            pattern: pattern.to_string(),
            page_size,
            page: 0,
            found: 0,
            sel: Some(0),
            names: vec![None; page_size],
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn found(&self) -> usize {
        self.found
    }

    pub fn selection(&self) -> Option<usize> {
        self.sel
    }

    pub fn rescan(&mut self) {
        self.found = 0;
        self.sel = Some(0);
        self.page = 0;
    }

    // Start over from the first page, keeping the selection.
    pub fn forget(&mut self) {
        self.found = 0;
        self.page = 0;
    }

    pub fn previous(&mut self) {
        match self.sel {
            Some(sel) if sel > 0 => self.sel = Some(sel - 1),
            _ => {
                self.sel = Some(self.page_size - 1);
                self.page = self.page.saturating_sub(1);
                self.found = 0;
            }
        }
    }

    pub fn next(&mut self) {
        let sel = self.sel.map_or(0, |sel| sel + 1);
        if sel > self.page_size - 1 {
            self.sel = Some(0);
            self.page += 1;
        } else {
            self.sel = Some(sel);
        }
    }

    fn find<S: Storage>(&self, storage: &mut S) -> Result<Option<String>, StorageError> {
        if self.found == 0 {
            match storage.find_first(&self.pattern)? {
                Some(name) => Ok(Some(name)),
                None => Err(StorageError::NoMatches(self.pattern.clone())),
            }
        } else {
            storage.find_next()
        }
    }

    // Extend the scan to cover the current page, then pull the selection back
    // onto a file that exists.
    pub fn enumerate<S: Storage>(&mut self, storage: &mut S) -> Result<(), StorageError> {
        let res = self.scan(storage);
        if let Err(StorageError::NoMatches(_)) = &res {
            self.sel = None;
        }
        res
    }

    fn scan<S: Storage>(&mut self, storage: &mut S) -> Result<(), StorageError> {
        let skip = self.page * self.page_size;

        for pos in 0..skip {
            if pos + 1 > self.found && self.find(storage)?.is_some() {
                self.found += 1;
            }
        }

        for slot in 0..self.page_size {
            if skip + slot + 1 > self.found {
                if let Some(name) = self.find(storage)? {
                    self.found += 1;
                    self.names[slot] = Some(name);
                }
            }
        }

        while let Some(sel) = self.sel {
            if skip + sel < self.found {
                break;
            }
            self.sel = sel.checked_sub(1);
        }

        debug!("Tapes: page {} has {} of {} found, selection {:?}",
            self.page, self.visible().count(), self.found, self.sel);
        Ok(())
    }

    // (slot, name) for each slot on this page backed by a found file.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &str)> {
        let skip = self.page * self.page_size;
        let shown = self.found.saturating_sub(skip).min(self.page_size);
        self.names[..shown]
            .iter()
            .enumerate()
            .filter_map(|(slot, name)| name.as_deref().map(|name| (slot, name)))
    }

    pub fn is_selected(&self, slot: usize) -> bool {
        self.sel == Some(slot)
    }

    pub fn selected(&self) -> Option<&str> {
        let sel = self.sel?;
        if self.page * self.page_size + sel >= self.found {
            return None;
        }
        self.names[sel].as_deref()
    }
}
