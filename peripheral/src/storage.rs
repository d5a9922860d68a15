use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::error::StorageError;

use log::{debug, trace};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    // Read only. A missing file is created, so it reads as an empty tape.
    Read,
    // Write only, emptied on open.
    CreateTruncate,
}

pub trait StorageFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError>;
    fn write(&mut self, buf: &[u8]) -> Result<usize, StorageError>;
    fn seek(&mut self, pos: u64) -> Result<(), StorageError>;

    // Cut the file off at the current position.
    fn truncate(&mut self) -> Result<(), StorageError>;
    fn sync(&mut self) -> Result<(), StorageError>;
}

// Files are closed by dropping them.
pub trait Storage {
    type File: StorageFile;

    fn mount(&mut self) -> Result<(), StorageError>;
    fn unmount(&mut self);

    fn open(&mut self, name: &str, mode: OpenMode) -> Result<Self::File, StorageError>;
    fn stat(&self, name: &str) -> Result<u64, StorageError>;

    // Start a directory scan. Ok(None) means nothing matched.
    fn find_first(&mut self, pattern: &str) -> Result<Option<String>, StorageError>;
    fn find_next(&mut self) -> Result<Option<String>, StorageError>;
}


// Only `*` as a leading wildcard and exact names are supported, matched
// without regard to ASCII case.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => {
            name.len() >= suffix.len()
                && name.is_char_boundary(name.len() - suffix.len())
                && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
        }
        None => name.eq_ignore_ascii_case(pattern),
    }
}

////////////////////////////////////////////////////////////////////////////////

pub struct DirFile {
    name: String,
    file: File,
}

impl StorageFile for DirFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.file.read(buf).map_err(|e| StorageError::io("read", &self.name, e))
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StorageError> {
        self.file.write(buf).map_err(|e| StorageError::io("write", &self.name, e))
    }

    fn seek(&mut self, pos: u64) -> Result<(), StorageError> {
        self.file
            .seek(SeekFrom::Start(pos))
            .map(|_| ())
            .map_err(|e| StorageError::io("seek", &self.name, e))
    }

    fn truncate(&mut self) -> Result<(), StorageError> {
        let pos = self.file
            .stream_position()
            .map_err(|e| StorageError::io("truncate", &self.name, e))?;
        self.file.set_len(pos).map_err(|e| StorageError::io("truncate", &self.name, e))
    }

    fn sync(&mut self) -> Result<(), StorageError> {
        self.file.sync_all().map_err(|e| StorageError::io("sync", &self.name, e))
    }
}


// A flat directory on the host standing in for the removable card.
pub struct DirStorage {
    root: PathBuf,
    mounted: bool,
    scan: Vec<String>,
    scan_pos: usize,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirStorage {
            root: root.into(),
            mounted: false,
            scan: vec![],
            scan_pos: 0,
        }
    }

    fn path(&self, name: &str) -> Result<PathBuf, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

impl Storage for DirStorage {
    type File = DirFile;

    fn mount(&mut self) -> Result<(), StorageError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {
                debug!("Storage: mounted {:?}", self.root);
                self.mounted = true;
                Ok(())
            }
            Ok(_) => Err(StorageError::Mount {
                path: self.root.clone(),
                source: std::io::Error::other("not a directory"),
            }),
            Err(source) => Err(StorageError::Mount { path: self.root.clone(), source }),
        }
    }

    fn unmount(&mut self) {
        debug!("Storage: unmounted {:?}", self.root);
        self.mounted = false;
        self.scan.clear();
        self.scan_pos = 0;
    }

    fn open(&mut self, name: &str, mode: OpenMode) -> Result<DirFile, StorageError> {
        let path = self.path(name)?;
        trace!("Storage: opening {path:?} ({mode:?})");
        let file = match mode {
            OpenMode::Read => {
                if !path.exists() {
                    File::create(&path).map_err(|e| StorageError::io("create", name, e))?;
                }
                File::open(&path)
            }
            OpenMode::CreateTruncate => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path),
        };
        let file = file.map_err(|e| StorageError::io("open", name, e))?;
        Ok(DirFile { name: name.to_string(), file })
    }

    fn stat(&self, name: &str) -> Result<u64, StorageError> {
        let path = self.path(name)?;
        fs::metadata(path)
            .map(|meta| meta.len())
            .map_err(|e| StorageError::io("stat", name, e))
    }

    fn find_first(&mut self, pattern: &str) -> Result<Option<String>, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        let entries = fs::read_dir(&self.root)
            .map_err(|e| StorageError::io("list", &self.root.to_string_lossy(), e))?;

        let mut names = vec![];
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io("list", &self.root.to_string_lossy(), e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_file && matches_pattern(&name, pattern) {
                names.push(name);
            }
        }
        names.sort();
        debug!("Storage: {} files match {pattern}", names.len());

        self.scan = names;
        self.scan_pos = 0;
        self.find_next()
    }

    fn find_next(&mut self) -> Result<Option<String>, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        let next = self.scan.get(self.scan_pos).cloned();
        if next.is_some() {
            self.scan_pos += 1;
        }
        Ok(next)
    }
}
