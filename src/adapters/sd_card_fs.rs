//! Filesystem-backed SD card adapter.
//!
//! Implements [`SdCardPort`] on top of `std::fs`. On target the root is the
//! FAT VFS mount point of the card; on the host it is any directory (tests
//! use a temp dir). Every write is followed by `sync_data` so a line is on
//! the medium before `notify` returns.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::adapters::utils::is_short_file_name;
use crate::app::ports::{FileMode, SdCardPort};
use crate::error::{DeviceError, SdCardError};
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};

/// VFS mount point of the card on target.
pub const SD_MOUNT_POINT: &str = "/sdcard";

pub struct FsSdCard {
    root: PathBuf,
    file: Option<File>,
    slot: StateSlot,
}

impl FsSdCard {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file: None,
            slot: StateSlot::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn close_quietly(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.sync_all() {
                warn!("sd: sync on close failed: {}", e);
            }
        }
    }
}

impl Component for FsSdCard {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        if !self.root.is_dir() {
            warn!("sd: {} is not mounted", self.root.display());
            return Err(DeviceError::SdCard(SdCardError::FilesystemNotMounted));
        }
        info!("sd: using {}", self.root.display());
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        self.close_quietly();
        Ok(())
    }

    fn on_reset(&mut self) -> HookResult {
        self.close_quietly();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fs-sd-card"
    }
}

impl SdCardPort for FsSdCard {
    fn open_file(&mut self, name: &str, mode: FileMode) -> Result<(), SdCardError> {
        if !self.is_running() {
            return Err(SdCardError::FilesystemNotMounted);
        }
        if self.file.is_some() {
            return Err(SdCardError::FileAlreadyOpen);
        }
        if !is_short_file_name(name) {
            return Err(SdCardError::InvalidParameter);
        }

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            FileMode::Append => options.append(true),
            FileMode::Overwrite => options.write(true).truncate(true),
        };
        let file = options.open(self.root.join(name)).map_err(|e| {
            warn!("sd: open {} failed: {}", name, e);
            SdCardError::FileOpenError
        })?;
        self.file = Some(file);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), SdCardError> {
        let file = self.file.as_mut().ok_or(SdCardError::NoFileOpen)?;
        file.write_all(data).map_err(|e| match e.kind() {
            ErrorKind::WriteZero => SdCardError::IncompleteWrite,
            _ => SdCardError::WriteError,
        })?;
        file.sync_data().map_err(|_| SdCardError::SyncError)
    }

    fn close_file(&mut self) -> Result<(), SdCardError> {
        let file = self.file.take().ok_or(SdCardError::NoFileOpen)?;
        file.sync_all().map_err(|_| SdCardError::FileCloseError)
    }

    fn is_file_open(&self) -> bool {
        self.file.is_some()
    }
}
