//! NVS (Non-Volatile Storage) adapter for the instrument configuration.
//!
//! Stores the CRC-protected blob produced by [`config::encode_blob`]
//! under one key. A missing or corrupted blob loads as defaults, so a
//! fresh or damaged partition never keeps the instrument from booting.
//!
//! - **`target_os = "espidf"`**: ESP-IDF NVS, namespace `pulsemeter`.
//! - **otherwise**: an in-memory slot for host tests and simulation.

use log::{info, warn};

use crate::config::{self, BLOB_MAX_LEN, InstrumentConfig};
use crate::error::ConfigError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &[u8] = b"pulsemeter\0";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &[u8] = b"instcfg\0";

pub struct NvsConfigStore {
    #[cfg(not(target_os = "espidf"))]
    blob: std::cell::RefCell<Option<Vec<u8>>>,
}

impl NvsConfigStore {
    /// Initialise NVS flash. On first boot or after a version mismatch the
    /// partition is erased and re-initialised.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::Storage);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::Storage);
            }
            info!("NvsConfigStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsConfigStore: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blob: std::cell::RefCell::new(None),
        })
    }

    /// Load the stored configuration, falling back to defaults.
    pub fn load(&self) -> InstrumentConfig {
        let mut buf = [0u8; BLOB_MAX_LEN];
        let len = match self.read_blob(&mut buf) {
            Ok(Some(len)) => len,
            Ok(None) => {
                info!("NvsConfigStore: no stored config, using defaults");
                return InstrumentConfig::default();
            }
            Err(e) => {
                warn!("NvsConfigStore: read failed ({}), using defaults", e);
                return InstrumentConfig::default();
            }
        };
        match config::decode_blob(&buf[..len]) {
            Ok(cfg) => {
                info!("NvsConfigStore: loaded config ({} bytes)", len);
                cfg
            }
            Err(e) => {
                warn!("NvsConfigStore: stored config rejected ({}), using defaults", e);
                InstrumentConfig::default()
            }
        }
    }

    pub fn save(&self, cfg: &InstrumentConfig) -> Result<(), ConfigError> {
        let mut buf = [0u8; BLOB_MAX_LEN];
        let len = config::encode_blob(cfg, &mut buf)?;
        self.write_blob(&buf[..len])?;
        info!("NvsConfigStore: config saved ({} bytes)", len);
        Ok(())
    }

    // ── Backends ──────────────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, buf: &mut [u8]) -> Result<Option<usize>, ConfigError> {
        match self.blob.borrow().as_deref() {
            Some(data) if data.len() > buf.len() => Err(ConfigError::Corrupted),
            Some(data) => {
                buf[..data.len()].copy_from_slice(data);
                Ok(Some(data.len()))
            }
            None => Ok(None),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, data: &[u8]) -> Result<(), ConfigError> {
        *self.blob.borrow_mut() = Some(data.to_vec());
        Ok(())
    }

    /// Raw access for tests that need to damage the stored blob.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_raw_blob(&self, f: impl FnOnce(&mut Vec<u8>)) {
        if let Some(blob) = self.blob.borrow_mut().as_mut() {
            f(blob);
        }
    }

    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    ) -> Result<T, esp_err_t> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, buf: &mut [u8]) -> Result<Option<usize>, ConfigError> {
        let result = Self::with_handle(false, |handle| {
            let mut size = buf.len();
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    CONFIG_KEY.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(size) => Ok(Some(size)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => {
                warn!("NVS read error {}", e);
                Err(ConfigError::Storage)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, data: &[u8]) -> Result<(), ConfigError> {
        Self::with_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    CONFIG_KEY.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NVS write error {}", e);
            ConfigError::Storage
        })
    }
}
