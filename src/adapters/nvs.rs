//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigSource`] and [`StoragePort`] for the lift firmware.
//!
//! - Each tunable is its own key under the `"vlm"` namespace, stored as a
//!   postcard-encoded `i32`.  Provisioning tools can change one value
//!   without rewriting the rest.
//! - Keys are at most 15 bytes (NVS limit); see [`crate::config::keys`].
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//!   The host backend is an in-memory map.

use crate::app::ports::{ConfigSource, StorageError, StoragePort};
use crate::config::{MotionConfig, keys};
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Namespace holding every tunable.
pub const CONFIG_NAMESPACE: &str = "vlm";

/// postcard varint of an i32 never exceeds 5 bytes.
const INT_BLOB_MAX: usize = 8;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create the adapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS
            // access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK
                {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of `name`, truncated to the NVS limit.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    // ── Integer tunables ──────────────────────────────────────

    /// Store one tunable.
    pub fn set_int(&mut self, name: &str, value: i32) -> Result<(), StorageError> {
        let mut buf = [0u8; INT_BLOB_MAX];
        let used = postcard::to_slice(&value, &mut buf).map_err(|_| StorageError::IoError)?;
        let len = used.len();
        self.write(CONFIG_NAMESPACE, name, &buf[..len])
    }

    /// Decode one tunable.  `None` when absent or undecodable.
    pub fn try_get_int(&self, name: &str) -> Option<i32> {
        let mut buf = [0u8; INT_BLOB_MAX];
        let len = self.read(CONFIG_NAMESPACE, name, &mut buf).ok()?;
        match postcard::from_bytes::<i32>(&buf[..len]) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("NvsAdapter: key '{}' is corrupted, ignoring", name);
                None
            }
        }
    }

    /// Write every tunable of `cfg`.  Stops at the first failed key.
    pub fn save_config(&mut self, cfg: &MotionConfig) -> Result<(), StorageError> {
        let values: [(&str, i64); 22] = [
            (keys::STEPS_PER_FLOOR, cfg.steps_per_floor.into()),
            (keys::NORMAL_SPEED, cfg.normal_speed.into()),
            (keys::HOMING_SPEED, cfg.homing_speed.into()),
            (keys::HOMING_MAX_STEPS, cfg.homing_max_steps.into()),
            (keys::HALL_POLL_MS, cfg.hall_poll_ms.into()),
            (keys::HALL_MIN_CHANGE, cfg.hall_min_change.into()),
            (keys::HALL_MIN_AMPLITUDE, cfg.hall_min_amplitude.into()),
            (keys::HALL_SETTLE_SAMPLES, cfg.hall_settle_samples.into()),
            (keys::REFRACTORY_MS, cfg.refractory_ms.into()),
            (keys::HOMING_REFRACTORY_MS, cfg.homing_refractory_ms.into()),
            (keys::BAY_RUN_MS, cfg.bay_run_ms.into()),
            (keys::BAY_FWD_LEFT, cfg.bay_toward_front.left.into()),
            (keys::BAY_FWD_RIGHT, cfg.bay_toward_front.right.into()),
            (keys::BAY_REV_LEFT, cfg.bay_toward_back.left.into()),
            (keys::BAY_REV_RIGHT, cfg.bay_toward_back.right.into()),
            (keys::BAY_NEUTRAL, cfg.bay_neutral.into()),
            (keys::SCAN_SETTLE_MS, cfg.scan_settle_ms.into()),
            (keys::SCAN_LIMIT_MS, cfg.scan_limit_ms.into()),
            (keys::STALL_SLACK_MS, cfg.stall_slack_ms.into()),
            (keys::YIELD_MS, cfg.yield_ms.into()),
            (keys::FLOOR_COUNT, cfg.floor_count.into()),
            (keys::MAX_IDS, cfg.max_ids.into()),
        ];
        for (name, value) in values {
            let value = i32::try_from(value).map_err(|_| StorageError::IoError)?;
            self.set_int(name, value)?;
        }
        info!("NvsAdapter: {} tunables saved", values.len());
        Ok(())
    }

    /// True if any tunable has been provisioned.
    pub fn has_config(&self) -> bool {
        keys::ALL.iter().any(|k| self.exists(CONFIG_NAMESPACE, k))
    }
}

impl ConfigSource for NvsAdapter {
    fn get_int(&self, name: &str, default: i32) -> i32 {
        self.try_get_int(name).unwrap_or(default)
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let name = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        name.as_ptr() as *const _,
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
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let name = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        name.as_ptr() as *const _,
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
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let name = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, name.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let name = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let ret = unsafe {
                    nvs_find_key(handle, name.as_ptr() as *const _, core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }
}
