//! Support for library configuration options

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;

/// The key under which the whole task list is stored.
/// Feel free to override it when initing this library.
pub static STORAGE_KEY: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("todos".to_string())));

/// The folder a [`FileStore`](crate::storage::FileStore) writes its entries into.
/// Feel free to override it when initing this library.
pub static DATA_FOLDER: Lazy<Arc<Mutex<PathBuf>>> = Lazy::new(|| Arc::new(Mutex::new(PathBuf::from("kitchen_timer_data"))));

/// How often the clock display is refreshed
pub static CLOCK_PERIOD: Lazy<Arc<Mutex<Duration>>> = Lazy::new(|| Arc::new(Mutex::new(Duration::from_millis(1000))));

/// Environment variable that overrides [`DATA_FOLDER`] in the `kitchen-timer` binary
pub const DATA_FOLDER_ENV: &str = "KITCHEN_TIMER_DIR";


/// Returns the current storage key
pub fn storage_key() -> String {
    match STORAGE_KEY.lock() {
        Ok(key) => key.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Returns the current data folder
pub fn data_folder() -> PathBuf {
    match DATA_FOLDER.lock() {
        Ok(folder) => folder.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Returns the current clock period
pub fn clock_period() -> Duration {
    match CLOCK_PERIOD.lock() {
        Ok(period) => *period,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// Override the data folder
pub fn set_data_folder(folder: PathBuf) {
    match DATA_FOLDER.lock() {
        Ok(mut current) => *current = folder,
        Err(poisoned) => *poisoned.into_inner() = folder,
    }
}
