mod config;
mod schedule_store;

pub use config::{
    migrate_additive, Config, ConfigSource, DateConfig, GeneralConfig, OtherConfig, TempConfig,
    ToastConfig, CONFIG_VERSION,
};
pub use schedule_store::{FsScheduleStore, MemoryScheduleStore, ScheduleStore, BACKUP_NAME};

use std::io::Write;
use std::path::{Path, PathBuf};

/// Returns the data directory.
///
/// `CLASSBELL_DATA_DIR` wins when set; otherwise `~/.config/classbell[-dev]/`
/// based on `CLASSBELL_ENV` (set it to `dev` for the development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("CLASSBELL_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CLASSBELL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("classbell-dev")
            } else {
                base_dir.join("classbell")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Write `content` next to `path`, fsync, and rename it into place.
///
/// Readers see either the old file or the new one, never a torn write.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&tmp, path)
}
