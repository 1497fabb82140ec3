use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;

pub mod models;
pub mod queries;

pub fn ticker_file_path(out_dir: &Path, symbol: &str) -> PathBuf {
    out_dir.join(format!("{}.json", symbol.trim().to_lowercase()))
}

/// Writes next to the target first so a crash never leaves a half-written ticker file.
pub fn write_json_atomically<T>(path: &Path, data: &T) -> std::io::Result<()>
where
    T: Serialize,
{
    let json_data = serde_json::to_string_pretty(data).map_err(std::io::Error::other)?;
    let temp_path = path.with_extension("json.tmp");

    fs::write(&temp_path, json_data)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

#[cfg(test)]
pub mod test_support {
    use std::{
        path::PathBuf,
        sync::atomic::{AtomicUsize, Ordering},
    };

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    pub fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "divscrape-{}-{}-{}",
            label,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
