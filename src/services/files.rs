use std::{fs, io, path::Path};

use tracing::{debug, info};

use super::shared::env::Settings;

fn create_dir_if_nonexistent(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        info!("Folder created at: {:?}", path);
    } else {
        debug!("Folder already exists at: {:?}.", path);
    }
    Ok(())
}

pub fn create_necessary_directories(settings: &Settings) -> io::Result<()> {
    create_dir_if_nonexistent(&settings.out_dir)?;
    create_dir_if_nonexistent(&settings.error_artifact_dir)?;
    Ok(())
}
