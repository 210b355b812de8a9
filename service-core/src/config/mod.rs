use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Resolve a crate's `config/` directory whether the process runs from the
/// workspace root or from inside the crate itself.
pub fn config_directory(crate_dir: &str) -> Result<PathBuf, AppError> {
    let base_path = std::env::current_dir()?;

    Ok(if base_path.ends_with(crate_dir) {
        base_path.join("config")
    } else {
        base_path.join(crate_dir).join("config")
    })
}

/// Load `base.yaml` from `directory`, then overlay `APP_*` environment
/// variables (`__` separates nested keys, e.g. `APP_BACKEND__BASE_URL`).
pub fn load<T: DeserializeOwned>(directory: &Path) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let settings = Cfg::builder()
        .add_source(File::from(directory.join("base.yaml")).required(true))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
