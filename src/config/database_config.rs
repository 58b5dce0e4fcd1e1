use crate::config::root_dir;
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseConfig {
    pub storage_path: String,
}

impl DatabaseConfig {
    pub fn parse_dir(&self) -> anyhow::Result<PathBuf> {
        let path = std::path::Path::new(&self.storage_path).to_path_buf();
        let path = if path.is_absolute() {
            path
        } else {
            root_dir().join(path)
        };
        if !path.exists() {
            std::fs::create_dir_all(&path).with_context(|| {
                format!("Failed to create database directory. {:?}", path)
            })?;
        }
        path.canonicalize()
            .with_context(|| format!("Failed to parse database directory. {:?}", path))
    }
}
