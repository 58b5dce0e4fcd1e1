use anyhow::{Context, anyhow};
use serde::Deserialize;

mod auth_config;
mod database_config;
mod logs_config;
mod media_config;
mod server_config;
mod storage_config;

pub use auth_config::AuthConfig;
pub use database_config::DatabaseConfig;
pub use logs_config::LogsConfig;
pub use media_config::MediaConfig;
pub use server_config::ServerConfig;
pub use storage_config::StorageConfig;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub media: MediaConfig,
    pub logs: LogsConfig,
}

pub fn root_dir() -> std::path::PathBuf {
    std::env::current_dir().unwrap()
}

fn parse_config_path() -> std::path::PathBuf {
    let mut args = std::env::args();
    args.next();
    while let Some(arg) = args.next() {
        if arg == "-c" || arg == "--config" {
            if let Some(path) = args.next() {
                return std::path::Path::new(&path).to_path_buf();
            } else {
                panic!("Error: Please specify path string for -c argument.")
            }
        }
    }
    panic!("Error: Please specify configuration file argument. Usage: -c <config_file>")
}

pub fn load() -> anyhow::Result<Config> {
    let path = parse_config_path();
    if !path.is_file() {
        return Err(anyhow!(
            "Error: Configuration file not found or invalid.\n\
        Please make sure that the configuration file exists and is a valid TOML file.\n\
        Expected file path: {:?}",
            path
        ));
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
    let config = toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse configuration file: {:?}", path))?;
    Ok(config)
}
