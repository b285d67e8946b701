use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub scan_directory: String,
    pub thumbnail_directory: String,
    pub static_directory: String,
    pub database_path: String,
    pub web_host: String,
    pub web_port: u16,
    pub log_level: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("scan_directory", "data")?
            .set_default("thumbnail_directory", "static/thumbnails")?
            .set_default("static_directory", "static")?
            .set_default("database_path", "db/data.sqlite")?
            .set_default("web_host", "0.0.0.0")?
            .set_default("web_port", 8080_i64)?
            .set_default("log_level", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("LASERCUT"))
            .build()?;

        s.try_deserialize()
    }
}
