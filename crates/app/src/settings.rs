//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden with `APP__*` environment variables
//! (e.g. `APP__SERVER__PORT=8080`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// bcrypt cost for member passwords.
    pub password_cost: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", default_level())?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn reads_sqlite_server() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "mandal.db" }
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert!(matches!(server.database, Database::Sqlite(ref path) if path == "mandal.db"));
        assert!(server.password_cost.is_none());
    }

    #[test]
    fn reads_memory_database() {
        let settings = parse(
            r#"
            [server]
            port = 3000
            database = "memory"
            password_cost = 4
            "#,
        );
        assert_eq!(settings.app.level, "info");
        let server = settings.server.unwrap();
        assert!(matches!(server.database, Database::Memory));
        assert_eq!(server.password_cost, Some(4));
    }
}
