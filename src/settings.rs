use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Defaults, then an optional `trivia.*` file in the working directory, then `TRIVIA_*`
    /// environment variables. A `.env` file is loaded into the environment first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::builder()?
            .add_source(File::with_name("trivia").required(false))
            .add_source(Environment::with_prefix("TRIVIA"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database_url", "sqlite:trivia.db")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.database_url, "sqlite:trivia.db");
        assert_eq!(settings.address(), "0.0.0.0:8080");
    }

    #[test]
    fn overrides_take_precedence() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .set_override("port", 5000)
            .unwrap()
            .set_override("database_url", "sqlite::memory:")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.database_url, "sqlite::memory:");
    }
}
