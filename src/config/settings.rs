use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Channel identifier the dispatcher registers under unless configured otherwise.
pub const DEFAULT_CHANNEL: &str = "com.yourapp.genai";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub bridge: BridgeConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub channel: String,
    /// Jobs that may wait for the worker before submissions are refused.
    pub queue_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            queue_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    /// Keyword-selected fixed replies.
    #[default]
    Canned,
    /// Analysis built from the weekly summary embedded in the prompt.
    Personalized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub init_latency_ms: u64,
    pub generation_latency_ms: u64,
    pub response_style: ResponseStyle,
}

impl SimulationConfig {
    pub fn init_latency(&self) -> Duration {
        Duration::from_millis(self.init_latency_ms)
    }

    pub fn generation_latency(&self) -> Duration {
        Duration::from_millis(self.generation_latency_ms)
    }

    /// Same responses, no artificial delay.
    pub fn instant() -> Self {
        Self {
            init_latency_ms: 0,
            generation_latency_ms: 0,
            ..Self::default()
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            init_latency_ms: 2_000,
            generation_latency_ms: 3_000,
            response_style: ResponseStyle::Canned,
        }
    }
}

impl Settings {
    /// Loads defaults, then the file at `path` if present, then
    /// `GENAI_BRIDGE__<SECTION>__<KEY>` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("GENAI_BRIDGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.bridge.queue_capacity == 0 {
            return Err(config::ConfigError::Message(
                "bridge.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.bridge.channel.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bridge.channel must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.bridge.channel, "com.yourapp.genai");
        assert_eq!(settings.simulation.init_latency(), Duration::from_secs(2));
        assert_eq!(settings.simulation.generation_latency(), Duration::from_secs(3));
        assert_eq!(settings.simulation.response_style, ResponseStyle::Canned);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings.bridge.queue_capacity, 64);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "debug"

[bridge]
queue_capacity = 8

[simulation]
init_latency_ms = 10
response_style = "personalized"
"#
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.bridge.queue_capacity, 8);
        assert_eq!(settings.bridge.channel, DEFAULT_CHANNEL);
        assert_eq!(settings.simulation.init_latency_ms, 10);
        assert_eq!(settings.simulation.generation_latency_ms, 3_000);
        assert_eq!(settings.simulation.response_style, ResponseStyle::Personalized);
    }

    #[test]
    fn test_environment_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("bridge.log");
        std::env::set_var("GENAI_BRIDGE__LOGGING__JSON", "true");
        std::env::set_var("GENAI_BRIDGE__LOGGING__FILE", &log_file);

        let settings = Settings::load(dir.path().join("absent.toml"));

        std::env::remove_var("GENAI_BRIDGE__LOGGING__JSON");
        std::env::remove_var("GENAI_BRIDGE__LOGGING__FILE");
        let settings = settings.unwrap();
        assert!(settings.logging.json);
        assert_eq!(settings.logging.file, Some(log_file));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "[bridge]\nqueue_capacity = 0\n").unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings {
            simulation: SimulationConfig::instant(),
            ..Settings::default()
        };

        let serialized = serde_json::to_string(&settings).unwrap();
        let deserialized: Settings = serde_json::from_str(&serialized).unwrap();

        assert_eq!(settings.logging.level, deserialized.logging.level);
        assert_eq!(deserialized.simulation.init_latency_ms, 0);
        assert_eq!(deserialized.simulation.response_style, ResponseStyle::Canned);
    }
}
