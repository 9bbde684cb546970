pub mod settings;

pub use settings::{
    BridgeConfig, LoggingConfig, ResponseStyle, Settings, SimulationConfig, DEFAULT_CHANNEL,
};
