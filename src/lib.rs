pub mod ai;
pub mod channel;
pub mod config;
pub mod error;
pub mod logger;
pub mod plugin;
pub mod scheduler;

pub use channel::{MethodCall, MethodChannel, MethodResult};
pub use config::Settings;
pub use error::BridgeError;
pub use plugin::GenAiPlugin;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
