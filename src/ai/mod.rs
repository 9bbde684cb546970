pub mod local_llm;
pub mod responses;
pub mod weekly_report;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

pub use local_llm::SimulatedGenerator;

/// Sampling knobs a caller may pass along with a prompt.
///
/// They are carried through to the generator but the simulated backend does
/// not consult them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
}

/// Backend behind the worker. Only the worker task ever touches it, so
/// implementations get `&mut self` and need no interior locking.
#[async_trait]
pub trait TextGenerator: Send {
    async fn load(&mut self, model_path: &Path) -> Result<()>;

    async fn generate(&mut self, prompt: &str, params: &GenerationParams) -> Result<String>;

    async fn unload(&mut self) -> Result<()>;
}
