use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::{responses, weekly_report, GenerationParams, TextGenerator};
use crate::config::{ResponseStyle, SimulationConfig};

/// Stand-in for an on-device model: sleeps instead of loading weights and
/// answers from fixed text.
#[derive(Debug, Clone)]
pub struct SimulatedGenerator {
    init_latency: Duration,
    generation_latency: Duration,
    style: ResponseStyle,
    model_path: Option<PathBuf>,
}

impl SimulatedGenerator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            init_latency: config.init_latency(),
            generation_latency: config.generation_latency(),
            style: config.response_style,
            model_path: None,
        }
    }

    #[cfg(test)]
    fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }
}

#[async_trait]
impl TextGenerator for SimulatedGenerator {
    async fn load(&mut self, model_path: &Path) -> Result<()> {
        tokio::time::sleep(self.init_latency).await;
        self.model_path = Some(model_path.to_path_buf());
        Ok(())
    }

    async fn generate(&mut self, prompt: &str, params: &GenerationParams) -> Result<String> {
        debug!(
            model = ?self.model_path,
            ?params,
            "sampling parameters are ignored by the simulated backend"
        );
        tokio::time::sleep(self.generation_latency).await;

        Ok(match self.style {
            ResponseStyle::Canned => responses::canned_response(prompt).to_string(),
            ResponseStyle::Personalized => {
                weekly_report::render(&weekly_report::WeekSummary::parse(prompt))
            }
        })
    }

    async fn unload(&mut self) -> Result<()> {
        self.model_path = None;
        Ok(())
    }
}
