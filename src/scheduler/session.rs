//! Model session owned by the worker.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::ai::{GenerationParams, TextGenerator};
use crate::error::{describe, BridgeError};

/// Read-only view of the session's `loaded` flag for threads other than the
/// worker. A read may be stale while a state-changing job is still queued.
#[derive(Debug, Clone, Default)]
pub struct ModelFlag(Arc<AtomicBool>);

impl ModelFlag {
    pub fn is_loaded(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, loaded: bool) {
        self.0.store(loaded, Ordering::Release);
    }
}

/// Opaque handle for the model currently held by the generator.
#[derive(Debug)]
struct LoadedModel {
    path: PathBuf,
    loaded_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub params: GenerationParams,
}

/// Everything the handlers mutate. Only the worker holds a `&mut Session`.
pub struct Session {
    generator: Box<dyn TextGenerator>,
    model: Option<LoadedModel>,
    flag: ModelFlag,
}

impl Session {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            generator,
            model: None,
            flag: ModelFlag::default(),
        }
    }

    pub fn flag(&self) -> ModelFlag {
        self.flag.clone()
    }

    #[cfg(test)]
    fn is_loaded(&self) -> bool {
        self.flag.is_loaded()
    }

    /// Any path is accepted; the generator decides what it means.
    pub async fn initialize_model(&mut self, model_path: &Path) -> Result<bool, BridgeError> {
        self.generator
            .load(model_path)
            .await
            .map_err(|e| BridgeError::Init(describe(&e)))?;

        if let Some(previous) = self.model.replace(LoadedModel {
            path: model_path.to_path_buf(),
            loaded_at: Instant::now(),
        }) {
            info!(previous = %previous.path.display(), "replacing loaded model");
        }
        self.flag.set(true);
        info!(model = %model_path.display(), "model initialized");
        Ok(true)
    }

    pub async fn generate_text(&mut self, request: &GenerationRequest) -> Result<String, BridgeError> {
        self.generator
            .generate(&request.prompt, &request.params)
            .await
            .map_err(|e| BridgeError::Generation(describe(&e)))
    }

    /// Clears the slot first, then releases the generator. A failed release
    /// is reported but the session stays unloaded.
    pub async fn dispose_model(&mut self) -> Result<(), BridgeError> {
        if let Some(model) = self.model.take() {
            info!(
                model = %model.path.display(),
                held_for = ?model.loaded_at.elapsed(),
                "disposing model"
            );
        }
        self.flag.set(false);

        self.generator.unload().await.map_err(|e| {
            warn!(error = %e, "generator failed to release the model");
            BridgeError::Dispose(describe(&e))
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.model)
            .field("loaded", &self.flag.is_loaded())
            .finish_non_exhaustive()
    }
}
