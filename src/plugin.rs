//! Request dispatcher registered on the host's method channel.
//!
//! Calls arrive on the caller's thread. Availability is answered inline, the
//! `generateText` precondition is checked inline, and everything else is
//! handed to the [`Worker`] and answered from there.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::ai::{GenerationParams, SimulatedGenerator, TextGenerator};
use crate::channel::{MethodCall, MethodCallHandler, MethodChannel, Reply};
use crate::config::Settings;
use crate::error::BridgeError;
use crate::scheduler::{GenerationRequest, Job, ModelFlag, Session, Worker};

/// Methods exposed on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    IsGenAiAvailable,
    InitializeModel,
    GenerateText,
    DisposeModel,
}

impl Method {
    /// Method names are matched exactly.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "isGenAIAvailable" => Some(Self::IsGenAiAvailable),
            "initializeModel" => Some(Self::InitializeModel),
            "generateText" => Some(Self::GenerateText),
            "disposeModel" => Some(Self::DisposeModel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsGenAiAvailable => "isGenAIAvailable",
            Self::InitializeModel => "initializeModel",
            Self::GenerateText => "generateText",
            Self::DisposeModel => "disposeModel",
        }
    }
}

pub struct GenAiPlugin {
    worker: Worker,
    model: ModelFlag,
}

impl GenAiPlugin {
    /// Plugin backed by the simulated generator described by `settings`.
    pub fn new(settings: &Settings, runtime: &Handle) -> Self {
        let generator = SimulatedGenerator::new(&settings.simulation);
        Self::with_generator(Box::new(generator), settings.bridge.queue_capacity, runtime)
    }

    pub fn with_generator(
        generator: Box<dyn TextGenerator>,
        queue_capacity: usize,
        runtime: &Handle,
    ) -> Self {
        let session = Session::new(generator);
        let model = session.flag();
        Self {
            worker: Worker::spawn(session, queue_capacity, runtime),
            model,
        }
    }

    /// Registers this plugin as `channel`'s call handler.
    pub fn attach(self: Arc<Self>, channel: &MethodChannel) {
        info!(channel = channel.name(), "attaching generation plugin");
        channel.set_method_call_handler(Some(self));
    }

    /// Deregisters from `channel` and stops the worker. Jobs already queued
    /// still finish; anything submitted afterwards is refused.
    pub fn detach(&self, channel: &MethodChannel) {
        info!(channel = channel.name(), "detaching generation plugin");
        channel.set_method_call_handler(None);
        self.worker.shutdown();
    }

    /// Resolves once the worker has drained after [`GenAiPlugin::detach`].
    pub async fn join(&self) {
        self.worker.join().await;
    }

    /// Always true for the simulated backend.
    pub fn check_availability(&self) -> bool {
        true
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    fn dispatch(&self, method: Method, call: MethodCall, reply: Reply) {
        match method {
            Method::IsGenAiAvailable => reply.success(self.check_availability()),
            Method::InitializeModel => match call.argument::<String>("modelPath") {
                Ok(path) => self.worker.submit(Job::InitializeModel {
                    model_path: PathBuf::from(path.unwrap_or_default()),
                    reply,
                }),
                Err(e) => reply.error(BridgeError::Init(format!("invalid modelPath: {e}"))),
            },
            Method::GenerateText => {
                // May read a stale value while an init/dispose is still queued.
                if !self.model.is_loaded() {
                    reply.error(BridgeError::ModelNotLoaded);
                    return;
                }
                match generation_request(&call) {
                    Ok(request) => self.worker.submit(Job::GenerateText { request, reply }),
                    Err(e) => reply.error(BridgeError::Generation(format!("{e:#}"))),
                }
            }
            Method::DisposeModel => self.worker.submit(Job::DisposeModel { reply }),
        }
    }
}

impl MethodCallHandler for GenAiPlugin {
    fn on_method_call(&self, call: MethodCall, reply: Reply) {
        debug!(method = %call.method, "method call");
        match Method::parse(&call.method) {
            Some(method) => self.dispatch(method, call, reply),
            None => reply.not_implemented(),
        }
    }
}

fn generation_request(call: &MethodCall) -> Result<GenerationRequest> {
    let prompt = call
        .argument::<String>("prompt")
        .context("invalid prompt")?
        .context("missing prompt")?;

    let params = GenerationParams {
        max_tokens: sampling_argument(call, "maxTokens"),
        temperature: sampling_argument(call, "temperature"),
        top_p: sampling_argument(call, "topP"),
    };

    Ok(GenerationRequest { prompt, params })
}

/// Sampling knobs never change the output, so a mistyped one is dropped
/// rather than failing the call.
fn sampling_argument<T: serde::de::DeserializeOwned>(call: &MethodCall, key: &str) -> Option<T> {
    call.argument(key).unwrap_or_else(|e| {
        debug!(argument = key, error = %e, "ignoring mistyped sampling argument");
        None
    })
}
