//! Single-consumer job queue.
//!
//! Jobs are taken off a bounded channel one at a time and each one runs to
//! completion before the next is received, so handler bodies never overlap
//! and finish in submission order. Submission never waits: a full or closed
//! queue answers the job's reply with its error code straight away. A handler
//! that panics is answered with its error code and the worker keeps going.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Mutex;

use futures::FutureExt;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::session::{GenerationRequest, Session};
use crate::channel::Reply;
use crate::error::BridgeError;

pub enum Job {
    InitializeModel { model_path: PathBuf, reply: Reply },
    GenerateText { request: GenerationRequest, reply: Reply },
    DisposeModel { reply: Reply },
}

/// Handler body of a job, split from its reply so the reply survives a
/// panicking handler.
enum Action {
    InitializeModel(PathBuf),
    GenerateText(GenerationRequest),
    DisposeModel,
}

impl Action {
    /// Error constructor carrying this action's wire code.
    fn failure(&self) -> fn(String) -> BridgeError {
        match self {
            Self::InitializeModel(_) => BridgeError::Init,
            Self::GenerateText(_) => BridgeError::Generation,
            Self::DisposeModel => BridgeError::Dispose,
        }
    }

    async fn run(self, session: &mut Session) -> Result<Value, BridgeError> {
        match self {
            Self::InitializeModel(model_path) => {
                session.initialize_model(&model_path).await.map(Value::from)
            }
            Self::GenerateText(request) => session.generate_text(&request).await.map(Value::from),
            Self::DisposeModel => session.dispose_model().await.map(|()| Value::Null),
        }
    }
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitializeModel { .. } => "initializeModel",
            Self::GenerateText { .. } => "generateText",
            Self::DisposeModel { .. } => "disposeModel",
        }
    }

    fn into_parts(self) -> (Action, Reply) {
        match self {
            Self::InitializeModel { model_path, reply } => (Action::InitializeModel(model_path), reply),
            Self::GenerateText { request, reply } => (Action::GenerateText(request), reply),
            Self::DisposeModel { reply } => (Action::DisposeModel, reply),
        }
    }

    async fn run(self, session: &mut Session) {
        let (action, reply) = self.into_parts();
        let failure = action.failure();

        match AssertUnwindSafe(action.run(session)).catch_unwind().await {
            Ok(Ok(value)) => reply.success(value),
            Ok(Err(err)) => fail(reply, err),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(method = reply.method(), panic = %message, "handler panicked");
                fail(reply, failure(format!("handler panicked: {message}")));
            }
        }
    }

    /// Answers the job without running it.
    fn refuse(self, reason: &str) {
        warn!(job = self.name(), reason, "job refused");
        let (action, reply) = self.into_parts();
        reply.error(action.failure()(reason.to_string()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn fail(reply: Reply, err: BridgeError) {
    warn!(method = reply.method(), code = err.code(), error = %err, "handler failed");
    reply.error(err);
}

pub struct Worker {
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Starts the consumer on `runtime`. The session moves into it and is
    /// dropped when the worker stops.
    pub fn spawn(session: Session, queue_capacity: usize, runtime: &Handle) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let task = runtime.spawn(run(session, rx));

        Self {
            tx: Mutex::new(Some(tx)),
            task: Mutex::new(Some(task)),
        }
    }

    pub fn submit(&self, job: Job) {
        let tx = self.tx.lock().unwrap_or_else(|p| p.into_inner()).clone();
        let Some(tx) = tx else {
            job.refuse("worker has shut down");
            return;
        };

        match tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => job.refuse("worker queue is full"),
            Err(TrySendError::Closed(job)) => job.refuse("worker has shut down"),
        }
    }

    #[cfg(test)]
    fn is_accepting(&self) -> bool {
        self.tx.lock().unwrap_or_else(|p| p.into_inner()).is_some()
    }

    /// Stops accepting jobs. Jobs already queued still run.
    pub fn shutdown(&self) {
        if self.tx.lock().unwrap_or_else(|p| p.into_inner()).take().is_some() {
            info!("worker shutting down");
        }
    }

    /// Waits until the queue has drained after [`Worker::shutdown`].
    pub async fn join(&self) {
        let task = self.task.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "worker task ended abnormally");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run(mut session: Session, mut rx: mpsc::Receiver<Job>) {
    debug!("worker started");
    while let Some(job) = rx.recv().await {
        debug!(job = job.name(), "running job");
        job.run(&mut session).await;
    }
    info!("worker stopped");
}
