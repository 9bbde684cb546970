//! Host-facing method channel.
//!
//! A [`MethodChannel`] is the named endpoint the host UI calls into. At most
//! one [`MethodCallHandler`] is registered on it at a time; every call gets a
//! [`Reply`] that must be answered exactly once, possibly from another thread.

pub mod envelope;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::BridgeError;

/// A named invocation with an untyped argument map.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Map<String, Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Reads one argument. Absent keys and explicit nulls both yield `None`.
    pub fn argument<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some),
        }
    }
}

/// What a caller eventually receives for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResult {
    Success {
        value: Value,
    },
    Error {
        code: String,
        message: String,
        details: Option<Value>,
    },
    /// The method name is not part of the handler's surface.
    NotImplemented,
}

impl MethodResult {
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success {
            value: value.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<BridgeError> for MethodResult {
    fn from(err: BridgeError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

/// One-shot answer slot for a single call. Consumed by whichever method
/// answers it, so a call cannot be answered twice.
#[derive(Debug)]
pub struct Reply {
    method: String,
    tx: oneshot::Sender<MethodResult>,
}

impl Reply {
    pub fn success(self, value: impl Into<Value>) {
        self.send(MethodResult::success(value));
    }

    pub fn error(self, err: BridgeError) {
        self.send(err.into());
    }

    pub fn not_implemented(self) {
        self.send(MethodResult::NotImplemented);
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    fn send(self, result: MethodResult) {
        if self.tx.send(result).is_err() {
            debug!(method = %self.method, "caller went away before the reply was delivered");
        }
    }
}

/// The reply handler was dropped without answering.
#[derive(Debug, Error)]
#[error("reply for '{method}' was dropped without an answer")]
pub struct ReplyDropped {
    pub method: String,
}

/// Caller side of a [`Reply`].
#[derive(Debug)]
pub struct PendingReply {
    method: String,
    rx: oneshot::Receiver<MethodResult>,
}

impl PendingReply {
    /// Returns the answer if it has already been delivered.
    pub fn try_take(&mut self) -> Option<MethodResult> {
        self.rx.try_recv().ok()
    }
}

impl Future for PendingReply {
    type Output = Result<MethodResult, ReplyDropped>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        Pin::new(&mut this.rx).poll(cx).map(|res| {
            res.map_err(|_| ReplyDropped {
                method: this.method.clone(),
            })
        })
    }
}

/// Creates a connected reply pair for `method`.
pub fn reply_pair(method: impl Into<String>) -> (Reply, PendingReply) {
    let method = method.into();
    let (tx, rx) = oneshot::channel();
    (
        Reply {
            method: method.clone(),
            tx,
        },
        PendingReply { method, rx },
    )
}

/// Receives calls on the caller's thread. Implementations must not block;
/// long work is handed off and answered later through the `Reply`.
pub trait MethodCallHandler: Send + Sync {
    fn on_method_call(&self, call: MethodCall, reply: Reply);
}

/// Named call endpoint with a replaceable handler slot.
pub struct MethodChannel {
    name: String,
    handler: RwLock<Option<Arc<dyn MethodCallHandler>>>,
}

impl MethodChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `handler`, or clears the slot with `None`.
    pub fn set_method_call_handler(&self, handler: Option<Arc<dyn MethodCallHandler>>) {
        let mut slot = self.handler.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = handler;
    }

    pub fn has_handler(&self) -> bool {
        self.handler
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Delivers `call` to the registered handler. Without one the call is
    /// answered as not implemented.
    pub fn invoke(&self, call: MethodCall) -> PendingReply {
        let (reply, pending) = reply_pair(call.method.clone());
        let handler = self
            .handler
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        match handler {
            Some(handler) => handler.on_method_call(call, reply),
            None => {
                warn!(channel = %self.name, method = %call.method, "no handler registered");
                reply.not_implemented();
            }
        }
        pending
    }
}

impl std::fmt::Debug for MethodChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodChannel")
            .field("name", &self.name)
            .field("has_handler", &self.has_handler())
            .finish()
    }
}
