//! Module loading channel.
//!
//! `import(name)` does not read files itself. It sends a [`ModuleRequest`]
//! to whoever holds the receiving end and blocks until that loader replies
//! with the module's evaluated value.

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, warn};

use crate::evaluator::RuntimeError;
use crate::values::Value;

pub struct ModuleRequest {
    pub name: String,
    pub reply: Sender<Result<Value, String>>,
}

impl ModuleRequest {
    /// Answer the request. A requester that gave up is not an error.
    pub fn respond(self, result: Result<Value, String>) {
        if self.reply.send(result).is_err() {
            warn!(module = %self.name, "module requester went away before the reply");
        }
    }
}

/// The evaluator's end of the module channel.
#[derive(Clone)]
pub struct ModuleClient {
    requests: Sender<ModuleRequest>,
}

impl ModuleClient {
    pub fn new(requests: Sender<ModuleRequest>) -> Self {
        Self { requests }
    }

    /// A client and the receiver a loader should serve.
    pub fn channel() -> (Self, Receiver<ModuleRequest>) {
        let (sender, receiver) = channel::unbounded();
        (Self::new(sender), receiver)
    }

    /// Request a module and wait for its value.
    pub fn load(&self, name: &str) -> Result<Value, RuntimeError> {
        let (reply, response) = channel::bounded(1);
        self.requests
            .send(ModuleRequest {
                name: name.to_string(),
                reply,
            })
            .map_err(|_| RuntimeError::ModuleUnavailable {
                module: name.to_string(),
            })?;
        debug!(module = name, "waiting for module loader");

        match response.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(RuntimeError::ModuleLoad {
                module: name.to_string(),
                message,
            }),
            Err(_) => Err(RuntimeError::ModuleLoad {
                module: name.to_string(),
                message: "loader dropped the request".to_string(),
            }),
        }
    }
}

/// Answer requests from `receiver` with `loader` until every client is
/// dropped.
///
/// Requests are served one at a time; a loader that evaluates modules which
/// import other modules should hand each request to its own thread instead.
pub fn serve(receiver: &Receiver<ModuleRequest>, mut loader: impl FnMut(&str) -> Result<Value, String>) {
    for request in receiver.iter() {
        let result = loader(&request.name);
        request.respond(result);
    }
}
