//! Channel-backed event source.

use crate::logging::default_logger;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use stratum_core::{
    DispatchError, DynDispatcher, ErrorKind, Event, EventSource, Logger, Response, ResponseStack,
    SourceError, log_context,
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

/// Outcome class of a [`Reply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    /// The final response is a value.
    Ok,
    /// No route matched.
    NotFound,
    /// A middleware step declined the event.
    Rejected,
    /// The application is wired incorrectly (unbound delegate, missing binding).
    Misconfigured,
    /// The handler failed or its input could not be projected.
    Failed,
}

impl From<ErrorKind> for ReplyStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::RouteNotFound => ReplyStatus::NotFound,
            ErrorKind::MiddlewareRejected => ReplyStatus::Rejected,
            ErrorKind::NoDispatcherBound | ErrorKind::Unresolved => ReplyStatus::Misconfigured,
            ErrorKind::ExtractionFailed | ErrorKind::HandlerFailed => ReplyStatus::Failed,
        }
    }
}

/// What a [`ChannelClient`] receives for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// Outcome class.
    pub status: ReplyStatus,
    /// The final response rendered as JSON.
    pub body: Value,
}

impl Reply {
    /// Translate a dispatch outcome. The final entry of the stack wins.
    pub fn from_outcome(outcome: Result<ResponseStack, DispatchError>) -> Self {
        match outcome {
            Err(err) => Self::from_response(&Response::from(&err)),
            Ok(stack) => match stack.last() {
                Some(response) => Self::from_response(response),
                None => Reply {
                    status: ReplyStatus::Ok,
                    body: Value::Null,
                },
            },
        }
    }

    fn from_response(response: &Response) -> Self {
        Reply {
            status: response
                .error_kind()
                .map_or(ReplyStatus::Ok, ReplyStatus::from),
            body: response.to_json(),
        }
    }
}

struct Inbound {
    event: Event,
    reply: oneshot::Sender<Reply>,
}

struct Running {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<mpsc::Receiver<Inbound>>,
}

/// An event source fed through a bounded tokio channel.
///
/// Each inbound event is dispatched on its own task, so a slow or failing
/// event never holds up the loop. Events sent before [`start`](EventSource::start)
/// wait in the channel.
pub struct ChannelEventSource {
    name: String,
    sender: mpsc::Sender<Inbound>,
    receiver: Mutex<Option<mpsc::Receiver<Inbound>>>,
    running: Mutex<Option<Running>>,
    logger: Arc<dyn Logger>,
}

impl ChannelEventSource {
    /// A source buffering up to `capacity` pending events.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            name: "channel".to_string(),
            sender,
            receiver: Mutex::new(Some(receiver)),
            running: Mutex::new(None),
            logger: default_logger(),
        }
    }

    /// Name used in logs and errors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Log through `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// A client for submitting events.
    pub fn client(&self) -> ChannelClient {
        ChannelClient {
            sender: self.sender.clone(),
        }
    }

    /// Returns `true` while the receive loop is running.
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }
}

async fn serve(
    mut receiver: mpsc::Receiver<Inbound>,
    mut shutdown: oneshot::Receiver<()>,
    dispatcher: Arc<dyn DynDispatcher>,
    logger: Arc<dyn Logger>,
    name: String,
) -> mpsc::Receiver<Inbound> {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            inbound = receiver.recv() => {
                let Some(Inbound { event, reply }) = inbound else { break };
                let dispatcher = dispatcher.clone();
                let logger = logger.clone();
                let name = name.clone();
                tokio::spawn(async move {
                    let outcome = dispatcher.dispatch_dyn(&event).await;
                    let reply_value = Reply::from_outcome(outcome);
                    if reply.send(reply_value).is_err() {
                        logger.info(
                            "client went away before the reply",
                            &log_context! {
                                "source" => name,
                                "event" => event.id().to_string(),
                            },
                        );
                    }
                });
            }
        }
    }
    receiver
}

#[async_trait]
impl EventSource for ChannelEventSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, dispatcher: Arc<dyn DynDispatcher>) -> Result<(), SourceError> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(SourceError::AlreadyStarted(self.name.clone()));
        }
        let receiver = self
            .receiver
            .lock()
            .take()
            .ok_or_else(|| SourceError::AlreadyStarted(self.name.clone()))?;
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(serve(
            receiver,
            shutdown_rx,
            dispatcher,
            self.logger.clone(),
            self.name.clone(),
        ));
        *running = Some(Running { shutdown, task });
        self.logger
            .info("event source started", &log_context! { "source" => self.name });
        Ok(())
    }

    async fn stop(&self) -> Result<(), SourceError> {
        let Some(Running { shutdown, task }) = self.running.lock().take() else {
            return Ok(());
        };
        let _ = shutdown.send(());
        let receiver = task
            .await
            .map_err(|err| SourceError::Failed(Box::new(err)))?;
        *self.receiver.lock() = Some(receiver);
        self.logger
            .info("event source stopped", &log_context! { "source" => self.name });
        Ok(())
    }
}

/// Submits events to a [`ChannelEventSource`].
#[derive(Clone)]
pub struct ChannelClient {
    sender: mpsc::Sender<Inbound>,
}

impl ChannelClient {
    /// Submit `event` and wait for its reply.
    pub async fn send(&self, event: Event) -> Result<Reply, SourceError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Inbound { event, reply })
            .await
            .map_err(|_| SourceError::Failed("event source is gone".into()))?;
        response
            .await
            .map_err(|_| SourceError::Failed("event dropped without a reply".into()))
    }
}

impl std::fmt::Debug for ChannelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelClient")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
