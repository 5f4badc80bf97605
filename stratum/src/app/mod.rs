//! # Application
//!
//! An [`Application`] is one layer: an event source, a route table, a
//! dependency scope and a logger, assembled by [`ApplicationBuilder`].
//!
//! # Lifecycle
//!
//! ```text
//! Stopped --run--> Starting --source started--> Running
//! Running --stop--> Stopping --source stopped--> Stopped
//! ```
//!
//! `run` on a running application and `stop` on a stopped one are no-ops
//! that report the current status. A source that fails to start leaves the
//! application stopped.

mod builder;

pub use builder::ApplicationBuilder;

use parking_lot::Mutex;
use serde::Serialize;
use std::{fmt, sync::Arc};
use stratum_core::{
    DispatchError, Dispatcher, Event, EventSource, Logger, ResponseStack, SourceError, log_context,
};
use stratum_std::{dispatch::RouteDispatcher, routing::RouteTable, scope::Scope};

/// Where an application is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Not accepting events.
    Stopped,
    /// The event source is starting.
    Starting,
    /// Accepting events.
    Running,
    /// The event source is stopping.
    Stopping,
}

/// Result of [`Application::run`] and [`Application::stop`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppStatus {
    /// Application name.
    pub name: String,
    /// Lifecycle state after the call.
    pub state: LifecycleState,
    /// `true` only in [`LifecycleState::Running`].
    pub running: bool,
}

/// One assembled layer.
pub struct Application {
    name: String,
    source: Box<dyn EventSource>,
    dispatcher: Arc<RouteDispatcher>,
    scope: Scope,
    logger: Arc<dyn Logger>,
    state: Mutex<LifecycleState>,
}

impl Application {
    /// Start assembling an application.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// The application's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scope this application resolves from.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The logger the application was assembled with.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// The installed routes.
    pub fn routes(&self) -> &RouteTable {
        self.dispatcher.table()
    }

    /// The dispatcher handed to the event source on `run`.
    pub fn dispatcher(&self) -> Arc<RouteDispatcher> {
        self.dispatcher.clone()
    }

    /// Current status.
    pub fn status(&self) -> AppStatus {
        self.status_of(*self.state.lock())
    }

    /// Returns `true` while running.
    pub fn is_running(&self) -> bool {
        *self.state.lock() == LifecycleState::Running
    }

    /// Dispatch `event` directly, bypassing the event source.
    ///
    /// Works in any lifecycle state.
    pub async fn dispatch(&self, event: &Event) -> Result<ResponseStack, DispatchError> {
        self.dispatcher.dispatch(event).await
    }

    /// Start the event source with this application's dispatcher.
    pub async fn run(&self) -> Result<AppStatus, SourceError> {
        {
            let mut state = self.state.lock();
            if *state != LifecycleState::Stopped {
                return Ok(self.status_of(*state));
            }
            *state = LifecycleState::Starting;
        }

        self.logger.info(
            "application starting",
            &log_context! { "app" => self.name, "source" => self.source.name() },
        );
        if let Err(err) = self.source.start(self.dispatcher.clone()).await {
            *self.state.lock() = LifecycleState::Stopped;
            self.logger.error(
                "event source failed to start",
                &log_context! { "app" => self.name, "error" => err.to_string() },
            );
            return Err(err);
        }

        *self.state.lock() = LifecycleState::Running;
        self.logger.info(
            "application running",
            &log_context! { "app" => self.name, "routes" => self.routes().len() },
        );
        Ok(self.status())
    }

    /// Stop the event source.
    ///
    /// The application ends up stopped even if the source reports an error.
    pub async fn stop(&self) -> Result<AppStatus, SourceError> {
        {
            let mut state = self.state.lock();
            if *state != LifecycleState::Running {
                return Ok(self.status_of(*state));
            }
            *state = LifecycleState::Stopping;
        }

        let result = self.source.stop().await;
        *self.state.lock() = LifecycleState::Stopped;
        match result {
            Ok(()) => {
                self.logger
                    .info("application stopped", &log_context! { "app" => self.name });
                Ok(self.status())
            }
            Err(err) => {
                self.logger.error(
                    "event source failed to stop cleanly",
                    &log_context! { "app" => self.name, "error" => err.to_string() },
                );
                Err(err)
            }
        }
    }

    fn status_of(&self, state: LifecycleState) -> AppStatus {
        AppStatus {
            name: self.name.clone(),
            state,
            running: state == LifecycleState::Running,
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("source", &self.source.name())
            .field("routes", &self.routes().len())
            .field("state", &*self.state.lock())
            .finish()
    }
}
