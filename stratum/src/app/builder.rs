use super::{Application, LifecycleState};
use crate::{LOGGER, config::ApplicationConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use stratum_core::{AssemblyError, EventSource, Logger, log_context};
use stratum_std::{
    controller::ControllerSource, dispatch::RouteDispatcher, logging::default_logger,
    routing::RouteTable, scope::Scope,
};

/// Builder for [`Application`].
///
/// # Example
///
/// ```rust,ignore
/// let app = Application::builder()
///     .with_config(ApplicationConfig::named("hello"))
///     .event_source(ChannelEventSource::new(64))
///     .controller(hello_controller())
///     .build()?;
/// ```
///
/// Assembly installs every controller into the scope, rejects duplicate
/// routes, and verifies that every controller and middleware token
/// resolves. Any of these failures aborts the build.
#[derive(Default)]
pub struct ApplicationBuilder {
    config: ApplicationConfig,
    scope: Option<Scope>,
    logger: Option<Arc<dyn Logger>>,
    source: Option<Box<dyn EventSource>>,
    controllers: Vec<Box<dyn ControllerSource>>,
}

impl ApplicationBuilder {
    /// Create a builder with a default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole config.
    pub fn with_config(mut self, config: ApplicationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the application name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Resolve from `scope` instead of a fresh root scope.
    ///
    /// Pass a child of a shared root to let layers share bindings.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Log through `logger`. It is also registered in the scope under
    /// [`LOGGER`] so controllers can resolve it.
    ///
    /// Without one, a logger already bound in the scope chain is reused,
    /// falling back to [`default_logger`].
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The event source that feeds this application.
    pub fn event_source<S: EventSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Add a controller. Routes keep the order controllers are added in.
    pub fn controller<C: ControllerSource + 'static>(mut self, controller: C) -> Self {
        self.controllers.push(Box::new(controller));
        self
    }

    /// Assemble the application.
    pub fn build(self) -> Result<Application, AssemblyError> {
        let Self {
            config,
            scope,
            logger,
            source,
            controllers,
        } = self;

        let source =
            source.ok_or_else(|| AssemblyError::MissingEventSource(config.name.clone()))?;
        let scope = scope.unwrap_or_else(|| Scope::root(config.name.clone()));
        let logger = match logger {
            Some(logger) => {
                scope.register_value(&LOGGER, logger.clone());
                logger
            }
            None => match scope.resolve_optional(&LOGGER) {
                Ok(Some(logger)) => logger,
                Ok(None) => {
                    let logger = default_logger();
                    scope.register_value(&LOGGER, logger.clone());
                    logger
                }
                Err(source) => {
                    return Err(AssemblyError::Unresolved {
                        component: "logger".to_string(),
                        source,
                    });
                }
            },
        };

        let mut routes = RouteTable::builder().with_logger(logger.clone());
        for controller in &controllers {
            routes.install(controller.as_ref(), &scope)?;
            if config.eager_controllers {
                controller.resolve_eagerly(&scope)?;
            }
        }
        let routes = routes.build();

        logger.info(
            "application assembled",
            &log_context! {
                "app" => config.name,
                "scope" => scope.chain(),
                "controllers" => controllers.len(),
                "routes" => routes.len(),
            },
        );

        let dispatcher = RouteDispatcher::new(routes, scope.clone(), logger.clone())
            .with_name(config.name.clone())
            .with_default_middleware_scope(config.default_middleware_scope);

        Ok(Application {
            name: config.name,
            source,
            dispatcher: Arc::new(dispatcher),
            scope,
            logger,
            state: Mutex::new(LifecycleState::Stopped),
        })
    }
}
