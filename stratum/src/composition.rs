//! # Layered Composition
//!
//! Layers forward inward through delegate event sources, so an inner layer
//! must be running before an outer layer accepts events. Otherwise the
//! outer layer's forwards fail with `NoDispatcherBound`.
//! [`LayeredApplication`] encodes that ordering.

use crate::app::{AppStatus, Application};
use stratum_core::{Logger, SourceError, log_context};

/// A stack of applications, outermost first.
///
/// ```rust,ignore
/// let stack = LayeredApplication::new()
///     .layer(security)   // outermost: receives external events
///     .layer(business);  // innermost: fed by security's delegate
///
/// stack.run().await?;    // starts business, then security
/// stack.stop().await?;   // stops security, then business
/// ```
#[derive(Debug, Default)]
pub struct LayeredApplication {
    layers: Vec<Application>,
}

impl LayeredApplication {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer inside the ones already added.
    pub fn layer(mut self, app: Application) -> Self {
        self.layers.push(app);
        self
    }

    /// Layers, outermost first.
    pub fn layers(&self) -> &[Application] {
        &self.layers
    }

    /// The layer named `name`.
    pub fn get(&self, name: &str) -> Option<&Application> {
        self.layers.iter().find(|app| app.name() == name)
    }

    /// The outermost layer.
    pub fn outermost(&self) -> Option<&Application> {
        self.layers.first()
    }

    /// Start every layer, innermost first.
    ///
    /// If a layer fails to start, the layers already started are stopped
    /// again (outermost first) and the error is returned. Statuses are
    /// returned outermost first.
    pub async fn run(&self) -> Result<Vec<AppStatus>, SourceError> {
        for (started, app) in self.layers.iter().rev().enumerate() {
            if let Err(err) = app.run().await {
                let inner = self.layers.len() - started..self.layers.len();
                for app in &self.layers[inner] {
                    if let Err(stop_err) = app.stop().await {
                        app.logger().error(
                            "layer failed to stop while rolling back a failed start",
                            &log_context! {
                                "app" => app.name(),
                                "error" => stop_err.to_string(),
                                "start_error" => err.to_string(),
                            },
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(self.status())
    }

    /// Stop every layer, outermost first.
    ///
    /// Every layer is asked to stop even if an earlier one fails; the first
    /// failure is returned.
    pub async fn stop(&self) -> Result<Vec<AppStatus>, SourceError> {
        let mut first_error = None;
        for app in &self.layers {
            if let Err(err) = app.stop().await {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(self.status()),
        }
    }

    /// Status of every layer, outermost first.
    pub fn status(&self) -> Vec<AppStatus> {
        self.layers.iter().map(Application::status).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LifecycleState;
    use stratum_std::{logging::silent_logger, sources::DelegateEventSource};

    fn layer(name: &str) -> Application {
        Application::builder()
            .with_name(name)
            .with_logger(silent_logger())
            .event_source(DelegateEventSource::with_logger(silent_logger()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_and_stop_every_layer() {
        let stack = LayeredApplication::new()
            .layer(layer("edge"))
            .layer(layer("core"));

        assert_eq!(stack.outermost().map(Application::name), Some("edge"));
        assert!(stack.get("core").is_some());
        assert!(stack.get("missing").is_none());

        let started = stack.run().await.unwrap();
        assert!(started.iter().all(|status| status.running));
        assert_eq!(started[0].name, "edge");

        let stopped = stack.stop().await.unwrap();
        assert!(
            stopped
                .iter()
                .all(|status| status.state == LifecycleState::Stopped)
        );
    }

    #[tokio::test]
    async fn test_empty_stack() {
        let stack = LayeredApplication::new();
        assert!(stack.outermost().is_none());
        assert!(stack.run().await.unwrap().is_empty());
    }
}
