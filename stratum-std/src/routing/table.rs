//! Route table and its builder.

use super::RouteResult;
use crate::{
    controller::{ControllerSource, Endpoint},
    middleware::MiddlewareChain,
    scope::Scope,
};
use std::{collections::HashMap, fmt, sync::Arc};
use stratum_core::{AssemblyError, Logger, ParamBinding, RoutePattern, Selector, log_context};

/// One installed route.
pub struct RouteEntry {
    pattern: RoutePattern,
    handler: String,
    bindings: Vec<ParamBinding>,
    chain: MiddlewareChain,
    endpoint: Arc<dyn Endpoint>,
}

impl RouteEntry {
    pub(crate) fn new(
        pattern: RoutePattern,
        handler: String,
        bindings: Vec<ParamBinding>,
        chain: MiddlewareChain,
        endpoint: Arc<dyn Endpoint>,
    ) -> Self {
        Self {
            pattern,
            handler,
            bindings,
            chain,
            endpoint,
        }
    }

    /// What the route answers to.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// `Controller::method` label.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Parameter bindings, in order.
    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }

    /// Middleware run before the handler.
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    pub(crate) fn endpoint(&self) -> &dyn Endpoint {
        self.endpoint.as_ref()
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern.to_string())
            .field("handler", &self.handler)
            .field("bindings", &self.bindings)
            .field("middleware", &self.chain.len())
            .finish()
    }
}

/// Immutable, ordered set of routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Start building a table.
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Install every controller into `scope` and collect their routes.
    pub fn from_controllers<'a, I>(controllers: I, scope: &Scope) -> Result<Self, AssemblyError>
    where
        I: IntoIterator<Item = &'a dyn ControllerSource>,
    {
        let mut builder = Self::builder();
        for controller in controllers {
            builder.install(controller, scope)?;
        }
        Ok(builder.build())
    }

    /// The first route, in registration order, whose pattern matches.
    pub fn route(&self, selector: &Selector) -> RouteResult<'_, RouteEntry> {
        match self.entries.iter().find(|e| e.pattern.matches(selector)) {
            Some(entry) => RouteResult::Matched(entry),
            None => RouteResult::NotFound,
        }
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate routes in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, RouteEntry> {
        self.entries.iter()
    }
}

/// Builder for [`RouteTable`].
#[derive(Default)]
pub struct RouteTableBuilder {
    entries: Vec<RouteEntry>,
    index: HashMap<RoutePattern, usize>,
    logger: Option<Arc<dyn Logger>>,
}

impl RouteTableBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report shadowed routes through `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Add one route. An identical pattern already present is an error.
    ///
    /// A route that an earlier, broader pattern already covers is accepted
    /// but can never match; it is reported as a warning.
    pub fn insert(&mut self, entry: RouteEntry) -> Result<(), AssemblyError> {
        if let Some(&existing) = self.index.get(&entry.pattern) {
            return Err(AssemblyError::DuplicateRoute {
                pattern: entry.pattern.to_string(),
                first: self.entries[existing].handler.clone(),
                second: entry.handler,
            });
        }
        let shadowing = self.entries.iter().find(|e| e.pattern.covers(&entry.pattern));
        if let (Some(logger), Some(earlier)) = (&self.logger, shadowing) {
            logger.warning(
                "route is shadowed by an earlier route and will never match",
                &log_context! {
                    "pattern" => entry.pattern.to_string(),
                    "handler" => entry.handler,
                    "shadowed_by" => earlier.handler,
                },
            );
        }
        self.index.insert(entry.pattern.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Install `controller` into `scope` and add its routes.
    pub fn install(
        &mut self,
        controller: &dyn ControllerSource,
        scope: &Scope,
    ) -> Result<(), AssemblyError> {
        for entry in controller.install(scope)? {
            self.insert(entry)?;
        }
        Ok(())
    }

    /// Finish building.
    pub fn build(self) -> RouteTable {
        RouteTable {
            entries: self.entries,
        }
    }
}
