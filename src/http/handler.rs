//! Request handler: route registration and dispatch for one traffic class.
//!
//! # Responsibilities
//! - Prefix every registered pattern with the handler's context path
//! - Keep the route table (last registration of a pattern wins)
//! - Resolve a request path to the most specific registered pattern
//!
//! # Design Decisions
//! - Patterns ending in `/` match their whole subtree, other patterns
//!   match exactly; the longest match wins
//! - `/tree` redirects to `/tree/` when only the subtree is registered
//! - Copy-on-write table: registration swaps in a new table, serving reads
//!   an immutable snapshot without locking
//! - Unmatched paths are answered with 404, never surfaced as errors

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Router,
};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::observability::metrics;

/// What a registered pattern does.
pub type Behavior = MethodRouter<(), Infallible>;

/// Immutable mapping from path pattern to behavior.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Behavior>,
}

/// Outcome of looking up a request path.
pub enum Resolution<'a> {
    Found(&'a Behavior),
    /// Only the subtree form of the path is registered.
    Redirect(String),
    NotFound,
}

impl RouteTable {
    /// Bind `pattern`, returning the behavior it replaced.
    pub fn insert(&mut self, pattern: String, behavior: Behavior) -> Option<Behavior> {
        self.routes.insert(pattern, behavior)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.routes.contains_key(pattern)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered patterns, sorted.
    pub fn patterns(&self) -> Vec<&str> {
        let mut patterns: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        patterns.sort_unstable();
        patterns
    }

    pub fn resolve(&self, path: &str) -> Resolution<'_> {
        if let Some(behavior) = self.routes.get(path) {
            return Resolution::Found(behavior);
        }

        if !path.ends_with('/') {
            let subtree = format!("{}/", path);
            if self.routes.contains_key(&subtree) {
                return Resolution::Redirect(subtree);
            }
        }

        self.routes
            .iter()
            .filter(|(pattern, _)| pattern.ends_with('/') && path.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map_or(Resolution::NotFound, |(_, behavior)| Resolution::Found(behavior))
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.patterns()).finish()
    }
}

/// Route registration capability for one traffic class.
///
/// Cloning is cheap and every clone shares the same table, so the copy held
/// by a connector set sees routes registered through the environment.
#[derive(Clone)]
pub struct RequestHandler {
    name: Arc<str>,
    context_path: Arc<str>,
    routes: Arc<ArcSwap<RouteTable>>,
}

impl RequestHandler {
    /// `name` labels logs and metrics ("application", "admin").
    pub fn new(name: impl Into<String>, context_path: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            context_path: Arc::from(context_path.into()),
            routes: Arc::new(ArcSwap::from_pointee(RouteTable::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// Bind `pattern` (below the context path) to `behavior`.
    ///
    /// Registering a pattern again replaces the earlier behavior.
    pub fn handle(&self, pattern: &str, behavior: Behavior) {
        let path = if pattern.starts_with('/') {
            format!("{}{}", self.context_path, pattern)
        } else {
            format!("{}/{}", self.context_path, pattern)
        };

        let previous = self.routes.rcu(|table| {
            let mut table = RouteTable::clone(table);
            table.insert(path.clone(), behavior.clone());
            table
        });

        if previous.contains(&path) {
            tracing::debug!(handler = %self.name, pattern = %path, "Route replaced");
        } else {
            tracing::debug!(handler = %self.name, pattern = %path, "Route registered");
        }
    }

    /// Current routes.
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    /// Axum router serving a snapshot of the current routes.
    pub fn router(&self) -> Router {
        let state = DispatchState {
            name: Arc::clone(&self.name),
            routes: self.routes(),
        };
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }
}

impl std::fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler")
            .field("name", &self.name)
            .field("context_path", &self.context_path)
            .field("routes", &self.routes.load())
            .finish()
    }
}

#[derive(Clone)]
struct DispatchState {
    name: Arc<str>,
    routes: Arc<RouteTable>,
}

async fn dispatch(State(state): State<DispatchState>, request: Request<Body>) -> Response {
    let response = match state.routes.resolve(request.uri().path()) {
        Resolution::Found(behavior) => match behavior.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        },
        Resolution::Redirect(mut location) => {
            if let Some(query) = request.uri().query() {
                location.push('?');
                location.push_str(query);
            }
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
        }
        Resolution::NotFound => (StatusCode::NOT_FOUND, "404 page not found\n").into_response(),
    };

    metrics::record_request(&state.name, response.status().as_u16());
    response
}
