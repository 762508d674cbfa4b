//! Dynamic resources.
//!
//! A [`DynamicResource`] is a named group of routes served by one handler
//! pool. At build time its handlers are sorted by path depth and turned into
//! actions whose ids are their positions in that sorted list. The two lists
//! live together in an `ActionTable` and are never touched separately, so an
//! action id always names its own handler.
//!
//! Precedence is positional. Deeper templates (more `/`) are tried first so
//! `/users/{id}` cannot shadow `/users/{id}/orders/{orderId}`; templates of
//! equal depth keep their registration order, and the earlier one wins.

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use http::{StatusCode, Uri};
use tracing::{debug, error, info};

use crate::action::{Action, MappedParameters, MatchResult};
use crate::config::ServerConfig;
use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::method::Method;
use crate::pool::HandlerPool;
use crate::request::Request;
use crate::response::Response;

// ── RequestHandler ────────────────────────────────────────────────────────────

/// A registered route: verb, path template, a description of what the
/// handler expects, and the handler itself.
#[derive(Clone)]
pub struct RequestHandler {
    method: Method,
    path: String,
    action_signature: String,
    handler: BoxedHandler,
}

impl RequestHandler {
    pub fn new(method: Method, path: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            method,
            path: path.into(),
            action_signature: String::new(),
            handler: handler.into_boxed_handler(),
        }
    }

    /// Human-readable parameter list, e.g. `"String userId"`. Only used in
    /// the action's `to` description.
    pub fn with_signature(mut self, action_signature: impl Into<String>) -> Self {
        self.action_signature = action_signature.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn action_signature(&self) -> &str { &self.action_signature }

    fn depth(&self) -> usize {
        self.path.bytes().filter(|&b| b == b'/').count()
    }
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("action_signature", &self.action_signature)
            .finish_non_exhaustive()
    }
}

/// Stable sort, deepest path first.
fn sort_by_depth(handlers: &mut [RequestHandler]) {
    handlers.sort_by_key(|h| Reverse(h.depth()));
}

// ── ActionTable ───────────────────────────────────────────────────────────────

/// Sorted handlers and their actions, built in one step.
#[derive(Debug)]
struct ActionTable {
    handlers: Box<[RequestHandler]>,
    actions: Box<[Action]>,
}

impl ActionTable {
    fn build(mut handlers: Vec<RequestHandler>) -> Result<Self, Error> {
        sort_by_depth(&mut handlers);
        let actions = handlers.iter()
            .enumerate()
            .map(|(id, h)| Action::new(id, h.method, &h.path, &h.action_signature))
            .collect::<Result<Box<[_]>, _>>()?;

        Ok(Self { handlers: handlers.into_boxed_slice(), actions })
    }

    fn match_with(&self, method: Method, uri: &Uri) -> MatchResult {
        self.actions.iter()
            .map(|action| action.match_with(method, uri))
            .find(MatchResult::is_matched)
            .unwrap_or(MatchResult::Unmatched)
    }

    fn handler(&self, action_id: usize) -> Option<&RequestHandler> {
        self.handlers.get(action_id)
    }
}

// ── DynamicResource ───────────────────────────────────────────────────────────

/// A named set of routes dispatched through a fixed handler pool.
///
/// Read-only once built; share it freely across tasks.
#[derive(Debug)]
pub struct DynamicResource {
    name: Arc<str>,
    table: ActionTable,
    pool: Arc<HandlerPool>,
}

impl DynamicResource {
    pub fn new(
        name: impl Into<String>,
        handler_pool_size: usize,
        handlers: Vec<RequestHandler>,
    ) -> Result<Self, Error> {
        let name: Arc<str> = Arc::from(name.into());
        let table = ActionTable::build(handlers)?;
        let pool = HandlerPool::new(handler_pool_size);

        info!(resource = %name, actions = table.actions.len(), pool = pool.size(), "resource registered");
        for action in table.actions.iter() {
            debug!(resource = %name, id = action.id(), method = %action.method(), path = action.path(), to = action.to(), "action");
        }

        Ok(Self { name, table, pool })
    }

    pub fn builder(name: impl Into<String>) -> ResourceBuilder {
        ResourceBuilder { name: name.into(), handler_pool_size: 1, handlers: Vec::new() }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn actions(&self) -> &[Action] { &self.table.actions }
    pub fn handlers(&self) -> &[RequestHandler] { &self.table.handlers }
    pub fn pool(&self) -> &Arc<HandlerPool> { &self.pool }

    /// First action, in id order, that accepts `method` and `uri`.
    pub fn match_with(&self, method: Method, uri: &Uri) -> MatchResult {
        self.table.match_with(method, uri)
    }

    /// Resolves `parameters.action_id()` to its handler and returns the
    /// future that runs it on a pooled instance.
    ///
    /// The lookup happens here, before anything is awaited: an id with no
    /// handler fails with [`Error::ActionMismatch`], which hands the request
    /// back, and no handler runs.
    pub fn dispatch(&self, mut request: Request, parameters: MappedParameters) -> Result<BoxFuture, Error> {
        let action_id = parameters.action_id();
        let Some(handler) = self.table.handler(action_id) else {
            return Err(Error::ActionMismatch { request: Box::new(request), parameters });
        };

        let handler = Arc::clone(&handler.handler);
        let pool = Arc::clone(&self.pool);
        let name = Arc::clone(&self.name);
        request.set_params(parameters);

        Ok(Box::pin(async move {
            let instance = pool.acquire().await;
            debug!(resource = %name, action = action_id, instance = instance.index(), "dispatching");
            let response = handler.call(request).await;
            drop(instance);
            response
        }))
    }
}

// ── ResourceBuilder ───────────────────────────────────────────────────────────

/// Chained registration for a [`DynamicResource`].
///
/// ```rust
/// # use restmux::{DynamicResource, Method, Request, Response};
/// # async fn get_user(_: Request) -> Response { Response::text("") }
/// # async fn list_orders(_: Request) -> Response { Response::text("") }
/// let users = DynamicResource::builder("users")
///     .handler_pool_size(4)
///     .on(Method::Get, "/users/{id}", get_user)
///     .on_with_signature(Method::Get, "/users/{id}/orders", "String id", list_orders)
///     .build()?;
///
/// assert_eq!(users.actions()[0].path(), "/users/{id}/orders");
/// # Ok::<(), restmux::Error>(())
/// ```
pub struct ResourceBuilder {
    name: String,
    handler_pool_size: usize,
    handlers: Vec<RequestHandler>,
}

impl ResourceBuilder {
    pub fn handler_pool_size(mut self, size: usize) -> Self {
        self.handler_pool_size = size;
        self
    }

    /// Takes the pool size configured for this resource's name.
    pub fn configured(self, config: &ServerConfig) -> Self {
        let size = config.handler_pool_size(&self.name);
        self.handler_pool_size(size)
    }

    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.handler(RequestHandler::new(method, path, handler))
    }

    pub fn on_with_signature(
        self,
        method: Method,
        path: &str,
        action_signature: &str,
        handler: impl Handler,
    ) -> Self {
        self.handler(RequestHandler::new(method, path, handler).with_signature(action_signature))
    }

    pub fn handler(mut self, handler: RequestHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Fails with [`Error::InvalidRoute`] on the first bad template.
    pub fn build(self) -> Result<DynamicResource, Error> {
        DynamicResource::new(self.name, self.handler_pool_size, self.handlers)
    }
}

// ── Resources ─────────────────────────────────────────────────────────────────

/// Every resource a server hosts, tried in registration order.
#[derive(Debug, Default)]
pub struct Resources {
    resources: Vec<DynamicResource>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: DynamicResource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn get(&self, name: &str) -> Option<&DynamicResource> {
        self.resources.iter().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DynamicResource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The first resource that matches, with the parameters it extracted.
    pub fn match_with(&self, method: Method, uri: &Uri) -> Option<(&DynamicResource, MappedParameters)> {
        self.resources.iter().find_map(|resource| {
            resource.match_with(method, uri)
                .into_parameters()
                .map(|params| (resource, params))
        })
    }

    /// Matches, dispatches and awaits `request`.
    ///
    /// Unmatched requests get `404 Not Found`; an action mismatch is logged
    /// and answered with `500 Internal Server Error`.
    pub async fn handle(&self, request: Request) -> Response {
        let Some((resource, params)) = self.match_with(request.method(), request.uri()) else {
            debug!(method = %request.method(), uri = %request.uri(), "no resource matched");
            return Response::status(StatusCode::NOT_FOUND);
        };

        match resource.dispatch(request, params) {
            Ok(dispatched) => dispatched.await,
            Err(e) => {
                error!(resource = resource.name(), "{e}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl FromIterator<DynamicResource> for Resources {
    fn from_iter<I: IntoIterator<Item = DynamicResource>>(iter: I) -> Self {
        Self { resources: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    async fn noop(_req: Request) -> Response {
        Response::text("")
    }

    fn handlers(paths: &[&str]) -> Vec<RequestHandler> {
        paths.iter()
            .enumerate()
            .map(|(i, p)| RequestHandler::new(Method::Get, *p, noop).with_signature(i.to_string()))
            .collect()
    }

    #[test]
    fn sorts_deepest_first_and_keeps_ties_in_order() {
        let resource = DynamicResource::new(
            "r",
            1,
            handlers(&["/a", "/b/{x}", "/c", "/d/{y}/e", "/f/{z}"]),
        )
        .unwrap();

        let paths: Vec<_> = resource.handlers().iter().map(RequestHandler::path).collect();
        assert_eq!(paths, ["/d/{y}/e", "/b/{x}", "/f/{z}", "/a", "/c"]);
    }

    #[test]
    fn action_ids_follow_sorted_positions() {
        let resource = DynamicResource::new("r", 1, handlers(&["/a", "/b/{x}", "/c/{y}/z"])).unwrap();

        for (i, (action, handler)) in resource.actions().iter().zip(resource.handlers()).enumerate() {
            assert_eq!(action.id(), i);
            assert_eq!(action.path(), handler.path());
            assert_eq!(action.to(), format!("dynamic{i}({})", handler.action_signature()));
        }
    }

    #[test]
    fn matching_returns_the_id_of_the_only_accepting_handler() {
        let resource = DynamicResource::new(
            "r",
            1,
            handlers(&["/a", "/b/{x}", "/c/{y}/z", "/d/{w}/e/{v}", "/f"]),
        )
        .unwrap();

        let uris = [
            ("/a", "/a"),
            ("/b/{x}", "/b/1"),
            ("/c/{y}/z", "/c/2/z"),
            ("/d/{w}/e/{v}", "/d/3/e/4"),
            ("/f", "/f"),
        ];
        for (i, handler) in resource.handlers().iter().enumerate() {
            let (_, uri) = uris.iter().find(|(path, _)| *path == handler.path()).unwrap();
            let params = resource.match_with(Method::Get, &uri.parse::<Uri>().unwrap())
                .into_parameters()
                .unwrap();
            assert_eq!(params.action_id(), i, "{uri}");
        }
    }

    #[test]
    fn equal_depth_overlaps_go_to_the_earlier_registration() {
        let resource = DynamicResource::new("r", 1, handlers(&["/users/me", "/users/{id}"])).unwrap();
        let matched = resource.match_with(Method::Get, &Uri::from_static("/users/me"));
        assert_eq!(matched.into_parameters().unwrap().action_id(), 0);
    }

    #[test]
    fn invalid_templates_fail_the_build() {
        let err = DynamicResource::builder("r").on(Method::Get, "/files/{*rest}/meta", noop).build().unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
    }

    #[test]
    fn configured_pool_size_is_applied() {
        let config = ServerConfig::from_toml_str("[resources.users]\nhandler_pool_size = 3").unwrap();
        let resource = DynamicResource::builder("users").configured(&config).build().unwrap();
        assert_eq!(resource.pool().size(), 3);
    }

    #[tokio::test]
    async fn out_of_range_ids_never_reach_a_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let resource = DynamicResource::builder("r")
            .on(Method::Get, "/a", move |_req: Request| {
                counted.fetch_add(1, Ordering::SeqCst);
                async { Response::text("a") }
            })
            .build()
            .unwrap();

        let request = Request::new(Method::Get, Uri::from_static("/a"));
        let parameters = MappedParameters::new(1, Method::Get, Vec::new());
        let err = resource.dispatch(request, parameters).err().unwrap();

        match err {
            Error::ActionMismatch { request, parameters } => {
                assert_eq!(request.path(), "/a");
                assert_eq!(parameters.action_id(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dispatch_hands_parameters_to_the_handler() {
        let resource = DynamicResource::builder("users")
            .on(Method::Get, "/users/{id}", |req: Request| async move {
                format!("user {}", req.param("id").unwrap_or("?"))
            })
            .build()
            .unwrap();

        let uri = Uri::from_static("/users/42");
        let params = resource.match_with(Method::Get, &uri).into_parameters().unwrap();
        let response = resource.dispatch(Request::new(Method::Get, uri), params).unwrap().await;

        assert_eq!(response.body(), b"user 42");
        assert_eq!(resource.pool().available(), 1);
    }

    #[tokio::test]
    async fn resources_answer_not_found_when_nothing_matches() {
        let resources: Resources = [DynamicResource::builder("r").on(Method::Get, "/a", noop).build().unwrap()]
            .into_iter()
            .collect();

        let response = resources.handle(Request::new(Method::Post, Uri::from_static("/a"))).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }
}
