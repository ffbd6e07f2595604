//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. Build it
//! once at startup and hand it to [`Server::serve`](crate::Server::serve).

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};

/// The application router.
///
/// Path parameters use `{name}` syntax and are retrieved with
/// [`Request::param`](crate::Request::param). Registration methods return
/// `self` so routes chain naturally:
///
/// ```rust,no_run
/// # use vireo::{Request, Response, Router};
/// # async fn list_tours(_: Request) -> Response { Response::text("") }
/// # async fn get_tour(_: Request) -> Response { Response::text("") }
/// let app = Router::new()
///     .get("/tours", list_tours)
///     .get("/tours/{id}", get_tour);
/// ```
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Register a handler for an arbitrary method + path pair.
    ///
    /// # Panics
    ///
    /// Panics on a malformed or conflicting route pattern. Routes are
    /// registered once at startup, so this surfaces immediately as a crash
    /// on boot rather than a latent 404.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ErasedHandler;
    use crate::request::Request;
    use crate::response::Response;

    fn request(params: HashMap<String, String>) -> Request {
        Request::new(
            Method::GET,
            "/tours/7".to_owned(),
            http::HeaderMap::new(),
            bytes::Bytes::new(),
            params,
        )
    }

    #[tokio::test]
    async fn lookup_extracts_path_params() {
        async fn echo_id(req: Request) -> Response {
            Response::text(req.param("id").unwrap_or("none").to_owned())
        }
        let router = Router::new().get("/tours/{id}", echo_id);

        let (handler, params) = router.lookup(&Method::GET, "/tours/7").unwrap();
        assert_eq!(params["id"], "7");

        let response = handler.call(request(params)).await;
        assert_eq!(response.body, b"7");
    }

    #[test]
    fn unknown_method_or_path_misses() {
        async fn ok(_: Request) -> Response {
            Response::text("ok")
        }
        let router = Router::new().get("/tours", ok);

        assert!(router.lookup(&Method::POST, "/tours").is_none());
        assert!(router.lookup(&Method::GET, "/bookings").is_none());
    }
}
