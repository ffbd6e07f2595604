//! Permissive CORS decoration.

use http::{Method, StatusCode};

use crate::response::Response;

const ALLOW_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Adds the `access-control-*` headers to every response and answers
/// preflight requests.
///
/// The origin is configured once (default `*`); methods and headers are
/// fixed to what the API actually serves.
#[derive(Debug, Clone)]
pub struct Cors {
    origin: String,
}

impl Cors {
    pub fn new(origin: impl Into<String>) -> Self {
        Self { origin: origin.into() }
    }

    /// True for requests the middleware answers itself, before routing.
    pub(crate) fn is_preflight(&self, method: &Method) -> bool {
        method == &Method::OPTIONS
    }

    /// `200 OK` with the allow headers and no body.
    pub(crate) fn preflight(&self) -> Response {
        let mut response = Response::status(StatusCode::OK);
        self.decorate(&mut response);
        response
    }

    /// Appends the allow headers to a routed response.
    pub(crate) fn decorate(&self, response: &mut Response) {
        response.append_header("access-control-allow-origin", &self.origin);
        response.append_header("access-control-allow-methods", ALLOW_METHODS);
        response.append_header("access-control-allow-headers", ALLOW_HEADERS);
    }
}
