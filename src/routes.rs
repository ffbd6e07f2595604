//! REST routes over the document's collections.
//!
//! Each collection gets the conventional verb mapping: GET list/read, POST
//! create, PUT replace, PATCH merge, DELETE remove. The handlers are thin —
//! parse the body if there is one, call the matching store operation, map
//! the outcome onto a status code. Query strings are accepted and ignored.

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::config::Config;
use crate::error::Error;
use crate::health;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::store::{COLLECTIONS, Record, Store};

/// Builds the full application router: `/healthz` plus CRUD routes for each
/// of the document's collections.
pub fn app(config: &Config, store: Arc<Store>) -> Router {
    let mut router = Router::new().get("/healthz", health::healthz(&config.db_file));
    for name in COLLECTIONS {
        router = mount(router, Arc::clone(&store), name);
    }
    router
}

fn mount(router: Router, store: Arc<Store>, name: &'static str) -> Router {
    let collection = format!("/{name}");
    let item = format!("/{name}/{{id}}");

    let s = Arc::clone(&store);
    let router = router.get(&collection, move |_req: Request| {
        let s = Arc::clone(&s);
        async move { list(&s, name) }
    });

    let s = Arc::clone(&store);
    let router = router.get(&item, move |req: Request| {
        let s = Arc::clone(&s);
        async move { fetch(&s, name, &req) }
    });

    let s = Arc::clone(&store);
    let router = router.post(&collection, move |req: Request| {
        let s = Arc::clone(&s);
        async move { create(&s, name, &req) }
    });

    let s = Arc::clone(&store);
    let router = router.put(&item, move |req: Request| {
        let s = Arc::clone(&s);
        async move { replace(&s, name, &req) }
    });

    let s = Arc::clone(&store);
    let router = router.patch(&item, move |req: Request| {
        let s = Arc::clone(&s);
        async move { merge(&s, name, &req) }
    });

    let s = Arc::clone(&store);
    router.delete(&item, move |req: Request| {
        let s = Arc::clone(&s);
        async move { remove(&s, name, &req) }
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────────

fn list(store: &Store, collection: &str) -> Response {
    match store.list(collection) {
        Ok(Some(records)) => json_or_500(&records),
        Ok(None) => Response::status(StatusCode::NOT_FOUND),
        Err(e) => internal_error(&e),
    }
}

fn fetch(store: &Store, collection: &str, req: &Request) -> Response {
    let Some(id) = req.param("id") else {
        return Response::status(StatusCode::NOT_FOUND);
    };
    match store.find(collection, id) {
        Ok(Some(record)) => json_or_500(&record),
        Ok(None) => Response::status(StatusCode::NOT_FOUND),
        Err(e) => internal_error(&e),
    }
}

fn create(store: &Store, collection: &str, req: &Request) -> Response {
    let Ok(record) = req.json::<Record>() else {
        return Response::status(StatusCode::BAD_REQUEST);
    };
    match store.create(collection, record) {
        Ok(Some(created)) => match serde_json::to_vec(&created) {
            Ok(bytes) => Response::builder().status(StatusCode::CREATED).json(bytes),
            Err(e) => internal_error(&Error::Json(e)),
        },
        Ok(None) => Response::status(StatusCode::NOT_FOUND),
        Err(e) => internal_error(&e),
    }
}

fn replace(store: &Store, collection: &str, req: &Request) -> Response {
    let Some(id) = req.param("id") else {
        return Response::status(StatusCode::NOT_FOUND);
    };
    let Ok(record) = req.json::<Record>() else {
        return Response::status(StatusCode::BAD_REQUEST);
    };
    match store.replace(collection, id, record) {
        Ok(Some(updated)) => json_or_500(&updated),
        Ok(None) => Response::status(StatusCode::NOT_FOUND),
        Err(e) => internal_error(&e),
    }
}

fn merge(store: &Store, collection: &str, req: &Request) -> Response {
    let Some(id) = req.param("id") else {
        return Response::status(StatusCode::NOT_FOUND);
    };
    let Ok(patch) = req.json::<Record>() else {
        return Response::status(StatusCode::BAD_REQUEST);
    };
    match store.merge(collection, id, patch) {
        Ok(Some(updated)) => json_or_500(&updated),
        Ok(None) => Response::status(StatusCode::NOT_FOUND),
        Err(e) => internal_error(&e),
    }
}

fn remove(store: &Store, collection: &str, req: &Request) -> Response {
    let Some(id) = req.param("id") else {
        return Response::status(StatusCode::NOT_FOUND);
    };
    match store.remove(collection, id) {
        Ok(Some(_)) => Response::status(StatusCode::NO_CONTENT),
        Ok(None) => Response::status(StatusCode::NOT_FOUND),
        Err(e) => internal_error(&e),
    }
}

fn json_or_500<T: Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => Response::json(bytes),
        Err(e) => internal_error(&Error::Json(e)),
    }
}

fn internal_error(error: &Error) -> Response {
    error!("request failed: {error}");
    Response::status(StatusCode::INTERNAL_SERVER_ERROR)
}
