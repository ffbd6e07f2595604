//! Health-check handler.
//!
//! Deployment platforms poll `/healthz` to decide whether the instance gets
//! traffic. The payload reports the resolved document path so a glance at
//! the probe output confirms which file the instance is serving from.

use std::path::Path;

use serde::Serialize;

use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

#[derive(Serialize)]
struct Health<'a> {
    ok: bool,
    #[serde(rename = "dbFile")]
    db_file: &'a str,
}

/// Builds the `/healthz` handler for the given document path.
///
/// Always `200 OK` with `{"ok":true,"dbFile":"<path>"}` — if the process can
/// respond at all, it is alive; the document's existence was already settled
/// at startup.
pub fn healthz(db_file: &Path) -> impl Handler {
    let body = serde_json::to_vec(&Health {
        ok: true,
        db_file: &db_file.to_string_lossy(),
    })
    .unwrap_or_default();

    move |_req: Request| {
        let body = body.clone();
        async move { Response::json(body) }
    }
}
