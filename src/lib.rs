//! # vireo
//!
//! A tiny REST API server over a single JSON file. Nothing more.
//!
//! ## The contract
//!
//! One JSON document on disk holds a handful of named collections. vireo
//! guarantees the document exists before the listener binds — reusing what
//! a previous deploy wrote, copying in the bundled seed on first run, or
//! creating an empty document — and then serves conventional CRUD routes
//! over each collection, a `/healthz` probe, and permissive CORS for
//! browser clients. Every read loads the whole document, every mutation
//! rewrites it atomically; the file stays valid JSON at all times.
//!
//! What vireo intentionally does not do: authentication, schema
//! validation, filtering/pagination, multi-process coordination. A mobile
//! app backend with one small instance and a persistent disk does not need
//! them, and a reverse proxy or a real database is the answer when it
//! starts to.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vireo::{Config, Cors, Server, Store, routes, store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vireo::Error> {
//!     let config = Config::from_env()?;
//!     store::ensure(&config.db_file, Some(&config.seed_file))?;
//!
//!     let store = Arc::new(Store::open(config.db_file.clone()));
//!     let app = routes::app(&config, store);
//!
//!     Server::bind(&format!("0.0.0.0:{}", config.port))
//!         .cors(Cors::new(config.cors_origin.clone()))
//!         .serve(app)
//!         .await
//! }
//! ```

mod config;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;
pub mod routes;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use middleware::Cors;
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use router::Router;
pub use server::Server;
pub use store::Store;
