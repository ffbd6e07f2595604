//! Binary entry point: resolve config, ensure the document, serve.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use vireo::{Config, Cors, Error, Server, Store, routes, store};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // No valid document, no listener: refusing to start beats
            // serving 500s against a file that is not there.
            error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    store::ensure(&config.db_file, Some(&config.seed_file))?;
    let store = Arc::new(Store::open(config.db_file.clone()));

    let app = routes::app(&config, store);

    info!(port = config.port, db = %config.db_file.display(), "serving REST API");
    Server::bind(&format!("0.0.0.0:{}", config.port))
        .cors(Cors::new(config.cors_origin.clone()))
        .serve(app)
        .await
}
