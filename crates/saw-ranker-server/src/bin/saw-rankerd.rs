use std::io;

use saw_ranker_server::{init_tracing, RankerServer, ServerConfig};
use tracing::{error, info, warn};

fn main() -> io::Result<()> {
    init_tracing();
    let config = ServerConfig::from_env().map_err(|err| {
        error!(error = %err, "invalid configuration");
        io::Error::new(io::ErrorKind::InvalidInput, err)
    })?;

    let server = RankerServer::new(config);
    match server.preload() {
        Ok(packages) => info!(packages, "dataset loaded"),
        Err(err) => warn!(
            error = %err,
            path = %server.config().dataset_path.display(),
            "dataset not loaded yet; data routes will fail until it is readable"
        ),
    }
    server.serve_http()
}
