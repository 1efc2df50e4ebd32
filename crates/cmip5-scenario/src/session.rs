//! Connection to the remote compute service.

use tracing::{info, warn};

use cmip5_common::{Cmip5Error, Cmip5Result};
use ee_client::RemoteService;

/// A remote service that has answered a connectivity check.
///
/// Every scenario operation takes a `Session`, so nothing is submitted to a
/// service that was never reached.
#[derive(Debug)]
pub struct Session<S> {
    service: S,
}

impl<S: RemoteService> Session<S> {
    /// Initialize the service and keep it for later submissions.
    ///
    /// A failed check is logged and returned as [`Cmip5Error::Connection`].
    pub async fn connect(service: S) -> Cmip5Result<Self> {
        match service.initialize().await {
            Ok(()) => {
                info!("Remote compute service initialized successfully");
                Ok(Self { service })
            }
            Err(e) => {
                warn!(error = %e, "Remote compute service could not be initialized");
                Err(match e {
                    Cmip5Error::Connection(msg) => Cmip5Error::Connection(msg),
                    other => Cmip5Error::Connection(other.to_string()),
                })
            }
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}
