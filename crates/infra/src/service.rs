//! Default service stacks

use courier_core::{AsyncService, Service};
use courier_domain::{Result, TransportConfig};

use crate::http::{AsyncReqwestTransport, ReqwestTransport, TransportBuilder};

/// Blocking service over reqwest
pub type ReqwestService = Service<ReqwestTransport>;

/// Cooperative service over reqwest
pub type AsyncReqwestService = AsyncService<AsyncReqwestTransport>;

/// Blocking service for `base_url`
///
/// # Errors
/// Returns `CourierError::Config` for an invalid base URL or configuration.
pub fn reqwest_service(base_url: &str, config: &TransportConfig) -> Result<ReqwestService> {
    let transport = TransportBuilder::new(base_url).config(config.clone()).build_blocking()?;
    Ok(Service::new(transport))
}

/// Cooperative service for `base_url`
///
/// # Errors
/// Returns `CourierError::Config` for an invalid base URL or configuration.
pub fn async_reqwest_service(base_url: &str, config: &TransportConfig) -> Result<AsyncReqwestService> {
    let transport = TransportBuilder::new(base_url).config(config.clone()).build_async()?;
    Ok(AsyncService::new(transport))
}
