//! Request pipeline configuration.
//!
//! The pipeline is handed to the bootstrapper as a callback so local mode
//! and invocation mode wire the application identically.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue, Method},
    Extension, Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::app::bootstrap::BootstrapError;
use crate::config::{CorsConfig, PipelineConfig};

/// Callback applied to the constructed application.
pub type Pipeline = Arc<dyn Fn(Router) -> Result<Router, BootstrapError> + Send + Sync>;

/// Pipeline that leaves the application untouched.
pub fn passthrough() -> Pipeline {
    Arc::new(|router: Router| -> Result<Router, BootstrapError> { Ok(router) })
}

/// Pipeline registering validation options and the CORS policy.
pub fn standard(config: &PipelineConfig) -> Pipeline {
    let config = config.clone();
    Arc::new(move |router: Router| -> Result<Router, BootstrapError> {
        let router = router.layer(Extension(config.validation));
        if !config.cors.enabled {
            return Ok(router);
        }
        Ok(router.layer(cors_layer(&config.cors)?))
    })
}

/// Build a CORS layer from configuration.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, BootstrapError> {
    let origins = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| BootstrapError::Pipeline(format!("origin '{}': {}", origin, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    let methods = if config.allowed_methods.iter().any(|m| m == "*") {
        AllowMethods::any()
    } else {
        let methods = config
            .allowed_methods
            .iter()
            .map(|method| {
                Method::from_bytes(method.as_bytes())
                    .map_err(|e| BootstrapError::Pipeline(format!("method '{}': {}", method, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowMethods::list(methods)
    };

    let headers = if config.allowed_headers.iter().any(|h| h == "*") {
        AllowHeaders::any()
    } else {
        let headers = config
            .allowed_headers
            .iter()
            .map(|header| {
                HeaderName::from_bytes(header.as_bytes())
                    .map_err(|e| BootstrapError::Pipeline(format!("header '{}': {}", header, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowHeaders::list(headers)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers);

    if let Some(secs) = config.max_age_secs {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Ok(layer)
}
