use tower_http::cors::{Any, CorsLayer};

/// Browser clients are served from a separate origin; authentication is
/// bearer-token based, so credentials are never sent cross-origin.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
