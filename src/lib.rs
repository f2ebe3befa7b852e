// wxai gateway - library root

pub mod auth;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod routes;
pub mod streaming;

pub use auth::{AccessToken, CredentialManager};
pub use config::ClientConfig;
pub use error::{ApiError, AuthError, ClientError, ConfigError, RequestError, StreamError};
pub use generation::GenerationClient;
pub use models::watsonx::{GenerationRequest, Parameters};
pub use streaming::GenerationStream;

/// Router with every route and the HTTP middleware stack
pub fn build_app(state: routes::AppState) -> axum::Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .merge(routes::health_routes())
        .merge(routes::generation_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
