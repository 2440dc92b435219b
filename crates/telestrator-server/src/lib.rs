//! Telestrator Server Library
//!
//! The signaling relay and the MJPEG broadcast bridge, exposed for testing
//! and embedding.

pub mod api;
pub mod error;
pub mod mjpeg;
pub mod relay;
pub mod state;

/// Routers for both listening ports, sharing one state.
pub struct App {
    pub http: axum::Router,
    pub relay: axum::Router,
    pub state: state::AppState,
}

/// Create and configure the server application
pub fn create_app(config: state::Config) -> App {
    let app_state = state::AppState::new(config);
    App {
        http: api::create_router(app_state.clone()),
        relay: api::create_relay_router(app_state.clone()),
        state: app_state,
    }
}
