//! Public entry point

use axum::Json;
use serde::Serialize;

pub const WELCOME_MESSAGE: &str = "Welcome to Musify for Great entertainment";

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: String,
}

/// GET /
///
/// No authentication, ignores headers and body.
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}
