//! The 404 not found page.

use axum::{http::StatusCode, response::Response};

use crate::html::error_view;

/// Handler for requests that do not match any route.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Get a response containing the rendered 404 page.
pub fn get_404_not_found_response() -> Response {
    error_view(
        StatusCode::NOT_FOUND,
        "404",
        "Page Not Found",
        "Sorry, we can't find that page. You'll find lots to explore on the home page.",
    )
}
