//! The 404 page and the fallback route handler that serves it.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// The 404 page, returned for unknown routes and missing resources.
pub struct NotFoundPage;

impl IntoResponse for NotFoundPage {
    fn into_response(self) -> Response {
        let page = error_view(
            "Not Found",
            "404",
            "Sorry, we couldn't find that.",
            "Check the address, or head back to the dashboard.",
        );

        (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
    }
}

/// Fallback route handler.
pub async fn get_404_not_found() -> Response {
    NotFoundPage.into_response()
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode};

    use super::get_404_not_found;

    #[tokio::test]
    async fn returns_not_found_status_and_page() {
        let response = get_404_not_found().await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("404"));
    }
}
