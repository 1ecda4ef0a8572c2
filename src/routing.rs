//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    organization::{
        delete_organization_endpoint, get_settings_page, update_organization_endpoint,
    },
    party::{create_party_endpoint, get_clients_page, get_new_client_page},
    project::{
        assign_client_endpoint, create_project_endpoint, edit_project_endpoint,
        get_edit_project_page, get_new_project_page, get_project_page, get_projects_page,
        remove_client_endpoint,
    },
    signup::{get_register_page, register_user},
    transaction::{create_transaction_endpoint, upload_attachment_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::PROJECTS_VIEW, get(get_projects_page))
        .route(endpoints::NEW_PROJECT_VIEW, get(get_new_project_page))
        .route(endpoints::PROJECT_VIEW, get(get_project_page))
        .route(endpoints::EDIT_PROJECT_VIEW, get(get_edit_project_page))
        .route(endpoints::CLIENTS_VIEW, get(get_clients_page))
        .route(endpoints::NEW_CLIENT_VIEW, get(get_new_client_page))
        .route(endpoints::SETTINGS_VIEW, get(get_settings_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for
    // auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::PROJECTS_API, post(create_project_endpoint))
            .route(endpoints::PROJECT_API, put(edit_project_endpoint))
            .route(
                endpoints::PROJECT_CLIENT,
                post(assign_client_endpoint).delete(remove_client_endpoint),
            )
            .route(endpoints::PARTIES_API, post(create_party_endpoint))
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION_ATTACHMENTS,
                post(upload_attachment_endpoint),
            )
            .route(
                endpoints::ORGANIZATION_API,
                put(update_organization_endpoint).delete(delete_organization_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use tempfile::TempDir;

    use crate::{AppState, endpoints, media_store::MediaStore};

    use super::build_router;

    fn get_test_server() -> (TestServer, TempDir) {
        let media_dir = TempDir::new().unwrap();
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "nafstenoas",
            "Etc/UTC",
            MediaStore::new(media_dir.path()),
        )
        .unwrap();

        (TestServer::try_new(build_router(state)).unwrap(), media_dir)
    }

    #[tokio::test]
    async fn unauthenticated_dashboard_redirects_to_log_in() {
        let (server, _media_dir) = get_test_server();

        let response = server.get(endpoints::DASHBOARD_VIEW).await;

        response.assert_status_see_other();
        assert!(
            response
                .header("location")
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn log_in_page_is_reachable_without_auth() {
        let (server, _media_dir) = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
        server
            .get(endpoints::REGISTER_VIEW)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (server, _media_dir) = get_test_server();

        let response = server.get("/definitely/not/a/route").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn coffee_route_is_a_teapot() {
        let (server, _media_dir) = get_test_server();

        let response = server.get(endpoints::COFFEE).await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn signup_then_full_page_flow() {
        let (server, _media_dir) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("organization_name", "Constructora Jalisco"),
                ("name", "Ana Obrador"),
                ("email", "ana@obrador.mx"),
                ("password", "cementmixer-47-gaviota"),
                ("confirm_password", "cementmixer-47-gaviota"),
            ])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        let cookies = response.cookies();

        for page in [
            endpoints::DASHBOARD_VIEW,
            endpoints::PROJECTS_VIEW,
            endpoints::NEW_PROJECT_VIEW,
            endpoints::CLIENTS_VIEW,
            endpoints::NEW_CLIENT_VIEW,
            endpoints::SETTINGS_VIEW,
        ] {
            server
                .get(page)
                .add_cookies(cookies.clone())
                .await
                .assert_status_ok();
        }
    }
}
