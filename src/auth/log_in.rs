//! The log-in page and the endpoint handling log-in requests.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{cookie::set_auth_cookie, password::PasswordHash},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, auth_card, base, loading_spinner, password_input, text_input},
    internal_server_error::get_internal_server_error_redirect,
    user::get_user_by_email,
};

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

fn log_in_form(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-target-error="this"
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (text_input("email", "Email", "email", email))
            (password_input("password", "Password", error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "New to BuildBoard? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Create an organization"
                }
            }
        }
    }
}

/// The query string accepted by the log-in page.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

fn parse_redirect_url(raw_url: Option<&str>) -> Option<String> {
    match raw_url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") => Some(url.to_owned()),
        Some(url) => {
            tracing::warn!("Ignoring invalid redirect URL: {url}");
            None
        }
        None => None,
    }
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref());
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = auth_card("Log in to your account", &log_in_form);
    base("Log In", &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for a log-in request.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On success the auth cookie is set and the client is redirected to the
/// dashboard (or the page it originally asked for). Otherwise the form is
/// re-rendered with an error message.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInForm>,
) -> Response {
    let redirect_url = parse_redirect_url(form.redirect_url.as_deref());
    let redirect_url = redirect_url.as_deref();

    let user = match get_user_by_email(
        &form.email,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    ) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return invalid_credentials_response(&form.email, redirect_url);
        }
        Err(error) => {
            tracing::error!("An error occurred while looking up a user: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match verify_password(&user.password_hash, &form.password) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials_response(&form.email, redirect_url),
        Err(error) => {
            tracing::error!("An error occurred while verifying a password: {error}");
            return get_internal_server_error_redirect();
        }
    }

    let cookie_duration = if form.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    match set_auth_cookie(jar, &user.id, cookie_duration) {
        Ok(jar) => (
            jar,
            HxRedirect(redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW).to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}

fn verify_password(hash: &PasswordHash, raw_password: &str) -> Result<bool, bcrypt::BcryptError> {
    hash.verify(raw_password)
}

fn invalid_credentials_response(email: &str, redirect_url: Option<&str>) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        log_in_form(email, Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url),
    )
        .into_response()
}
