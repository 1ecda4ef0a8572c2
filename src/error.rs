//! Defines the app level error type and conversions to rendered HTML pages and alerts.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundPage};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided the wrong email/password combination.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing or formatting the expiry date in the
    /// auth cookie.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email used to sign up already belongs to a user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The signed-in user does not belong to any organization, so no
    /// tenant-scoped page or operation can be resolved for them.
    #[error("the signed-in user does not belong to an organization")]
    NoOrganization,

    /// A ledger entry was submitted with a zero or negative amount.
    /// The direction of money comes from the transaction kind, so amounts
    /// must always be positive.
    #[error("the amount must be greater than zero")]
    NonPositiveAmount,

    /// The party chosen for a client assignment belongs to a different
    /// organization than the project.
    #[error("the client does not belong to the project's organization")]
    ClientNotInOrganization,

    /// The party chosen for a client assignment is not a client (e.g. a
    /// vendor).
    #[error("the selected party is not a client")]
    NotAClient,

    /// The multipart form for a file upload could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a file under the `file` field.
    #[error("no file was provided")]
    MissingUploadFile,

    /// Reading or writing the media store failed.
    #[error("media store operation failed: {0}")]
    StorageError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the
    /// parameters (e.g., ID) are correct and that the resource has been
    /// created. Resources belonging to another organization are reported
    /// with this error so that their existence is not revealed.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundPage.into_response(),
            Error::NoOrganization => InternalServerError {
                description: "No Organization",
                fix: "Your account is not attached to an organization. \
                    Sign up again or ask for an invitation.",
            }
            .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::NonPositiveAmount => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid amount",
                    "The amount must be greater than zero. The transaction kind decides \
                    whether it counts as income or an expense.",
                ),
            ),
            Error::ClientNotInOrganization => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Could not assign client",
                    "The selected client belongs to a different organization.",
                ),
            ),
            Error::NotAClient => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Could not assign client",
                    "The selected party is a vendor, not a client.",
                ),
            ),
            Error::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Email already registered",
                    "A user with that email address already exists. Try logging in instead.",
                ),
            ),
            Error::MissingUploadFile => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "No file provided",
                    "Choose a file to attach before uploading.",
                ),
            ),
            Error::MultipartError(details) => (
                StatusCode::BAD_REQUEST,
                Alert::error("Could not read the upload", &details),
            ),
            Error::TooWeak(details) => (
                StatusCode::BAD_REQUEST,
                Alert::error("Password is too weak", &details),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Not found",
                    "The record could not be found. Try refreshing the page.",
                ),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                ),
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
