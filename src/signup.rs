//! The sign-up page: creates a user and their organization in one step,
//! or attaches the user to an inviting organization.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
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
    auth::{PasswordHash, ValidatedPassword, cookie::set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, auth_card, base, loading_spinner, password_input, text_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    invitation::take_pending_invitation,
    organization::{NewOrganization, create_organization},
    user::{NewUser, Role, User, create_user},
};

/// Validation errors rendered inline in the sign-up form.
#[derive(Default)]
struct SignupFormErrors<'a> {
    organization: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
    email: Option<&'a str>,
}

fn signup_form(form: &SignupForm, errors: &SignupFormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-target-error="this"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                (text_input("organization_name", "Organization name", "text", &form.organization_name))

                @if let Some(error_message) = errors.organization {
                    p class="text-red-500 text-base" { (error_message) }
                }

                p class="text-sm font-light text-gray-500 dark:text-gray-400"
                {
                    "Leave the organization name as-is if you were invited — you
                    will join the inviting organization automatically."
                }
            }

            (text_input("name", "Your name", "text", &form.name))

            div
            {
                (text_input("email", "Email", "email", &form.email))

                @if let Some(error_message) = errors.email {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            (password_input("password", "Password", errors.password))
            (password_input("confirm_password", "Confirm password", errors.confirm_password))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Sign up"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the sign-up page.
pub async fn get_register_page() -> Response {
    let form = signup_form(&SignupForm::default(), &SignupFormErrors::default());
    let content = auth_card("Create your organization", &form);
    base("Sign Up", &content).into_response()
}

/// The state needed for signing up a new user.
#[derive(Clone)]
pub struct SignupState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for creating users and organizations.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SignupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SignupState> for Key {
    fn from_ref(state: &SignupState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for a sign-up request.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    pub organization_name: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Handler for sign-up requests via the POST method.
///
/// A pending invitation matching the email wins over creating a new
/// organization: the user joins the inviting organization with the invited
/// role and the invitation is consumed. Otherwise the submitted
/// organization is created and the user becomes its owner.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn register_user(
    State(state): State<SignupState>,
    jar: PrivateCookieJar,
    Form(form): Form<SignupForm>,
) -> Response {
    let validated_password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            return validation_response(
                &form,
                SignupFormErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            );
        }
    };

    if form.password != form.confirm_password {
        return validation_response(
            &form,
            SignupFormErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        );
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let user = match create_account(&form, password_hash, &connection) {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => {
            return validation_response(
                &form,
                SignupFormErrors {
                    email: Some("That email address is already registered."),
                    ..Default::default()
                },
            );
        }
        Err(Error::NoOrganization) => {
            return validation_response(
                &form,
                SignupFormErrors {
                    organization: Some("Enter a name for your organization."),
                    ..Default::default()
                },
            );
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while signing up: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match set_auth_cookie(jar, &user.id, state.cookie_duration) {
        Ok(jar) => (
            jar,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}

/// Create the user, joining the inviting organization when a pending
/// invitation matches the email.
fn create_account(
    form: &SignupForm,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let (org_id, role) = match take_pending_invitation(&form.email, connection)? {
        Some(invitation) => (invitation.org_id, invitation.role),
        None => {
            if form.organization_name.trim().is_empty() {
                return Err(Error::NoOrganization);
            }

            let organization = create_organization(
                NewOrganization {
                    name: form.organization_name.trim().to_owned(),
                    email: form.email.clone(),
                },
                connection,
            )?;

            (organization.id, Role::OrgOwner)
        }
    };

    create_user(
        NewUser {
            email: form.email.clone(),
            name: form.name.clone(),
            password_hash,
            role,
            org_id: Some(org_id),
        },
        connection,
    )
}

fn validation_response(form: &SignupForm, errors: SignupFormErrors) -> Response {
    (StatusCode::BAD_REQUEST, signup_form(form, &errors)).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use sha2::{Digest, Sha512};

    use crate::{
        auth::DEFAULT_COOKIE_DURATION,
        db::initialize,
        invitation::create_invitation,
        organization::test_organization,
        user::{Role, get_user_by_email},
    };

    use super::{SignupForm, SignupState, get_register_page, register_user};

    fn get_test_state() -> SignupState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        SignupState {
            cookie_key: Key::from(&Sha512::digest("42")),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn get_jar(state: &SignupState) -> PrivateCookieJar {
        PrivateCookieJar::new(state.cookie_key.clone())
    }

    fn form() -> SignupForm {
        SignupForm {
            organization_name: "Constructora Jalisco".to_owned(),
            name: "Ana Obrador".to_owned(),
            email: "ana@obrador.mx".to_owned(),
            password: "cementmixer-47-gaviota".to_owned(),
            confirm_password: "cementmixer-47-gaviota".to_owned(),
        }
    }

    #[tokio::test]
    async fn register_page_renders() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signup_creates_owner_and_organization() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let response = register_user(State(state.clone()), jar, Form(form())).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().contains_key(HX_REDIRECT));

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email("ana@obrador.mx", &connection).unwrap();
        assert_eq!(user.role, Role::OrgOwner);
        assert!(user.org_id.is_some());
    }

    #[tokio::test]
    async fn signup_with_invitation_joins_inviting_org() {
        let state = get_test_state();
        let org_id = {
            let connection = state.db_connection.lock().unwrap();
            let org = test_organization(&connection);
            create_invitation(&org.id, "bob@builder.mx", Role::OrgUser, &connection).unwrap();
            org.id
        };

        let mut signup = form();
        signup.email = "bob@builder.mx".to_owned();
        signup.organization_name = "".to_owned();

        let jar = get_jar(&state);
        let response = register_user(State(state.clone()), jar, Form(signup)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email("bob@builder.mx", &connection).unwrap();
        assert_eq!(user.role, Role::OrgUser);
        assert_eq!(user.org_id, Some(org_id));
    }

    #[tokio::test]
    async fn signup_rejects_weak_password() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let mut signup = form();
        signup.password = "hunter2".to_owned();
        signup.confirm_password = "hunter2".to_owned();

        let response = register_user(State(state), jar, Form(signup)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_rejects_mismatched_passwords() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let mut signup = form();
        signup.confirm_password = "somethingelse-99-totally".to_owned();

        let response = register_user(State(state), jar, Form(signup)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email() {
        let state = get_test_state();

        let response = register_user(State(state.clone()), get_jar(&state), Form(form())).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = register_user(State(state.clone()), get_jar(&state), Form(form())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_requires_organization_name_without_invitation() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let mut signup = form();
        signup.organization_name = "   ".to_owned();

        let response = register_user(State(state), jar, Form(signup)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
