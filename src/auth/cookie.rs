//! Defines functions for handling user authentication with cookies.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{
    Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{Error, ids::UserId};

pub(crate) const COOKIE_USER_ID: &str = "user_id";
pub(crate) const COOKIE_EXPIRY: &str = "expiry";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
);

/// Add an auth cookie to the cookie jar, indicating that a user is logged in
/// and authenticated.
///
/// Sets the initial expiry of the cookie to `duration` from the current time.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns an [Error::InvalidDateFormat] if the expiry time cannot be formatted.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: &UserId,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry = OffsetDateTime::now_utc() + duration;
    let expiry_string = expiry
        .format(DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), expiry.to_string()))?;

    Ok(jar
        .add(
            Cookie::build((COOKIE_USER_ID, user_id.clone()))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        )
        .add(
            Cookie::build((COOKIE_EXPIRY, expiry_string))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        ))
}

/// Set the auth cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_USER_ID, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
    .add(
        Cookie::build((COOKIE_EXPIRY, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read the signed-in user's id from the cookie jar.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if either auth cookie is absent,
/// - [Error::InvalidDateFormat] if the stored expiry cannot be parsed,
/// - [Error::InvalidCredentials] if the session has expired.
pub(crate) fn get_user_id_from_cookies(jar: &PrivateCookieJar) -> Result<UserId, Error> {
    let user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(Error::CookieMissing)?;
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;

    let expiry = extract_date_time(&expiry_cookie)?;

    if expiry < OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    Ok(user_id_cookie.value().to_owned())
}

/// Set the expiry of the auth cookie in `jar` to the latest of UTC now
/// plus `duration` and the cookie's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;
    let current_expiry = extract_date_time(&expiry_cookie)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or(Error::CookieMissing)?;

    let expiry = max(current_expiry, new_expiry);

    set_auth_cookie_expiry(jar, expiry)
}

/// Sets the expires field of the auth cookie and the expires field and
/// value of the expiry cookie in `jar` to `expiry`.
fn set_auth_cookie_expiry(
    jar: PrivateCookieJar,
    expiry: OffsetDateTime,
) -> Result<PrivateCookieJar, Error> {
    let expiry_string = expiry
        .format(DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), expiry.to_string()))?;

    let mut user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(Error::CookieMissing)?;
    user_id_cookie.set_expires(expiry);

    let mut expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;
    expiry_cookie.set_expires(expiry);
    expiry_cookie.set_value(expiry_string);

    Ok(jar.add(user_id_cookie).add(expiry_cookie))
}

fn extract_date_time(cookie: &Cookie) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(cookie.value(), DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), cookie.value().to_owned()))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::Error;

    use super::{
        COOKIE_EXPIRY, COOKIE_USER_ID, DEFAULT_COOKIE_DURATION,
        extend_auth_cookie_duration_if_needed, get_user_id_from_cookies, invalidate_auth_cookie,
        set_auth_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        let key = Key::from(&Sha512::digest("42"));
        PrivateCookieJar::new(key)
    }

    #[test]
    fn set_then_get_user_id() {
        let jar = set_auth_cookie(
            get_jar(),
            &"user-123".to_string(),
            DEFAULT_COOKIE_DURATION,
        )
        .unwrap();

        let user_id = get_user_id_from_cookies(&jar).unwrap();

        assert_eq!(user_id, "user-123");
    }

    #[test]
    fn get_fails_with_empty_jar() {
        let result = get_user_id_from_cookies(&get_jar());

        assert_eq!(result, Err(Error::CookieMissing));
    }

    #[test]
    fn get_fails_when_expired() {
        let jar = set_auth_cookie(
            get_jar(),
            &"user-123".to_string(),
            Duration::seconds(-10),
        )
        .unwrap();

        let result = get_user_id_from_cookies(&jar);

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[test]
    fn invalidate_expires_cookies() {
        let jar = set_auth_cookie(get_jar(), &"user-123".to_string(), DEFAULT_COOKIE_DURATION)
            .unwrap();

        let jar = invalidate_auth_cookie(jar);

        for name in [COOKIE_USER_ID, COOKIE_EXPIRY] {
            let cookie = jar.get(name).unwrap();
            assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        }
    }

    #[test]
    fn extend_pushes_expiry_forward() {
        let jar = set_auth_cookie(get_jar(), &"user-123".to_string(), Duration::seconds(5))
            .unwrap();
        let before = jar
            .get(COOKIE_USER_ID)
            .unwrap()
            .expires_datetime()
            .unwrap();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(30)).unwrap();

        let after = jar
            .get(COOKIE_USER_ID)
            .unwrap()
            .expires_datetime()
            .unwrap();
        assert!(after > before);
    }

    #[test]
    fn extend_never_shortens_expiry() {
        let jar = set_auth_cookie(get_jar(), &"user-123".to_string(), Duration::days(7)).unwrap();
        let before = jar
            .get(COOKIE_USER_ID)
            .unwrap()
            .expires_datetime()
            .unwrap();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(5)).unwrap();

        let after = jar
            .get(COOKIE_USER_ID)
            .unwrap()
            .expires_datetime()
            .unwrap();
        assert!((after - before).abs() < Duration::seconds(1));
    }
}
