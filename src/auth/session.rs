//! The authenticated identity passed explicitly into data-access code.
//!
//! Handlers receive a [Session] from the auth middleware and hand it to
//! [current_org_member] to resolve the acting user and their organization.
//! No data-access function reads authentication state from anywhere else,
//! which keeps the authorization check testable without HTTP plumbing.

use rusqlite::Connection;

use crate::{
    Error,
    ids::{OrganizationId, UserId},
    user::{User, get_user},
};

/// The identity established by the auth cookie for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserId,
}

/// A user resolved to a concrete organization membership.
#[derive(Debug, Clone, PartialEq)]
pub struct OrgMember {
    pub user: User,
    pub org_id: OrganizationId,
}

/// Resolve the session to the acting user and their organization.
///
/// # Errors
///
/// Returns:
/// - [Error::NotFound] if the session's user no longer exists,
/// - [Error::NoOrganization] if the user is not attached to an organization.
pub fn current_org_member(session: &Session, connection: &Connection) -> Result<OrgMember, Error> {
    let user = get_user(&session.user_id, connection)?;

    let org_id = user.org_id.clone().ok_or(Error::NoOrganization)?;

    Ok(OrgMember { user, org_id })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::PasswordHash,
        db::initialize,
        organization::test_organization,
        user::{NewUser, Role, create_user},
    };

    use super::{Session, current_org_member};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn resolves_user_and_org() {
        let conn = get_test_connection();
        let org = test_organization(&conn);
        let user = create_user(
            NewUser {
                email: "ana@obrador.mx".to_owned(),
                name: "Ana Obrador".to_owned(),
                password_hash: PasswordHash::new_unchecked("$2b$04$notarealhash"),
                role: Role::OrgOwner,
                org_id: Some(org.id.clone()),
            },
            &conn,
        )
        .unwrap();

        let member = current_org_member(
            &Session {
                user_id: user.id.clone(),
            },
            &conn,
        )
        .unwrap();

        assert_eq!(member.user, user);
        assert_eq!(member.org_id, org.id);
    }

    #[test]
    fn fails_for_unknown_user() {
        let conn = get_test_connection();

        let result = current_org_member(
            &Session {
                user_id: "ghost".to_owned(),
            },
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn fails_for_user_without_org() {
        let conn = get_test_connection();
        let user = create_user(
            NewUser {
                email: "ana@obrador.mx".to_owned(),
                name: "Ana Obrador".to_owned(),
                password_hash: PasswordHash::new_unchecked("$2b$04$notarealhash"),
                role: Role::OrgUser,
                org_id: None,
            },
            &conn,
        )
        .unwrap();

        let result = current_org_member(
            &Session {
                user_id: user.id,
            },
            &conn,
        );

        assert_eq!(result, Err(Error::NoOrganization));
    }
}
