//! Role gating for every operation that acts on behalf of a user.
//!
//! Authentication itself happens elsewhere; by the time a request reaches this crate, the caller
//! either has a resolved [`User`] or nothing at all.

use crate::error::{Error, Result};
use crate::models::{Role, User};

/// Checks that the request carries an identity with the `required` role.
///
/// A missing identity and a wrong role fail the same way, so a denied caller learns nothing about
/// the resource it asked for.
pub fn authorize(identity: Option<&User>, required: Role) -> Result<&User> {
    match identity {
        Some(user) if user.role == required => Ok(user),
        Some(user) => {
            tracing::warn!(username = %user.username, role = %user.role, %required, "access denied");
            Err(Error::AccessDenied)
        }
        None => {
            tracing::warn!(%required, "access denied to anonymous request");
            Err(Error::AccessDenied)
        }
    }
}

/// Where a signed-in user lands by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Home {
    AdminOverview,
    TeacherOverview,
    StudentDashboard,
}

impl Home {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Home::AdminOverview,
            Role::Teacher => Home::TeacherOverview,
            Role::Student => Home::StudentDashboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(role: Role) -> User {
        User {
            id: 1,
            username: "someone".into(),
            email: "someone@college.edu".into(),
            first_name: "Some".into(),
            last_name: "One".into(),
            role,
            phone: None,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn matching_role_passes() {
        let teacher = user(Role::Teacher);
        assert_eq!(authorize(Some(&teacher), Role::Teacher).unwrap().id, 1);
    }

    #[test]
    fn wrong_role_and_anonymous_are_denied_alike() {
        let student = user(Role::Student);
        for required in [Role::Admin, Role::Teacher] {
            assert!(matches!(
                authorize(Some(&student), required),
                Err(Error::AccessDenied)
            ));
            assert!(matches!(authorize(None, required), Err(Error::AccessDenied)));
        }
        assert!(matches!(
            authorize(None, Role::Student),
            Err(Error::AccessDenied)
        ));
    }

    #[test]
    fn each_role_has_a_home() {
        assert_eq!(Home::for_role(Role::Admin), Home::AdminOverview);
        assert_eq!(Home::for_role(Role::Teacher), Home::TeacherOverview);
        assert_eq!(Home::for_role(Role::Student), Home::StudentDashboard);
    }
}
