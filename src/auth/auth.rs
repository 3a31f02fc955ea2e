use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::{Role, has_any};
use crate::models::{Claims, TokenType};
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Which leave records a principal is permitted to see. The listing
/// service applies exactly one of these before any status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// Administrators and the long-leave authority see everything.
    All,
    /// Advisors see only leaves of students assigned to them.
    AdviseesOnly(u64),
    /// Students see only their own records.
    Own(u64),
}

impl VisibilityScope {
    /// Appends this scope's filter to a query over `leaves` aliased as
    /// `l`; returns the id to bind when the scope restricts anything.
    /// Every read of a leave record goes through this before any other
    /// filter, so out-of-scope ids look exactly like unknown ids.
    pub fn append_sql(&self, sql: &mut String) -> Option<u64> {
        match self {
            VisibilityScope::All => None,
            VisibilityScope::AdviseesOnly(advisor_id) => {
                sql.push_str(
                    " AND EXISTS (SELECT 1 FROM student_profiles sp \
                     WHERE sp.user_id = l.student_id AND sp.advisor_id = ?)",
                );
                Some(*advisor_id)
            }
            VisibilityScope::Own(user_id) => {
                sql.push_str(" AND l.student_id = ?");
                Some(*user_id)
            }
        }
    }
}

pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    /// Stamped into `approver` on workflow transitions.
    pub display_name: String,
    pub roles: Vec<Role>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        if data.claims.token_type != TokenType::Access {
            return ready(Err(ErrorUnauthorized("Not an access token")));
        }

        let mut roles = Vec::with_capacity(data.claims.roles.len());
        for id in &data.claims.roles {
            match Role::from_id(*id) {
                Some(r) => roles.push(r),
                None => return ready(Err(ErrorUnauthorized("Invalid role"))),
            }
        }

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            display_name: data.claims.display_name,
            roles,
        }))
    }
}

impl AuthUser {
    /// Allowed iff the caller holds at least one of the required roles.
    pub fn require_any(&self, required: &[Role]) -> Result<(), ApiError> {
        if has_any(&self.roles, required) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    pub fn is_student(&self) -> bool {
        self.roles.contains(&Role::Student)
    }

    /// Strongest scope the caller's roles grant.
    pub fn visibility_scope(&self) -> VisibilityScope {
        if has_any(&self.roles, &[Role::Administrator, Role::LongLeaveAuthority]) {
            VisibilityScope::All
        } else if self.roles.contains(&Role::Advisor) {
            VisibilityScope::AdviseesOnly(self.user_id)
        } else {
            VisibilityScope::Own(self.user_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: Vec<Role>) -> AuthUser {
        AuthUser {
            user_id: 42,
            username: "20240101".into(),
            display_name: "Alice Zhang".into(),
            roles,
        }
    }

    #[test]
    fn require_any_allows_on_intersection() {
        let advisor = user(vec![Role::Advisor]);
        assert!(advisor
            .require_any(&[Role::Advisor, Role::Administrator])
            .is_ok());
        assert!(matches!(
            advisor.require_any(&[Role::LongLeaveAuthority]),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn scope_per_role() {
        assert_eq!(
            user(vec![Role::Administrator]).visibility_scope(),
            VisibilityScope::All
        );
        assert_eq!(
            user(vec![Role::LongLeaveAuthority]).visibility_scope(),
            VisibilityScope::All
        );
        assert_eq!(
            user(vec![Role::Advisor]).visibility_scope(),
            VisibilityScope::AdviseesOnly(42)
        );
        assert_eq!(
            user(vec![Role::Student]).visibility_scope(),
            VisibilityScope::Own(42)
        );
    }

    #[test]
    fn all_scope_adds_no_filter() {
        let mut sql = String::from("SELECT status FROM leaves l WHERE l.id = ?");
        let arg = user(vec![Role::Administrator])
            .visibility_scope()
            .append_sql(&mut sql);
        assert_eq!(arg, None);
        assert_eq!(sql, "SELECT status FROM leaves l WHERE l.id = ?");
    }

    #[test]
    fn advisor_scope_restricts_reads_to_advisees() {
        // Workflow transitions read the status through the same scope,
        // so an advisor acting on another advisor's advisee sees no row.
        let mut sql = String::from("SELECT status FROM leaves l WHERE l.id = ?");
        let arg = user(vec![Role::Advisor])
            .visibility_scope()
            .append_sql(&mut sql);
        assert_eq!(arg, Some(42));
        assert!(sql.contains("sp.advisor_id = ?"));
        assert!(sql.contains("sp.user_id = l.student_id"));
    }

    #[test]
    fn own_scope_restricts_reads_to_the_caller() {
        let mut sql = String::from("SELECT COUNT(*) FROM leaves l WHERE 1=1");
        let arg = user(vec![Role::Student])
            .visibility_scope()
            .append_sql(&mut sql);
        assert_eq!(arg, Some(42));
        assert!(sql.ends_with(" AND l.student_id = ?"));
    }

    #[test]
    fn strongest_scope_wins_for_multi_role_users() {
        assert_eq!(
            user(vec![Role::Advisor, Role::Administrator]).visibility_scope(),
            VisibilityScope::All
        );
        assert_eq!(
            user(vec![Role::Student, Role::Advisor]).visibility_scope(),
            VisibilityScope::AdviseesOnly(42)
        );
    }
}
