//! Caller identity and the guards every privileged operation goes through.

pub mod password;
pub mod reset;
pub mod session;

use crate::error::{AppError, AppResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Identity {
    Anonymous,
    #[serde(rename_all = "camelCase")]
    Admin {
        user_id: i64,
        username: String,
        role: Role,
    },
    #[serde(rename_all = "camelCase")]
    Student { student_id: i64 },
}

/// Per-request state handed to every handler instead of ambient session
/// lookups.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Identity,
    pub session: Option<String>,
}

impl RequestContext {
    pub fn new(identity: Identity, session: Option<String>) -> Self {
        Self { identity, session }
    }

    #[cfg(test)]
    pub fn anonymous() -> Self {
        Self::new(Identity::Anonymous, None)
    }
}

/// Any administrator, whatever the role.
pub fn require_admin(ctx: &RequestContext) -> AppResult<Role> {
    match &ctx.identity {
        Identity::Admin { role, .. } => Ok(*role),
        _ => Err(AppError::Unauthorized("please login as admin".to_string())),
    }
}

/// An administrator holding exactly `role`; `admin` also satisfies any
/// narrower requirement.
pub fn require_role(ctx: &RequestContext, role: Role) -> AppResult<()> {
    let actual = require_admin(ctx)?;
    if actual == role || actual == Role::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("insufficient privileges".to_string()))
    }
}

/// The logged-in student. When `requested` names a different student the
/// call is refused.
pub fn require_student(ctx: &RequestContext, requested: Option<i64>) -> AppResult<i64> {
    let Identity::Student { student_id } = ctx.identity else {
        return Err(AppError::Unauthorized("please login first".to_string()));
    };
    match requested {
        Some(id) if id != student_id => Err(AppError::Forbidden(
            "students may only view their own results".to_string(),
        )),
        _ => Ok(student_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(role: Role) -> RequestContext {
        RequestContext::new(
            Identity::Admin {
                user_id: 1,
                username: "someone".to_string(),
                role,
            },
            None,
        )
    }

    fn student(id: i64) -> RequestContext {
        RequestContext::new(Identity::Student { student_id: id }, None)
    }

    #[test]
    fn anonymous_is_unauthorized_everywhere() {
        let ctx = RequestContext::anonymous();
        assert!(matches!(require_admin(&ctx), Err(AppError::Unauthorized(_))));
        assert!(matches!(
            require_role(&ctx, Role::Admin),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            require_student(&ctx, None),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn staff_passes_admin_gate_but_not_user_management() {
        let ctx = admin(Role::Staff);
        assert_eq!(require_admin(&ctx).expect("admin gate"), Role::Staff);
        assert!(require_role(&ctx, Role::Staff).is_ok());
        assert!(matches!(
            require_role(&ctx, Role::Admin),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_role_passes_everything_administrative() {
        let ctx = admin(Role::Admin);
        assert!(require_role(&ctx, Role::Admin).is_ok());
        assert!(require_role(&ctx, Role::Staff).is_ok());
        assert!(matches!(
            require_student(&ctx, None),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn students_cannot_read_each_other() {
        let ctx = student(5);
        assert_eq!(require_student(&ctx, None).expect("own"), 5);
        assert_eq!(require_student(&ctx, Some(5)).expect("own"), 5);
        assert!(matches!(
            require_student(&ctx, Some(6)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(require_admin(&ctx), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" staff "), Some(Role::Staff));
        assert_eq!(Role::parse("office"), None);
    }
}
