//! # Request Context
//!
//! Who is making a call. Built from a bearer token by the HTTP layer, or as
//! `system()` by local CLI commands.

use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// None for anonymous and system callers
    pub user_id: Option<Uuid>,
    pub is_authenticated: bool,
    pub is_admin: bool,
}

impl RequestContext {
    pub fn authenticated(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            is_authenticated: true,
            is_admin: false,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            is_authenticated: true,
            is_admin: true,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Operator access from the local CLI; has admin rights but no user
    pub fn system() -> Self {
        Self {
            user_id: None,
            is_authenticated: true,
            is_admin: true,
        }
    }

    pub fn is_user(&self, user_id: &Uuid) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let id = Uuid::new_v4();

        let user = RequestContext::authenticated(id);
        assert!(user.is_authenticated && !user.is_admin);
        assert!(user.is_user(&id));

        let anon = RequestContext::anonymous();
        assert!(!anon.is_authenticated && anon.user_id.is_none());

        let system = RequestContext::system();
        assert!(system.is_admin && system.user_id.is_none());
        assert!(!system.is_user(&id));
    }
}
