/// Values bound to a single API request.
///
/// Built from the validated bearer token before the handler runs and handed
/// to every service call that needs to know who is acting. Dropped with the
/// request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    account: Option<BoundAccount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BoundAccount {
    id: i32,
    /// Username at the time the token was issued; audit only.
    username: String,
}

/// Recorded in `created_by` / `updated_by` when no user is bound.
pub const SYSTEM_USER: &str = "system";

impl RequestContext {
    /// Context of an authenticated request.
    pub fn for_account(id: i32, username: impl Into<String>) -> Self {
        let username = username.into();
        tracing::debug!(account_id = id, username = %username, "request context bound");
        Self {
            account: Some(BoundAccount { id, username }),
        }
    }

    /// Context with no authenticated user (startup seeding, CLI).
    pub fn system() -> Self {
        Self::default()
    }

    pub fn account_id(&self) -> Option<i32> {
        self.account.as_ref().map(|a| a.id)
    }

    pub fn username(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.username.as_str())
    }

    /// Name written to audit columns.
    pub fn actor(&self) -> &str {
        self.username().unwrap_or(SYSTEM_USER)
    }

    /// Whether the bound account is `id`. Usernames can change, ids cannot.
    pub fn is_account(&self, id: i32) -> bool {
        self.account_id() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_context_has_no_user() {
        let ctx = RequestContext::system();
        assert_eq!(ctx.username(), None);
        assert_eq!(ctx.account_id(), None);
        assert_eq!(ctx.actor(), SYSTEM_USER);
        assert!(!ctx.is_account(1));
    }

    #[test]
    fn test_account_context() {
        let ctx = RequestContext::for_account(1, "qbAdmin");
        assert_eq!(ctx.username(), Some("qbAdmin"));
        assert_eq!(ctx.account_id(), Some(1));
        assert_eq!(ctx.actor(), "qbAdmin");
        assert!(ctx.is_account(1));
        assert!(!ctx.is_account(2));
    }
}
