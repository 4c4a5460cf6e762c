//! Authentication types: JWT claims and the caller identity.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
///
/// Tokens are minted by an external identity issuer; this service only
/// validates them and derives a [`Caller`] from the claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Whether the user holds the admin role.
    pub admin: bool,
    /// Cash account ids the user is allowed to see expenses for.
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        is_admin: bool,
        accounts: Vec<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            admin: is_admin,
            accounts,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Derives the caller identity consumed by the core.
    #[must_use]
    pub fn to_caller(&self) -> Caller {
        Caller {
            user_id: self.sub,
            is_admin: self.admin,
            allowed_cash_accounts: self.accounts.iter().cloned().collect(),
        }
    }
}

/// Identity of the caller issuing an operation.
///
/// This is the only authorization input the lifecycle engine and the
/// visibility filter consume.
#[derive(Debug, Clone)]
pub struct Caller {
    /// The user's id.
    pub user_id: Uuid,
    /// Whether the user holds the admin role.
    pub is_admin: bool,
    /// Paid-through account ids the user may see expenses for.
    pub allowed_cash_accounts: HashSet<String>,
}

impl Caller {
    /// Creates an admin caller.
    #[must_use]
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
            allowed_cash_accounts: HashSet::new(),
        }
    }

    /// Creates a non-admin caller with an account allow-list.
    #[must_use]
    pub fn user<I, S>(user_id: Uuid, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id,
            is_admin: false,
            allowed_cash_accounts: accounts.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_to_caller() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(
            user_id,
            false,
            vec!["P1".to_string(), "P2".to_string()],
            Utc::now() + Duration::minutes(15),
        );

        let caller = claims.to_caller();
        assert_eq!(caller.user_id, user_id);
        assert!(!caller.is_admin);
        assert!(caller.allowed_cash_accounts.contains("P1"));
        assert!(caller.allowed_cash_accounts.contains("P2"));
    }

    #[test]
    fn test_admin_caller() {
        let caller = Caller::admin(Uuid::new_v4());
        assert!(caller.is_admin);
        assert!(caller.allowed_cash_accounts.is_empty());
    }

    #[test]
    fn test_user_caller_accounts() {
        let caller = Caller::user(Uuid::new_v4(), ["P1"]);
        assert!(!caller.is_admin);
        assert!(caller.allowed_cash_accounts.contains("P1"));
        assert!(!caller.allowed_cash_accounts.contains("P2"));
    }

    #[test]
    fn test_claims_accounts_default_empty() {
        let json = format!(
            r#"{{"sub":"{}","admin":true,"iat":0,"exp":0}}"#,
            Uuid::new_v4()
        );
        let claims: Claims = serde_json::from_str(&json).unwrap();
        assert!(claims.accounts.is_empty());
    }
}
