//! Caller identity and extraction helpers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// The identity of the caller of a single in-flight operation.
///
/// Built fresh for every request by the auth middleware and stored in the
/// request extensions. Access evaluation only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentityContext {
    caller_id: Option<UserId>,
    is_admin: bool,
}

impl IdentityContext {
    /// An unauthenticated caller.
    pub const fn anonymous() -> Self {
        Self {
            caller_id: None,
            is_admin: false,
        }
    }

    /// An authenticated, non-admin caller.
    pub const fn user(id: UserId) -> Self {
        Self {
            caller_id: Some(id),
            is_admin: false,
        }
    }

    /// An authenticated caller holding the admin role.
    pub const fn admin(id: UserId) -> Self {
        Self {
            caller_id: Some(id),
            is_admin: true,
        }
    }

    /// The caller's user id, `None` when unauthenticated.
    pub fn caller_id(&self) -> Option<UserId> {
        self.caller_id
    }

    /// Whether the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Whether a caller id is present.
    pub fn is_authenticated(&self) -> bool {
        self.caller_id.is_some()
    }
}

impl fmt::Display for IdentityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.caller_id, self.is_admin) {
            (None, _) => write!(f, "anonymous"),
            (Some(id), true) => write!(f, "admin:{id}"),
            (Some(id), false) => write!(f, "user:{id}"),
        }
    }
}

/// Extract the caller's [`IdentityContext`] from HTTP request `Parts`.
///
/// Returns [`IdentityContext::anonymous`] when the auth middleware did not
/// attach one.
pub fn identity_from_parts(parts: &http::request::Parts) -> IdentityContext {
    parts
        .extensions
        .get::<IdentityContext>()
        .copied()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_with(identity: IdentityContext) -> http::request::Parts {
        let (mut parts, _body) = http::Request::new(()).into_parts();
        parts.extensions.insert(identity);
        parts
    }

    #[test]
    fn test_anonymous_is_not_authenticated() {
        let anon = IdentityContext::anonymous();
        assert!(!anon.is_authenticated());
        assert!(!anon.is_admin());
        assert_eq!(anon.caller_id(), None);
        assert_eq!(anon, IdentityContext::default());
    }

    #[test]
    fn test_user_and_admin_constructors() {
        let user = IdentityContext::user(UserId::new(5));
        assert_eq!(user.caller_id(), Some(UserId::new(5)));
        assert!(!user.is_admin());

        let admin = IdentityContext::admin(UserId::new(1));
        assert!(admin.is_authenticated());
        assert!(admin.is_admin());
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(IdentityContext::anonymous().to_string(), "anonymous");
        assert_eq!(IdentityContext::user(UserId::new(5)).to_string(), "user:5");
        assert_eq!(IdentityContext::admin(UserId::new(1)).to_string(), "admin:1");
    }

    #[test]
    fn test_identity_from_parts_present() {
        let parts = parts_with(IdentityContext::user(UserId::new(42)));
        assert_eq!(
            identity_from_parts(&parts).caller_id(),
            Some(UserId::new(42))
        );
    }

    #[test]
    fn test_identity_from_parts_absent_is_anonymous() {
        let (parts, _body) = http::Request::new(()).into_parts();
        assert_eq!(identity_from_parts(&parts), IdentityContext::anonymous());
    }

    #[test]
    fn test_user_id_parse_and_serde() {
        let id: UserId = "17".parse().unwrap();
        assert_eq!(id.get(), 17);
        assert!("abc".parse::<UserId>().is_err());

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "17");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
