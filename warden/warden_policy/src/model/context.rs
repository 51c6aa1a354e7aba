//! Request context.
//!
//! The transport layer extracts tokens and credentials from wherever they
//! travel (headers, cookies, query parameters) and hands them to the guard in
//! a [`RequestContext`].

use std::collections::HashMap;

use warden_core::id::{AccountType, Token};
use warden_core::types::{BasicCredentials, DigestResponse};

/// What an inbound request carries.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// One session token per account type.
    tokens: HashMap<AccountType, Token>,

    /// Basic credentials, if the request carried any.
    basic: Option<BasicCredentials>,

    /// Digest response, if the request carried one.
    digest: Option<DigestResponse>,
}

impl RequestContext {
    /// A context with no token and no credentials.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach a token for the default account type.
    pub fn with_token(self, token: impl Into<Token>) -> Self {
        self.with_account_token(AccountType::default(), token)
    }

    /// Attach a token for an account type, replacing any previous one.
    pub fn with_account_token(mut self, account: impl Into<AccountType>, token: impl Into<Token>) -> Self {
        self.tokens.insert(account.into(), token.into());
        self
    }

    /// Attach Basic credentials.
    pub fn with_basic(mut self, credentials: BasicCredentials) -> Self {
        self.basic = Some(credentials);
        self
    }

    /// Attach a Digest response.
    pub fn with_digest(mut self, response: DigestResponse) -> Self {
        self.digest = Some(response);
        self
    }

    /// Get the token carried for an account type.
    pub fn token_for(&self, account: &AccountType) -> Option<&Token> {
        self.tokens.get(account)
    }

    /// Get the Basic credentials.
    pub fn basic(&self) -> Option<&BasicCredentials> {
        self.basic.as_ref()
    }

    /// Get the Digest response.
    pub fn digest(&self) -> Option<&DigestResponse> {
        self.digest.as_ref()
    }

    /// Check if the request carries no token.
    pub fn is_anonymous(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_per_account_type() {
        let ctx = RequestContext::anonymous()
            .with_token("t-login")
            .with_account_token("staff", "t-staff");

        assert!(!ctx.is_anonymous());
        assert_eq!(ctx.token_for(&AccountType::default()), Some(&Token::new("t-login")));
        assert_eq!(ctx.token_for(&AccountType::new("staff")), Some(&Token::new("t-staff")));
        assert_eq!(ctx.token_for(&AccountType::new("customer")), None);
    }

    #[test]
    fn test_anonymous() {
        let ctx = RequestContext::anonymous().with_basic(BasicCredentials::new("sa", "pw"));
        assert!(ctx.is_anonymous());
        assert_eq!(ctx.basic().map(|c| c.username.as_str()), Some("sa"));
        assert!(ctx.digest().is_none());
    }
}
