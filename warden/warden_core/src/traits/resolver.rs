//! Grant resolver interface.
//!
//! The resolver is the one component an integrator must supply: given a
//! principal, it returns the roles and permission codes that principal holds
//! right now. Warden treats every call as potentially expensive (a database
//! or network lookup) and never caches the answer across evaluations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::ResolverError;
use crate::id::PrincipalKey;
use crate::types::Grants;

/// Looks up the current grants of a principal.
///
/// # Examples
///
/// ```
/// use warden_core::id::PrincipalKey;
/// use warden_core::traits::{GrantResolver, StaticGrantResolver};
/// use warden_core::types::Grants;
///
/// let resolver = StaticGrantResolver::new();
/// let key = PrincipalKey::with_default_account("U1");
/// resolver.insert(key.clone(), Grants::new(["admin"], ["user.add"]));
///
/// let grants = resolver.resolve(&key).unwrap();
/// assert!(grants.has_role("admin"));
/// ```
pub trait GrantResolver: Send + Sync {
    /// Resolve the grants of a principal.
    ///
    /// # Arguments
    ///
    /// * `principal` - The key of the principal to resolve.
    ///
    /// # Returns
    ///
    /// * `Ok(Grants)` - The principal's current roles and permissions.
    /// * `Err(ResolverError)` - If the lookup failed.
    fn resolve(&self, principal: &PrincipalKey) -> Result<Grants, ResolverError>;
}

impl<T: GrantResolver + ?Sized> GrantResolver for Arc<T> {
    fn resolve(&self, principal: &PrincipalKey) -> Result<Grants, ResolverError> {
        (**self).resolve(principal)
    }
}

impl<T: GrantResolver + ?Sized> GrantResolver for Box<T> {
    fn resolve(&self, principal: &PrincipalKey) -> Result<Grants, ResolverError> {
        (**self).resolve(principal)
    }
}

/// An in-memory resolver backed by a fixed table.
///
/// Principals missing from the table resolve to empty grants unless the
/// resolver was built with [`StaticGrantResolver::strict`].
#[derive(Debug, Default)]
pub struct StaticGrantResolver {
    grants: RwLock<HashMap<PrincipalKey, Grants>>,
    strict: bool,
}

impl StaticGrantResolver {
    /// Create an empty, lenient resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty resolver that fails for unknown principals.
    pub fn strict() -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
            strict: true,
        }
    }

    /// Set the grants of a principal, replacing any previous entry.
    pub fn insert(&self, principal: PrincipalKey, grants: Grants) {
        self.grants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(principal, grants);
    }

    /// Remove a principal from the table.
    pub fn remove(&self, principal: &PrincipalKey) -> Option<Grants> {
        self.grants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(principal)
    }

    /// Number of principals in the table.
    pub fn len(&self) -> usize {
        self.grants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GrantResolver for StaticGrantResolver {
    fn resolve(&self, principal: &PrincipalKey) -> Result<Grants, ResolverError> {
        let table = self.grants.read().unwrap_or_else(PoisonError::into_inner);
        match table.get(principal) {
            Some(grants) => Ok(grants.clone()),
            None if self.strict => Err(ResolverError::UnknownPrincipal(principal.to_string())),
            None => Ok(Grants::none()),
        }
    }
}

/// Adapts a closure into a [`GrantResolver`].
pub struct FnResolver<F>(F);

impl<F> FnResolver<F>
where
    F: Fn(&PrincipalKey) -> Result<Grants, ResolverError> + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(resolve: F) -> Self {
        Self(resolve)
    }
}

impl<F> GrantResolver for FnResolver<F>
where
    F: Fn(&PrincipalKey) -> Result<Grants, ResolverError> + Send + Sync,
{
    fn resolve(&self, principal: &PrincipalKey) -> Result<Grants, ResolverError> {
        (self.0)(principal)
    }
}
