//! Data structures shared by every Warden component.

pub mod credentials;
pub mod grants;
pub mod principal;
pub mod session;

pub use credentials::{BasicCredentials, DigestExpectation, DigestResponse};
pub use grants::{permission_matches, Grants, WILDCARD};
pub use principal::Principal;
pub use session::Session;
