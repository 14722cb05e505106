//! Credential model: the bearer secret plus the identity it authorizes.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
