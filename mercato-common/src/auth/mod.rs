pub mod credential;

pub use credential::{Argon2Scheme, CredentialError, CredentialScheme};
