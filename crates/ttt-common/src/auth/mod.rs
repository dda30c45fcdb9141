//! Token inspection

mod token;

pub use token::{inspect_token, TokenClaims};
