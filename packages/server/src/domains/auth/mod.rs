//! Auth domain - token verification for the HTTP boundary
//!
//! Login and credential storage live with the identity provider; this server only
//! issues and verifies the tokens it is handed.

pub mod jwt;

pub use jwt::{Claims, JwtService};
