// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and health probes. Everything else lives under
// handlers/protected and requires a bearer access token.

pub mod auth;
pub mod health;
