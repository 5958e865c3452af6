// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here extracts a TenantContext, which resolves the bearer
// principal to an active user and pins all store calls to that user's
// organization. Records of other organizations are reported as not found.

pub mod auth;
pub mod contact_history;
pub mod customers;
pub mod deals;
pub mod pipelines;
pub mod tasks;
