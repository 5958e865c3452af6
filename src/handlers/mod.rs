// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth): token acquisition and health probes.
// Protected (bearer access token): everything scoped to an organization.

pub mod protected;
pub mod public;
