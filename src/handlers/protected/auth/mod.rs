// handlers/protected/auth/mod.rs - Authenticated account endpoints

pub mod me; // GET /api/auth/me

pub use me::me_get;
