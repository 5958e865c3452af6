pub mod auth;
pub mod rate_limit;
pub mod response;
pub mod tenant;
pub mod validate;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use rate_limit::{limiter_from_config, rate_limit_middleware, ClientRateLimiter};
pub use response::{ApiResponse, ApiResult, Deleted, PaginationMeta};
pub use tenant::{resolve_tenant, TenantContext};
pub use validate::{ValidJson, ValidPath, ValidQuery};
