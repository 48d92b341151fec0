pub mod access_jwt;
pub mod factory;
pub mod gate;
pub mod permission;

pub use access_jwt::TokenVerifier;
pub use factory::build_authz_gate;
pub use gate::{AuthzGate, Denial};
pub use permission::{PermissionService, UmaPermissionClient};
