pub mod api_middleware;
pub mod security;
pub mod validation;

pub use api_middleware::{AuthenticatedUser, require_auth};
pub use security::jwt::{Claims, IssuedToken, JwtService, TokenKind};
