pub mod jwt;
pub mod password;

pub use jwt::{Claims, IssuedToken, JwtService, TokenKind};
pub use password::{hash_password, verify_password};
