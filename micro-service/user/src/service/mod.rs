pub mod auth;
pub mod profile;

pub use auth::{AuthService, AuthServiceTrait};
pub use profile::{ProfileService, ProfileServiceTrait};
