pub mod profile;
pub mod user_account;

pub use profile::validate_profile_input;
pub use user_account::{sanitize_login, sanitize_registration};
