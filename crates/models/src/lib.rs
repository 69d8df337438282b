pub mod profile;
pub mod token;
pub mod user;

pub use profile::{Profile, ProfileInput};
pub use token::RefreshToken;
pub use user::{
    AccessTokenResponse, LoginInput, LoginResponse, RefreshInput, RegisterInput, RegisteredUser,
    User, UserView, UserWithProfile,
};
