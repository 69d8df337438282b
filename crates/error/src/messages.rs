//! Fixed user-facing messages. Handlers and services only ever return these
//! strings to clients, so response text stays stable across internal changes.

pub const PROFILE_DATA_EMPTY: &str = "Profile data cannot be empty";
pub const PROFILE_ALREADY_EXISTS: &str = "Profile already exists";
pub const PROFILE_NOT_FOUND: &str = "Profile not found";
pub const USER_NOT_FOUND: &str = "User not found";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const REFRESH_TOKEN_MISSING: &str = "Refresh token missing";
pub const REFRESH_TOKEN_INVALID: &str = "Refresh token invalid or expired";
pub const LOGOUT_ERROR: &str = "An error occurred during logout";
pub const ACCESS_TOKEN_MISSING: &str = "Access token missing";
pub const INVALID_OR_EXPIRED_TOKEN: &str = "Invalid or expired token";
pub const USER_ALREADY_EXISTS: &str = "User already exists";
pub const GENERAL_ERROR: &str = "An error occurred";
pub const PAYLOAD_TOO_LARGE: &str = "The request body exceeds the maximum allowed size";
pub const REQUEST_TIMEOUT: &str = "The request took too long to complete";

pub const PROFILE_CREATED: &str = "Profile created successfully";
pub const PROFILE_UPDATED: &str = "Profile updated successfully";
pub const PROFILE_FETCHED: &str = "Profile fetched successfully";
pub const USER_REGISTERED: &str = "User registered successfully";
pub const USER_LOGGED_IN: &str = "User logged in successfully";
pub const USER_LOGGED_OUT: &str = "User logged out successfully";
pub const ACCESS_TOKEN_REFRESHED: &str = "Access token refreshed successfully";
pub const PROFILE_COMPLETION_UPDATED: &str = "Profile completion status updated successfully";
pub const USER_DATA_FETCHED: &str = "User data fetched successfully";
