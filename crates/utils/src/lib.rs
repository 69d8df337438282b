pub mod context;

pub use context::build_profile_context;
