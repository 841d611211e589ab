//! Users service models

pub mod user;

// Re-export for convenience
pub use user::{
    AuthResponse, LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, UpdateUser, User,
    UserResponse,
};
