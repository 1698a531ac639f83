pub mod profile;
pub mod service;
pub mod types;

pub use profile::ProfileService;
pub use service::AuthService;
pub use types::{AuthResponse, SigninRequest, UpdateProfileRequest, User, UserStatus, UserType};
