pub mod affiliate;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod session;

pub use app::App;
pub use auth::{AuthService, SigninRequest, User};
pub use config::{load_settings, Settings};
pub use error::{ApiError, AuthError, ClientError};
pub use http::{ApiClient, ApiRequest};
pub use session::{MemoryStorage, Session, SessionEvent, SessionStorage, TokenStore};

