pub mod env;
pub mod loader;
pub mod types;

pub use loader::{load_settings, resolve_settings};
pub use types::{DashConfig, Settings, DEFAULT_API_BASE_URL, SESSION_STORAGE_NAME};
