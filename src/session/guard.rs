use crate::auth::types::UserType;

use super::Session;

/// Outcome of gating a protected surface on the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Hydration has not finished; render a neutral/loading state.
    Pending,
    SignInRequired,
    /// Signed in, but with a role that may not use this surface.
    Forbidden,
    Granted,
}

/// Never answers `SignInRequired` before hydration: an unhydrated store
/// looks signed out even when a session is persisted.
pub fn check_access(hydrated: bool, session: &Session, allowed: &[UserType]) -> RouteAccess {
    if !hydrated {
        return RouteAccess::Pending;
    }
    let user = match session.user.as_ref() {
        Some(user) if session.is_authenticated => user,
        _ => return RouteAccess::SignInRequired,
    };
    if allowed.contains(&user.user_type) {
        RouteAccess::Granted
    } else {
        RouteAccess::Forbidden
    }
}
