//! crates/paper_desk_core/src/router.rs
//!
//! Fragment routing with the authentication gate.

use crate::domain::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Show this panel.
    Show(Route),
    /// Rewrite the fragment to this route instead of rendering.
    Redirect(Route),
}

/// Decides what to render for `fragment`. Gated panels redirect to the landing
/// page when signed out.
pub fn resolve(fragment: &str, authed: bool) -> Navigation {
    let route = Route::from_fragment(fragment);
    if route.requires_auth() && !authed {
        Navigation::Redirect(Route::Landing)
    } else {
        Navigation::Show(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gated_routes_redirect_when_signed_out() {
        assert_eq!(resolve("#/chat", false), Navigation::Redirect(Route::Landing));
        assert_eq!(resolve("#/upload", false), Navigation::Redirect(Route::Landing));
        assert_eq!(resolve("#/landing", false), Navigation::Show(Route::Landing));
    }

    #[test]
    fn signed_in_users_reach_every_panel() {
        assert_eq!(resolve("#/chat", true), Navigation::Show(Route::Chat));
        assert_eq!(resolve("#/upload", true), Navigation::Show(Route::Upload));
        assert_eq!(resolve("", true), Navigation::Show(Route::Landing));
        assert_eq!(resolve("#/nowhere", true), Navigation::Show(Route::Landing));
    }
}
