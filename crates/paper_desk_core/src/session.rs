//! crates/paper_desk_core/src/session.rs
//!
//! The session store: owns the bearer token and its durable copy.

use crate::ports::{PortResult, SignInWidget, TokenStorage};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// The storage key the token is persisted under.
pub const SESSION_TOKEN_KEY: &str = "sessionToken";

pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    widget: Option<Arc<dyn SignInWidget>>,
    token: String,
}

impl SessionStore {
    /// Creates the store and loads any token left by a previous run.
    ///
    /// An unreadable store is treated as signed out.
    pub fn load(storage: Arc<dyn TokenStorage>) -> Self {
        let token = match storage.get(SESSION_TOKEN_KEY) {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                warn!("Could not read the stored session token: {}", e);
                String::new()
            }
        };
        Self {
            storage,
            widget: None,
            token,
        }
    }

    pub fn with_widget(mut self, widget: Arc<dyn SignInWidget>) -> Self {
        self.widget = Some(widget);
        self
    }

    pub fn is_authed(&self) -> bool {
        !self.token.is_empty()
    }

    /// The bearer token, or an empty string when signed out.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// A label for the signed-in user. Display only, see [`unverified_display_identity`].
    pub fn display_identity(&self) -> String {
        if self.token.is_empty() {
            return String::new();
        }
        unverified_display_identity(&self.token)
    }

    /// Replaces the token in memory and in durable storage.
    pub fn store_token(&mut self, token: &str) -> PortResult<()> {
        self.storage.set(SESSION_TOKEN_KEY, token)?;
        self.token = token.to_string();
        info!("Session token stored.");
        Ok(())
    }

    /// Forgets the token everywhere and stops the widget from auto-selecting the account.
    pub fn logout(&mut self) {
        self.token.clear();
        if let Err(e) = self.storage.remove(SESSION_TOKEN_KEY) {
            warn!("Could not remove the stored session token: {}", e);
        }
        if let Some(widget) = &self.widget {
            widget.disable_auto_select();
        }
        info!("Signed out.");
    }
}

/// Reads the `sub` (or `email`) claim out of a JWT-shaped token WITHOUT checking
/// its signature or expiry. The result is for display and must never be used to
/// make an authorization decision.
///
/// Returns an empty string for anything that does not decode.
pub fn unverified_display_identity(token: &str) -> String {
    decode_claims(token)
        .and_then(|claims| {
            ["sub", "email"]
                .iter()
                .find_map(|key| claims.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_default()
}

fn decode_claims(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let normalized: String = payload
        .chars()
        .filter(|c| *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(normalized).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStorage, RecordingWidget};

    fn token_with_claims(claims: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(claims))
    }

    #[test]
    fn identity_comes_from_sub_claim() {
        let token = token_with_claims(r#"{"sub":"ada@example.com","exp":1}"#);
        assert_eq!(unverified_display_identity(&token), "ada@example.com");
    }

    #[test]
    fn identity_falls_back_to_email_claim() {
        let token = token_with_claims(r#"{"email":"grace@example.com"}"#);
        assert_eq!(unverified_display_identity(&token), "grace@example.com");
    }

    #[test]
    fn malformed_tokens_decode_to_empty_identity() {
        let tokens = vec![
            String::new(),
            "no-dots-at-all".to_string(),
            "a.%%%%.c".to_string(),
            "a.bm90IGpzb24.c".to_string(), // "not json"
            token_with_claims(r#"{"sub":42}"#),
            token_with_claims("[1,2,3]"),
        ];
        for token in &tokens {
            assert_eq!(unverified_display_identity(token), "", "token {token:?}");
        }
    }

    #[test]
    fn standard_alphabet_and_padding_are_accepted() {
        // {"sub":"a>b?"} encodes with '+' / '/' characters in the standard alphabet.
        let token = "h.eyJzdWIiOiJhPmI/In0=.s";
        assert_eq!(unverified_display_identity(token), "a>b?");
    }

    #[test]
    fn token_survives_reload_and_logout_clears_it() {
        let storage = Arc::new(MemoryStorage::default());
        let widget = Arc::new(RecordingWidget::default());

        let mut store = SessionStore::load(storage.clone()).with_widget(widget.clone());
        assert!(!store.is_authed());
        store.store_token("abc.def.ghi").unwrap();
        assert!(store.is_authed());

        let mut reloaded = SessionStore::load(storage.clone()).with_widget(widget.clone());
        assert_eq!(reloaded.token(), "abc.def.ghi");

        reloaded.logout();
        assert!(!reloaded.is_authed());
        assert_eq!(reloaded.token(), "");
        assert_eq!(storage.get(SESSION_TOKEN_KEY).unwrap(), None);
        assert_eq!(widget.disabled_count(), 1);
    }
}
