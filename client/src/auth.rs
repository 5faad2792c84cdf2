//! Current session token, shared between the session and the gateway

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared handle on the current session token
///
/// The gateway reads it when each request is built, never at construction,
/// so a logout takes effect for every request issued afterwards. Requests
/// already sent keep the token they were built with.
///
/// ```
/// use larder_client::AuthToken;
///
/// let token = AuthToken::new();
/// let reader = token.clone();
/// token.set(Some("abc".to_string()));
/// assert_eq!(reader.current().as_deref(), Some("abc"));
/// ```
#[derive(Clone)]
pub struct AuthToken {
    sender: Arc<watch::Sender<Option<String>>>,
}

impl AuthToken {
    /// A handle with no token (logged out)
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// The token right now
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.sender.borrow().clone()
    }

    /// Whether a token is held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Replace the token
    pub fn set(&self, token: Option<String>) {
        self.sender.send_replace(token);
    }
}

impl Default for AuthToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_logout() {
        let token = AuthToken::new();
        let gateway_view = token.clone();

        token.set(Some("t1".to_string()));
        assert!(gateway_view.is_authenticated());

        token.set(None);
        assert_eq!(gateway_view.current(), None);
    }

    #[test]
    fn debug_never_prints_token() {
        let token = AuthToken::new();
        token.set(Some("secret-token".to_string()));
        assert!(!format!("{token:?}").contains("secret-token"));
    }
}
