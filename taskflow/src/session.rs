//! Session state gate.
//!
//! Every query and mutation in the client is gated on the session: while
//! identity resolution is still pending, "unknown" must never be read as
//! "logged out", and nothing may touch the network.

use parking_lot::Mutex;

/// Path of the login entry point the client redirects to.
const LOGIN_PATH: &str = "/login";

/// Resolution state of the user identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Identity not yet determined; treat as unknown, not as logged out.
    Resolving,
    /// A user identity is established.
    Authenticated,
    /// Resolution finished with no user identity.
    Anonymous,
}

#[derive(Debug)]
struct SessionInner {
    resolved: bool,
    authenticated: bool,
}

/// Shared session gate.
///
/// Starts in the resolving state. [`resolve`](Self::resolve) transitions to
/// a settled state exactly once; later calls are ignored until
/// [`reset`](Self::reset) re-enters resolution (token refresh).
#[derive(Debug)]
pub struct Session {
    inner: Mutex<SessionInner>,
}

impl Session {
    /// Creates a session in the resolving state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                resolved: false,
                authenticated: false,
            }),
        }
    }

    /// Creates a session already resolved to the given identity state.
    #[must_use]
    pub const fn resolved(authenticated: bool) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                resolved: true,
                authenticated,
            }),
        }
    }

    /// Settles the resolution outcome. First write wins.
    pub fn resolve(&self, authenticated: bool) {
        let mut inner = self.inner.lock();
        if inner.resolved {
            tracing::debug!("session already resolved, ignoring");
            return;
        }
        inner.resolved = true;
        inner.authenticated = authenticated;
        tracing::info!(authenticated, "session resolved");
    }

    /// Re-enters the resolving state (e.g. around a token refresh).
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.resolved = false;
        inner.authenticated = false;
    }

    /// Current resolution status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        let inner = self.inner.lock();
        if !inner.resolved {
            SessionStatus::Resolving
        } else if inner.authenticated {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    /// Whether resolution is still pending.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        self.status() == SessionStatus::Resolving
    }

    /// Whether a user identity is established. `false` while resolving.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Whether network activity is allowed right now.
    #[must_use]
    pub fn allows_requests(&self) -> bool {
        self.is_authenticated()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the login redirect URL carrying the current location.
///
/// The path and query string are percent-encoded into a `next` parameter
/// so that a successful login navigates back to the exact resource the
/// user was trying to reach (notably: the same invite link).
#[must_use]
pub fn login_redirect(return_to: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(return_to))
}
