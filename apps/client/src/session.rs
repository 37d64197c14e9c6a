//! In-memory session: access token, profile and credit balance.
//!
//! Every change is broadcast as a [`SessionEvent`] so views can re-render
//! without polling.

use std::sync::RwLock;

use resume_domain::account::{TokenResponse, UserProfile};
use tokio::sync::broadcast;

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    pub profile: Option<Profile>,
    pub credits: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(Profile),
    ProfileChanged(Profile),
    CreditsChanged(i64),
    LoggedOut { redirect_to: String },
}

pub struct SessionStore {
    inner: RwLock<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            inner: RwLock::new(Session::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> Session {
        self.read(|s| s.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.read(|s| s.token.clone())
    }

    pub fn credits(&self) -> Option<i64> {
        self.read(|s| s.credits)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|s| s.token.is_some())
    }

    pub fn is_admin(&self) -> bool {
        self.read(|s| s.profile.as_ref().is_some_and(|p| p.is_admin))
    }

    /// Stores the outcome of a login or refresh.
    pub fn establish(&self, token: &TokenResponse) {
        let profile = Profile {
            email: token.email.clone(),
            first_name: token.first_name.clone(),
            last_name: token.last_name.clone(),
            is_admin: token.is_admin,
        };
        self.write(|s| {
            s.token = Some(token.access_token.clone());
            s.profile = Some(profile.clone());
            s.credits = Some(token.credits);
        });
        self.emit(SessionEvent::LoggedIn(profile));
    }

    /// Applies a fresh `/me` (or email-change) profile.
    pub fn apply_profile(&self, user: &UserProfile) {
        let profile = Profile {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
        };
        self.write(|s| s.profile = Some(profile.clone()));
        self.emit(SessionEvent::ProfileChanged(profile));
        self.set_credits(user.credits);
    }

    pub fn set_credits(&self, credits: i64) {
        let changed = self.write(|s| s.credits.replace(credits) != Some(credits));
        if changed {
            self.emit(SessionEvent::CreditsChanged(credits));
        }
    }

    /// Drops everything and asks the shell to navigate to the login page.
    pub fn clear(&self) {
        self.write(|s| *s = Session::default());
        self.emit(SessionEvent::LoggedOut {
            redirect_to: LOGIN_PATH.to_string(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        match self.inner.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        match self.inner.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> TokenResponse {
        TokenResponse {
            access_token: "abc".into(),
            token_type: "bearer".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            credits: 10,
            is_admin: false,
        }
    }

    #[test]
    fn test_establish_then_clear() {
        let store = SessionStore::new();
        let mut events = store.subscribe();
        store.establish(&token());
        assert_eq!(store.token().as_deref(), Some("abc"));
        assert_eq!(store.credits(), Some(10));
        assert!(matches!(events.try_recv(), Ok(SessionEvent::LoggedIn(_))));

        store.clear();
        assert!(!store.is_authenticated());
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::LoggedOut {
                redirect_to: "/login".into()
            }
        );
    }

    #[test]
    fn test_unchanged_credits_are_not_announced() {
        let store = SessionStore::new();
        store.set_credits(4);
        let mut events = store.subscribe();
        store.set_credits(4);
        assert!(events.try_recv().is_err());
        store.set_credits(3);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::CreditsChanged(3));
    }
}
