//! crates/satyashodh_core/src/auth.rs
//!
//! The two-state auth gate in front of every dashboard route.

use uuid::Uuid;

use crate::domain::UserProfile;

/// Where unauthenticated visitors are sent.
pub const ENTRY_PATH: &str = "/";

/// The identity attached to a signed-in session.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl From<&UserProfile> for Principal {
    fn from(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            photo_url: profile.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(Principal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow(Uuid),
    RedirectToEntry,
}

impl AuthState {
    pub fn sign_in(self, principal: Principal) -> Self {
        AuthState::Authenticated(principal)
    }

    pub fn sign_out(self) -> Self {
        AuthState::Unauthenticated
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    /// Decides whether a dashboard route may be served.
    pub fn gate(&self) -> GateDecision {
        match self {
            AuthState::Authenticated(principal) => GateDecision::Allow(principal.user_id),
            AuthState::Unauthenticated => GateDecision::RedirectToEntry,
        }
    }
}
