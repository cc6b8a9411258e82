//! Client-side authentication session.
//!
//! The state machine is pure ([`transition`]); [`Session`] drives it with
//! calls to the identity endpoint.

use super::{ClientError, ClientResult, Credential, RequestContext, TaskClient};
use crate::auth::Identity;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    /// Credential presented, identity not yet confirmed.
    Authenticating(Credential),
    Authenticated {
        credential: Credential,
        identity: Identity,
    },
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Begin(Credential),
    Resolved(Identity),
    Rejected,
    Logout,
}

/// Next state for `event`. Events that make no sense in `state` leave it
/// unchanged.
pub fn transition(state: SessionState, event: SessionEvent) -> SessionState {
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        (_, E::Logout) => S::Unauthenticated,
        (S::Unauthenticated | S::Authenticated { .. }, E::Begin(credential)) => {
            S::Authenticating(credential)
        }
        (S::Authenticating(credential), E::Resolved(identity)) => S::Authenticated {
            credential,
            identity,
        },
        (S::Authenticating(_) | S::Authenticated { .. }, E::Rejected) => S::Unauthenticated,
        (state, _) => state,
    }
}

/// A login session bound to one client.
#[derive(Debug)]
pub struct Session {
    client: TaskClient,
    state: SessionState,
}

impl Session {
    pub fn new(client: TaskClient) -> Self {
        Self {
            client,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn client(&self) -> &TaskClient {
        &self.client
    }

    /// Context for task calls, present only once authenticated.
    pub fn context(&self) -> Option<RequestContext> {
        match &self.state {
            SessionState::Authenticated { credential, .. } => {
                Some(RequestContext::new(credential.clone()))
            }
            _ => None,
        }
    }

    /// Present `credential` and confirm it with the server. Any failure,
    /// not only a 401, ends the session.
    pub async fn login(&mut self, credential: Credential) -> ClientResult<&Identity> {
        self.apply(SessionEvent::Begin(credential.clone()));

        let ctx = RequestContext::new(credential);
        match self.client.current_user(&ctx).await {
            Ok(identity) => {
                debug!(user = %identity.id, "Session authenticated");
                self.apply(SessionEvent::Resolved(identity));
                self.state.identity().ok_or_else(|| {
                    ClientError::Unauthorized("session was not authenticated".to_string())
                })
            }
            Err(e) => {
                warn!(error = %e, "Credential rejected");
                self.apply(SessionEvent::Rejected);
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) {
        self.apply(SessionEvent::Logout);
    }

    fn apply(&mut self, event: SessionEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state, event);
    }
}
