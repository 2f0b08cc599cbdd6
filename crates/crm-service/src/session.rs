//! Chat session state.
//!
//! Two orthogonal state machines share one transcript:
//! - authentication: `Unauthenticated -> Authenticating -> Authenticated`
//! - classifier: `Uninitialized -> Ready | Unavailable`
//!
//! Sessions live for the process only.

use tracing::{debug, info};
use ulid::Ulid;

use crm_query::CrmSession;
use crm_types::ChatMessage;

/// Opening line of every welcome message.
const WELCOME_GREETING: &str = "Hello! I'm your Salesforce assistant.";

/// Authentication state. The CRM session handle lives only in `Authenticated`.
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(CrmSession),
}

/// Classifier availability, decided once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClassifierState {
    #[default]
    Uninitialized,
    /// A model answered the probe
    Ready { model: String },
    /// No model answered; the rule-based tier is used for the rest of the session
    Unavailable,
}

/// One conversation.
#[derive(Debug, Clone)]
pub struct Session {
    id: Ulid,
    messages: Vec<ChatMessage>,
    auth: AuthState,
    /// Session held while a re-login is in flight
    prior_crm: Option<CrmSession>,
    classifier: ClassifierState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start an empty, unauthenticated session.
    pub fn new() -> Self {
        Self {
            id: Ulid::new(),
            messages: Vec::new(),
            auth: AuthState::Unauthenticated,
            prior_crm: None,
            classifier: ClassifierState::Uninitialized,
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Transcript in display order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a message and return a copy for the presentation layer.
    pub fn append(&mut self, message: ChatMessage) -> ChatMessage {
        self.messages.push(message.clone());
        message
    }

    /// Drop the transcript. Authentication is untouched.
    pub fn clear_history(&mut self) {
        debug!(session_id = %self.id, cleared = self.messages.len(), "Cleared chat history");
        self.messages.clear();
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated(_))
    }

    /// The live CRM session, if authenticated.
    pub fn crm_session(&self) -> Option<&CrmSession> {
        match &self.auth {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Enter `Authenticating`. A live CRM session is held until the
    /// login attempt resolves.
    pub fn begin_login(&mut self) {
        if let AuthState::Authenticated(crm) =
            std::mem::replace(&mut self.auth, AuthState::Authenticating)
        {
            self.prior_crm = Some(crm);
        }
    }

    /// Enter `Authenticated` and append the welcome message.
    pub fn complete_login(&mut self, crm: CrmSession) -> ChatMessage {
        info!(session_id = %self.id, instance = %crm.instance_url, "Session authenticated");
        self.prior_crm = None;
        self.auth = AuthState::Authenticated(crm);
        let welcome = welcome_message(self.classifier_available());
        self.append(ChatMessage::assistant(welcome))
    }

    /// Resolve a failed login. A re-login falls back to the session it
    /// started from; otherwise the state returns to `Unauthenticated`.
    pub fn fail_login(&mut self) {
        self.auth = match self.prior_crm.take() {
            Some(crm) => {
                debug!(session_id = %self.id, "Re-login failed, keeping previous CRM session");
                AuthState::Authenticated(crm)
            }
            None => AuthState::Unauthenticated,
        };
    }

    /// Discard the CRM session handle. The transcript is kept.
    ///
    /// Returns true if a session was dropped.
    pub fn logout(&mut self) -> bool {
        let was_authenticated = self.is_authenticated();
        self.auth = AuthState::Unauthenticated;
        self.prior_crm = None;
        if was_authenticated {
            info!(session_id = %self.id, "Logged out");
        }
        was_authenticated
    }

    pub fn classifier_state(&self) -> &ClassifierState {
        &self.classifier
    }

    pub fn classifier_available(&self) -> bool {
        matches!(self.classifier, ClassifierState::Ready { .. })
    }

    pub(crate) fn set_classifier_state(&mut self, state: ClassifierState) {
        self.classifier = state;
    }
}

/// Welcome wording for a fresh login.
pub fn welcome_message(classifier_available: bool) -> String {
    let body = if classifier_available {
        "I can help analyze your Salesforce data using natural language."
    } else {
        "I'm in simple query mode (Gemini AI unavailable). You can use preset queries or SOQL."
    };
    format!("{} {} What would you like to know?", WELCOME_GREETING, body)
}
