//! Two-step login flow as an explicit state machine.
//!
//! The browser only posts form events; every transition decision lives here,
//! in a single reducer, so the flow can be tested without a server. The
//! pending state is serialized into the session between requests.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Verification codes are six digits.
pub const CODE_LEN: usize = 6;

/// The code expires seven minutes after it is issued (or resent).
pub const CODE_TTL_SECS: i64 = 7 * 60;

/// State of the login flow for one browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum LoginFlow {
    /// Waiting for email + password.
    #[default]
    Credentials,
    /// Credentials accepted; waiting for the emailed code.
    Verification(VerificationState),
    /// Code accepted; an `AuthSession` exists.
    Authenticated,
}

/// Pending verification step. The password is kept because "resend code" is
/// another credentials post against the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationState {
    pub email: String,
    pub senha: String,
    digits: [Option<char>; CODE_LEN],
    pub deadline: DateTime<Utc>,
    submitted: bool,
}

impl VerificationState {
    fn start(email: &str, senha: &str, now: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            senha: senha.to_string(),
            digits: [None; CODE_LEN],
            deadline: now + Duration::seconds(CODE_TTL_SECS),
            submitted: false,
        }
    }

    fn clear_digits(&mut self) {
        self.digits = [None; CODE_LEN];
        self.submitted = false;
    }

    /// The full code once all six digits are present.
    pub fn code(&self) -> Option<String> {
        if self.digits.iter().all(|d| d.is_some()) {
            Some(self.digits.iter().flatten().collect())
        } else {
            None
        }
    }

    /// Number of digits entered so far.
    pub fn entered(&self) -> usize {
        self.digits.iter().flatten().count()
    }

    /// Seconds left on the countdown, clamped at zero.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.deadline - now).num_seconds().max(0)
    }

    fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    /// Returns the submit effect at most once per entry attempt.
    fn try_auto_submit(&mut self) -> Effect {
        if self.submitted {
            return Effect::None;
        }
        match self.code() {
            Some(code) => {
                self.submitted = true;
                Effect::SubmitCode(code)
            }
            None => Effect::None,
        }
    }
}

/// Inputs to the reducer. Time-sensitive events carry `now` so the reducer
/// stays deterministic under test.
#[derive(Debug, Clone)]
pub enum Event<'a> {
    /// The backend accepted the credentials and sent a code.
    CredentialsAccepted {
        email: &'a str,
        senha: &'a str,
        now: DateTime<Utc>,
    },
    /// A single character typed into a code slot.
    Digit { value: char, now: DateTime<Utc> },
    /// Backspace in the code entry.
    Backspace,
    /// Text pasted into the code entry.
    Paste { text: &'a str, now: DateTime<Utc> },
    /// Explicit press of the verify button.
    Submit { now: DateTime<Utc> },
    /// Passage of time with no other input.
    Tick { now: DateTime<Utc> },
    /// The backend accepted a resend request.
    Resend { now: DateTime<Utc> },
    /// The backend rejected the submitted code.
    CodeRejected,
    /// The backend accepted the submitted code.
    CodeAccepted,
    /// Explicit back navigation to the credentials step.
    Back,
}

/// What the caller must do after applying an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Call the verification endpoint with this code.
    SubmitCode(String),
    /// Fewer than six digits on an explicit submit.
    Incomplete,
    /// The countdown ran out; the flow reverted to credentials.
    Expired,
    /// Verification succeeded; create the session and redirect.
    LoggedIn,
}

impl LoginFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event, mutating the state and returning the effect the
    /// caller must perform. Events that do not apply to the current state are
    /// ignored.
    pub fn apply(&mut self, event: Event<'_>) -> Effect {
        match event {
            Event::CredentialsAccepted { email, senha, now } => {
                *self = LoginFlow::Verification(VerificationState::start(email, senha, now));
                Effect::None
            }
            Event::Back => {
                if matches!(self, LoginFlow::Verification(_)) {
                    *self = LoginFlow::Credentials;
                }
                Effect::None
            }
            Event::CodeAccepted => {
                if matches!(self, LoginFlow::Verification(_)) {
                    *self = LoginFlow::Authenticated;
                    Effect::LoggedIn
                } else {
                    Effect::None
                }
            }
            Event::CodeRejected => {
                if let LoginFlow::Verification(state) = self {
                    state.clear_digits();
                }
                Effect::None
            }
            Event::Backspace => {
                if let LoginFlow::Verification(state) = self {
                    if let Some(slot) = state.digits.iter_mut().rev().find(|d| d.is_some()) {
                        *slot = None;
                    }
                }
                Effect::None
            }
            Event::Digit { value, now } => self.timed(now, |state| {
                if !value.is_ascii_digit() {
                    return Effect::None;
                }
                if let Some(slot) = state.digits.iter_mut().find(|d| d.is_none()) {
                    *slot = Some(value);
                }
                state.try_auto_submit()
            }),
            Event::Paste { text, now } => self.timed(now, |state| {
                let pasted: Vec<char> = text
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .take(CODE_LEN)
                    .collect();
                if pasted.is_empty() {
                    return Effect::None;
                }
                for (slot, value) in state.digits.iter_mut().zip(pasted) {
                    *slot = Some(value);
                }
                state.try_auto_submit()
            }),
            Event::Submit { now } => self.timed(now, |state| match state.code() {
                Some(code) => {
                    state.submitted = true;
                    Effect::SubmitCode(code)
                }
                None => Effect::Incomplete,
            }),
            Event::Tick { now } => self.timed(now, |_| Effect::None),
            Event::Resend { now } => self.timed(now, |state| {
                state.clear_digits();
                state.deadline = now + Duration::seconds(CODE_TTL_SECS);
                Effect::None
            }),
        }
    }

    /// Runs `f` against the verification state after the expiry check. A past
    /// deadline reverts to the credentials step, dropping entered digits.
    fn timed<F>(&mut self, now: DateTime<Utc>, f: F) -> Effect
    where
        F: FnOnce(&mut VerificationState) -> Effect,
    {
        match self {
            LoginFlow::Verification(state) => {
                if state.expired(now) {
                    *self = LoginFlow::Credentials;
                    Effect::Expired
                } else {
                    f(state)
                }
            }
            _ => Effect::None,
        }
    }
}
