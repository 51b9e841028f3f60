//! Authentication: credentials, password hashes, tokens, sessions and the
//! login state machine tying them together.

pub mod credentials;
pub mod form;
mod gate;
pub mod password;
pub mod session;
pub mod token;

pub use credentials::{Credential, CredentialStore};
pub use form::{LoginForm, ValidationErrors};
pub use gate::{AuthGate, LoginOutcome, LoginView, LogoutOutcome};
pub use session::{MemoryStore, SessionId, SessionSettings, SessionStore, StoreError};
pub use token::TokenGenerator;
