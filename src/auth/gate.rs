use super::{
    credentials::CredentialStore,
    form::{
        LoginForm, ValidationErrors, MSG_FAILED_TO_PROCESS, MSG_INVALID_AUTHENTICATION,
        MSG_INVALID_SESSION, MSG_USER_NOT_FOUND,
    },
    session::{or_anonymous, SessionId, SessionStore, StoreError, KEY_TOKEN, KEY_USER},
    token::TokenGenerator,
};
use std::{sync::Arc, time::Duration};
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

/// What the login handlers should answer with.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Go to the dashboard. `session` is set when the identifier was rotated and
    /// the cookie must be replaced.
    Redirect { session: Option<SessionId> },
    /// Show the login form.
    Form(LoginView),
}

#[derive(Debug)]
pub struct LoginView {
    /// Set when a new session was started and its cookie must be sent.
    pub new_session: Option<SessionId>,
    /// Token to embed in the form; empty when the store could not issue one.
    pub csrf: String,
    pub errors: ValidationErrors,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// A session was ended; the cookie should be cleared.
    SignedOut,
    /// Nobody was signed in; nothing changed.
    Anonymous,
}

struct IssuedToken {
    session: SessionId,
    created: bool,
    token: String,
}

/// Login state machine over a [`SessionStore`].
pub struct AuthGate {
    store: Arc<dyn SessionStore>,
    tokens: TokenGenerator,
    remember_lifetime: Duration,
}

impl AuthGate {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        tokens: TokenGenerator,
        remember_lifetime: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            remember_lifetime,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Username bound to the session, if it is live and authenticated.
    pub async fn current_user(&self, session: Option<&SessionId>) -> Option<String> {
        let session = session?;
        or_anonymous(self.store.get(session, KEY_USER).await).filter(|user| !user.is_empty())
    }

    pub async fn is_authenticated(&self, session: Option<&SessionId>) -> bool {
        self.current_user(session).await.is_some()
    }

    /// `GET /login`: redirect signed-in users, otherwise issue a token and show the form.
    pub async fn login_page(&self, session: Option<SessionId>) -> LoginOutcome {
        if self.is_authenticated(session.as_ref()).await {
            return LoginOutcome::Redirect { session: None };
        }
        self.form(session, ValidationErrors::default()).await
    }

    /// `POST /login`. Checks run in order and the first failure ends the request:
    /// presence, CSRF token of this session, username, password, commit.
    pub async fn login_submit(
        &self,
        session: Option<SessionId>,
        form: &LoginForm,
        credentials: &CredentialStore,
    ) -> LoginOutcome {
        if self.is_authenticated(session.as_ref()).await {
            return LoginOutcome::Redirect { session: None };
        }

        let mut errors = form.validate();
        let (Some(username), Some(password), Some(csrf)) =
            (form.username(), form.password(), form.csrf())
        else {
            return self.form(session, errors).await;
        };

        let Some(session) = session else {
            warn!("Login attempt without a session");
            errors.global(MSG_INVALID_SESSION);
            return self.form(None, errors).await;
        };

        let stored = or_anonymous(self.store.get(&session, KEY_TOKEN).await);
        let token_matches = stored
            .as_deref()
            .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(csrf.as_bytes())));
        if !token_matches {
            warn!("Login attempt with an invalid csrf token");
            errors.global(MSG_INVALID_SESSION);
            return self.form(Some(session), errors).await;
        }

        let Some(credential) = credentials.find_by_username(username) else {
            info!("Login attempt for an unknown user");
            errors.global(MSG_USER_NOT_FOUND);
            return self.form(Some(session), errors).await;
        };

        if !credential.verify(password) {
            info!(user = credential.username(), "Login attempt with a wrong password");
            errors.global(MSG_INVALID_AUTHENTICATION);
            return self.form(Some(session), errors).await;
        }

        let lifetime = form.remember().then_some(self.remember_lifetime);
        match self
            .store
            .commit_login(&session, credential.username(), lifetime)
            .await
        {
            Ok(rotated) => {
                info!(user = credential.username(), remember = lifetime.is_some(), "Login accepted");
                LoginOutcome::Redirect {
                    session: Some(rotated),
                }
            }
            Err(StoreError::NotFound) => {
                // A concurrent submit already rotated this session; starting another
                // one here would replace the winner's cookie.
                warn!("Login committed by a concurrent request");
                errors.global(MSG_FAILED_TO_PROCESS);
                LoginOutcome::Form(LoginView {
                    new_session: None,
                    csrf: String::new(),
                    errors,
                })
            }
            Err(err) => {
                error!("Failed to commit login: {err}");
                errors.global(MSG_FAILED_TO_PROCESS);
                self.form(Some(session), errors).await
            }
        }
    }

    /// `GET /logout`: end the session if one is authenticated.
    pub async fn logout(&self, session: Option<SessionId>) -> LogoutOutcome {
        let Some(session) = session else {
            return LogoutOutcome::Anonymous;
        };
        if !self.is_authenticated(Some(&session)).await {
            return LogoutOutcome::Anonymous;
        }

        if let Err(err) = self.store.destroy(&session).await {
            warn!("Failed to destroy session, rotating instead: {err}");
            if let Err(err) = self.store.renew_identifier(&session).await {
                error!("Failed to rotate session on logout: {err}");
            }
        }
        info!("Logout");
        LogoutOutcome::SignedOut
    }

    /// Render the form with a freshly issued token. Each failed submission gets a
    /// new token, so a token passes at most one POST validation.
    async fn form(&self, session: Option<SessionId>, mut errors: ValidationErrors) -> LoginOutcome {
        match self.issue_token(session).await {
            Ok(issued) => LoginOutcome::Form(LoginView {
                new_session: issued.created.then_some(issued.session),
                csrf: issued.token,
                errors,
            }),
            Err(err) => {
                error!("Failed to issue csrf token: {err}");
                errors.global(MSG_FAILED_TO_PROCESS);
                LoginOutcome::Form(LoginView {
                    new_session: None,
                    csrf: String::new(),
                    errors,
                })
            }
        }
    }

    /// Store a new token in the given session, starting one when it is missing or expired.
    async fn issue_token(&self, session: Option<SessionId>) -> Result<IssuedToken, StoreError> {
        let token = self
            .tokens
            .generate()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        if let Some(session) = session {
            match self.store.put(&session, KEY_TOKEN, token.clone()).await {
                Ok(()) => {
                    return Ok(IssuedToken {
                        session,
                        created: false,
                        token,
                    })
                }
                Err(StoreError::NotFound) => {}
                Err(err) => return Err(err),
            }
        }

        let session = self.store.create().await?;
        self.store.put(&session, KEY_TOKEN, token.clone()).await?;
        Ok(IssuedToken {
            session,
            created: true,
            token,
        })
    }
}
