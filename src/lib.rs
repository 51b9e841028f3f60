//! # Dashgate (Single-Operator Dashboard Front Door)
//!
//! `dashgate` authenticates one operator against a statically configured user
//! list, keeps a server-side session, and gates access to an internal links
//! page.
//!
//! ## Sessions
//!
//! Sessions live in an in-process store keyed by an opaque identifier carried in
//! an `HttpOnly`, `SameSite=Strict` cookie. Each session has an absolute lifetime
//! (extended at login when "remember me" is ticked) and an idle timeout that is
//! reset on every access. The identifier is rotated the moment credentials are
//! accepted, so a pre-planted cookie never becomes authenticated.
//!
//! ## Login Form
//!
//! `GET /login` issues a fresh CSRF token into the session. `POST /login` checks,
//! in order: blank fields, the CSRF token of *this* session, the username
//! (case-insensitive) and the password. The first failing step re-renders the
//! form with an error; later steps never run.
//!
//! ## Credentials
//!
//! Users are read from the YAML configuration. Password hashes are either
//! argon2 PHC strings (see `dashgate hash-password`) or legacy unsalted SHA-1
//! hex digests, which are still accepted for existing deployments.

pub mod auth;
pub mod cli;
pub mod config;
pub mod dashboard;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
