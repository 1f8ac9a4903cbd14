//! # SSO
//!
//! Single sign-on core for multi-tenant applications. Users register once
//! with an email and password and log in to any registered application,
//! receiving a session token signed with that application's own secret.
//!
//! - [`auth`]: credential store, password hashing, token codec and the
//!   [`Authenticator`](auth::Authenticator) that ties them together.
//! - [`sso`]: the HTTP boundary (`/user/register`, `/user/login`, `/token/verify`).
//! - [`cli`]: argument parsing, logging setup and the `provision-app` command.

pub mod auth;
pub mod cli;
pub mod sso;
