//! # Pordisto (Authentication Gateway)
//!
//! `pordisto` sits in front of a subscription-gated web application and decides,
//! per request, whether the caller may proceed, must authenticate, or must be
//! sent to a denial page.
//!
//! ## Identity lookups
//!
//! Every protected request needs the caller's identity/subscription record from
//! the upstream identity provider. Lookups go through a single-flight, TTL-bounded
//! cache ([`cache::SingleFlightCache`]): concurrent requests carrying the same
//! credential share one upstream fetch, and results expire deterministically.
//!
//! ## Access decisions
//!
//! [`access::AccessPolicy`] maps a lookup outcome plus the requested route to one
//! of four verdicts (allow, redirect to login, redirect home, redirect to the
//! denial page). It fails closed: any ambiguous lookup failure redirects to login.

pub mod access;
pub mod cache;
pub mod cli;
pub mod pordisto;
pub mod profile;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
