//! Route-protection verdicts.
//!
//! [`AccessPolicy::decide`] maps an identity lookup outcome plus the requested
//! route to exactly one verdict. It is total over its inputs and fails closed:
//! any lookup failure redirects to login, never a silent allow.

use crate::profile::{FetchError, Profile};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Terminal outcome of an access evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    RedirectLogin,
    RedirectHome,
    RedirectDenied,
}

/// Identity lookup outcome for one request.
#[derive(Debug, Clone)]
pub enum Identity {
    /// No credential was presented.
    Anonymous,
    /// A credential was presented but no lookup was performed. Public routes
    /// skip the upstream fetch entirely.
    Presented,
    /// The lookup failed; the credential may be invalid or the upstream may be
    /// unreachable. Either way access is denied.
    Failed(FetchError),
    /// The lookup succeeded.
    Known(Profile),
}

/// Capability predicate over `{plan name, requested route}`.
///
/// Additive allow-listing only where explicitly configured; the default rule
/// allows every route for every plan.
pub type CapabilityRule = Arc<dyn Fn(Option<&str>, &str) -> bool + Send + Sync>;

/// Route classification supplied as configuration: which routes are public,
/// where denied requests land, and the capability rule for subscribed users.
#[derive(Clone)]
pub struct AccessPolicy {
    public_routes: HashSet<String>,
    denied_route: String,
    capability: CapabilityRule,
}

impl fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPolicy")
            .field("public_routes", &self.public_routes)
            .field("denied_route", &self.denied_route)
            .finish_non_exhaustive()
    }
}

impl AccessPolicy {
    /// Build a policy from raw route names; each is normalized before matching.
    pub fn new<I, S>(public_routes: I, denied_route: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            public_routes: public_routes
                .into_iter()
                .map(|route| normalize(route.as_ref()))
                .collect(),
            denied_route: normalize(denied_route),
            capability: Arc::new(|_plan, _route| true),
        }
    }

    /// Replace the capability rule.
    #[must_use]
    pub fn with_capability(mut self, rule: CapabilityRule) -> Self {
        self.capability = rule;
        self
    }

    #[must_use]
    pub fn is_public(&self, route: &str) -> bool {
        self.public_routes.contains(&normalize(route))
    }

    /// Evaluate the access state machine for one request.
    ///
    /// - no credential: allowed only on public routes, otherwise login;
    /// - credential on a public route: home (authenticated users should not see
    ///   login/landing pages);
    /// - failed lookup: login, regardless of failure class (fail closed);
    /// - unsubscribed: login;
    /// - subscribed: capability rule decides, with the denial route itself
    ///   always allowed so a denied user is not redirected in a loop.
    #[must_use]
    pub fn decide(&self, identity: &Identity, route: &str) -> Verdict {
        let route = normalize(route);
        let public = self.public_routes.contains(&route);

        match identity {
            Identity::Anonymous => {
                if public {
                    Verdict::Allow
                } else {
                    Verdict::RedirectLogin
                }
            }
            Identity::Presented => {
                if public {
                    Verdict::RedirectHome
                } else {
                    // A protected route requires a lookup; without one, deny.
                    Verdict::RedirectLogin
                }
            }
            Identity::Failed(_) => Verdict::RedirectLogin,
            Identity::Known(profile) => {
                if public {
                    return Verdict::RedirectHome;
                }
                if !profile.is_subscribed {
                    return Verdict::RedirectLogin;
                }
                if (self.capability)(profile.plan_name.as_deref(), &route) {
                    Verdict::Allow
                } else if route == self.denied_route {
                    Verdict::Allow
                } else {
                    Verdict::RedirectDenied
                }
            }
        }
    }
}

/// Canonical form used for all route comparisons: lowercase, surrounding
/// whitespace and leading/trailing path separators removed.
#[must_use]
pub fn normalize(route: &str) -> String {
    route.trim().trim_matches('/').trim().to_lowercase()
}
