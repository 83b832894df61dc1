//! The access gate: one middleware, parameterized by a required-role policy, in
//! front of every protected route group.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::{AuthUser, resolve_identity};
use crate::{
    AppState, config::AppConfig, error::ApiError, models::Role, repository::RepositoryState,
};

/// AccessPolicy
///
/// The set of roles a route group admits. Membership is exact: there is no role
/// hierarchy, so a policy that should admit admins lists `Role::Admin` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    roles: &'static [Role],
    unauthenticated_message: &'static str,
    forbidden_message: &'static str,
}

/// GateDecision
///
/// Outcome of applying a policy to a (possibly absent) identity.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Allow(AuthUser),
    Unauthenticated,
    Forbidden,
}

impl AccessPolicy {
    /// Any signed-in user.
    pub const AUTHENTICATED: Self = Self::new(&[Role::Customer, Role::Contractor, Role::Admin]);

    pub const ADMIN: Self = Self {
        roles: &[Role::Admin],
        unauthenticated_message: "Admin access required",
        forbidden_message: "Admin access required",
    };

    pub const CONTRACTOR: Self = Self {
        roles: &[Role::Contractor],
        unauthenticated_message: "Unauthorized",
        forbidden_message: "Contractor access required",
    };

    pub const CUSTOMER: Self = Self {
        roles: &[Role::Customer],
        unauthenticated_message: "Unauthorized",
        forbidden_message: "Customer access required",
    };

    pub const fn new(roles: &'static [Role]) -> Self {
        Self {
            roles,
            unauthenticated_message: "Unauthorized",
            forbidden_message: "Forbidden",
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// decide
    ///
    /// Pure decision: no identity is `Unauthenticated`, a role outside the set is
    /// `Forbidden`, anything else is allowed.
    pub fn decide(&self, identity: Option<AuthUser>) -> GateDecision {
        match identity {
            None => GateDecision::Unauthenticated,
            Some(user) if !self.permits(user.role) => GateDecision::Forbidden,
            Some(user) => GateDecision::Allow(user),
        }
    }

    /// authorize
    ///
    /// `decide` mapped onto the error taxonomy (401 / 403).
    pub fn authorize(&self, identity: Option<AuthUser>) -> Result<AuthUser, ApiError> {
        match self.decide(identity) {
            GateDecision::Allow(user) => Ok(user),
            GateDecision::Unauthenticated => Err(ApiError::Unauthenticated {
                message: self.unauthenticated_message.to_string(),
            }),
            GateDecision::Forbidden => Err(ApiError::Forbidden {
                message: self.forbidden_message.to_string(),
            }),
        }
    }
}

/// Gate
///
/// State handed to `access_gate`: the dependencies needed to resolve an identity
/// plus the policy for the route group it wraps.
#[derive(Clone)]
pub struct Gate {
    repo: RepositoryState,
    config: AppConfig,
    policy: AccessPolicy,
}

impl Gate {
    pub fn new(state: &AppState, policy: AccessPolicy) -> Self {
        Self {
            repo: state.repo.clone(),
            config: state.config.clone(),
            policy,
        }
    }
}

/// access_gate
///
/// Middleware used with `middleware::from_fn_with_state`. Runs before the handler:
/// denied requests never reach it, allowed ones carry their `AuthUser` in the
/// request extensions.
pub async fn access_gate(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = resolve_identity(request.headers(), &gate.repo, &gate.config).await;
    let user = gate.policy.authorize(identity)?;

    tracing::debug!(user_id = %user.id, role = %user.role, "access granted");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
