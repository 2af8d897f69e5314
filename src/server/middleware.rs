//! Request gates as axum middleware. Authentication always runs before the role
//! check; a route that needs a role gets both via `with_role`.

use axum::extract::{Request, State};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::MethodRouter;
use axum_extra::extract::CookieJar;

use crate::directory::UserDirectory;
use crate::error::AppError;
use crate::identity::{self, RequestContext, Role, SESSION_COOKIE};

use super::AppState;

/// Verify the session cookie and attach the caller's identity to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let principal = identity::authenticate(&state.signer, token.as_deref())?;
    req.extensions_mut().insert(RequestContext::authenticated(principal));
    Ok(next.run(req).await)
}

/// State for one role gate instance: which role, checked against which directory.
#[derive(Clone)]
pub struct RoleGate {
    directory: UserDirectory,
    required: Role,
}

impl RoleGate {
    pub fn new(state: &AppState, required: Role) -> Self {
        Self { directory: state.users.clone(), required }
    }
}

/// Reject unless the authenticated caller's stored role equals the gate's role.
pub async fn require_role(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    identity::authorize(&gate.directory, req.extensions().get::<RequestContext>(), gate.required)?;
    Ok(next.run(req).await)
}

/// Put `route` behind the authentication gate.
pub fn with_auth(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(state.clone(), require_auth))
}

/// Put `route` behind authentication, then the role gate for `role`.
pub fn with_role(route: MethodRouter<AppState>, state: &AppState, role: Role) -> MethodRouter<AppState> {
    let gated = route.route_layer(from_fn_with_state(RoleGate::new(state, role), require_role));
    with_auth(gated, state)
}
