use tracing::debug;

use crate::directory::UserDirectory;
use crate::error::{AppError, AppResult};

use super::{Principal, RequestContext, Role, TokenSigner};

/// Authentication gate: turn the session cookie value into a principal.
/// A missing cookie is rejected without attempting verification; the user
/// directory is never consulted.
pub fn authenticate(signer: &TokenSigner, token: Option<&str>) -> AppResult<Principal> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        debug!(target: "gate", "no session cookie");
        return Err(AppError::unauthenticated("no_token", "unauthorized access"));
    };
    match signer.verify(token) {
        Ok(claims) => Ok(Principal::from(claims)),
        Err(e) => {
            debug!(target: "gate", "token rejected: {}", e);
            Err(e.into())
        }
    }
}

/// Role gate: the caller's stored role must equal `required` exactly. Missing
/// identity fails closed.
pub fn authorize(directory: &UserDirectory, ctx: Option<&RequestContext>, required: Role) -> AppResult<()> {
    let Some(email) = ctx.and_then(|c| c.email()) else {
        debug!(target: "gate", role = %required, "role check without identity");
        return Err(AppError::unauthenticated("no_identity", "unauthorized access"));
    };
    match directory.role_of(email) {
        Some(role) if role == required => Ok(()),
        found => {
            debug!(target: "gate", email, required = %required, found = ?found, "role check failed");
            Err(AppError::forbidden("forbidden", "unauthorized access!!"))
        }
    }
}
