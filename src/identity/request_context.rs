use super::Principal;

/// Request-scoped identity, stored in the request extensions by the
/// authentication gate and read by the role gate and handlers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
}

impl RequestContext {
    pub fn authenticated(principal: Principal) -> Self {
        Self { principal: Some(principal) }
    }

    pub fn email(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.email.as_str())
    }
}
