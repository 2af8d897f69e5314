//! Identity: signed session tokens, the session cookie, and the two request gates
//! (authentication, then role authorization).
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod token;
mod cookie;
mod request_context;
mod gate;

pub use principal::{Principal, Role};
pub use token::{Claims, TokenError, TokenSigner};
pub use cookie::{CookiePolicy, SESSION_COOKIE};
pub use request_context::RequestContext;
pub use gate::{authenticate, authorize};
