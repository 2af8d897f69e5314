use axum_extra::extract::cookie::{Cookie, SameSite};

pub const SESSION_COOKIE: &str = "token";

/// Transport attributes for the session cookie. Production serves the frontend
/// from another site, so the cookie must be `SameSite=None; Secure` there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub production: bool,
}

impl CookiePolicy {
    pub fn new(production: bool) -> Self {
        Self { production }
    }

    fn same_site(&self) -> SameSite {
        if self.production { SameSite::None } else { SameSite::Strict }
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(self.production)
            .same_site(self.same_site())
            .path("/")
            .build()
    }

    /// Expired, empty session cookie with the same attributes. Added to the jar
    /// directly so logout clears the cookie even when the request carried none.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut c = Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .secure(self.production)
            .same_site(self.same_site())
            .path("/")
            .build();
        c.make_removal();
        c
    }
}
