//! User directory over the `users` collection: one record per email, created on
//! first login and mutated by role/status change requests.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::Role;
use crate::storage::{Collection, Document, Filter, UpdateResult};

/// Marker a client sends in `status` to ask for a role upgrade.
pub const STATUS_REQUESTED: &str = "Requested";

/// What `upsert_login` did. Serializes as the bare record or update result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LoginOutcome {
    Existing(Document),
    StatusUpdated(UpdateResult),
    Created(UpdateResult),
}

#[derive(Clone)]
pub struct UserDirectory {
    users: Collection,
}

fn by_email(email: &str) -> Filter {
    Filter::eq("email", email)
}

fn now_ms() -> Value {
    Value::from(Utc::now().timestamp_millis())
}

impl UserDirectory {
    pub fn new(users: Collection) -> Self {
        Self { users }
    }

    pub fn collection(&self) -> &Collection { &self.users }

    pub fn find_by_email(&self, email: &str) -> Option<Document> {
        self.users.find_one(&by_email(email))
    }

    pub fn list_all(&self) -> Vec<Document> {
        self.users.find_all()
    }

    /// Stored role for `email`, if the record exists and carries a known role.
    pub fn role_of(&self, email: &str) -> Option<Role> {
        self.find_by_email(email)?.get("role")?.as_str().and_then(Role::parse)
    }

    /// Login-time upsert:
    /// existing + `status: "Requested"` updates only `status`;
    /// existing otherwise is returned untouched;
    /// new users are upserted with the submitted fields plus `timestamp`.
    pub fn upsert_login(&self, user: Document) -> AppResult<LoginOutcome> {
        let Some(email) = user.get("email").and_then(Value::as_str).map(str::to_string) else {
            return Err(AppError::bad_request("missing_email", "user payload needs an email"));
        };
        let filter = by_email(&email);

        if let Some(existing) = self.users.find_one(&filter) {
            if user.get("status").and_then(Value::as_str) == Some(STATUS_REQUESTED) {
                let mut set = Document::new();
                set.insert("status".into(), Value::from(STATUS_REQUESTED));
                let res = self.users.update_one(&filter, set, false)?;
                info!(target: "directory", email = %email, "role upgrade requested");
                return Ok(LoginOutcome::StatusUpdated(res));
            }
            return Ok(LoginOutcome::Existing(existing));
        }

        let mut set = user;
        set.insert("timestamp".into(), now_ms());
        let res = self.users.update_one(&filter, set, true)?;
        info!(target: "directory", email = %email, "user created on first login");
        Ok(LoginOutcome::Created(res))
    }

    /// `$set` the submitted fields plus a fresh `timestamp` on the record for `email`.
    /// The path email is authoritative over any `email` in the body.
    pub fn update_user(&self, email: &str, mut fields: Document) -> AppResult<UpdateResult> {
        fields.insert("email".into(), Value::from(email));
        fields.insert("timestamp".into(), now_ms());
        let res = self.users.update_one(&by_email(email), fields, false)?;
        info!(target: "directory", email, matched = res.matched_count, "user updated");
        Ok(res)
    }
}
