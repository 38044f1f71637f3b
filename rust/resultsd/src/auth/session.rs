use super::Identity;
use std::collections::HashMap;
use uuid::Uuid;

/// Logged-in identities keyed by opaque session token.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Identity>,
}

impl SessionStore {
    pub fn open(&mut self, identity: Identity) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), identity);
        token
    }

    /// Unknown or missing tokens resolve to [`Identity::Anonymous`].
    pub fn resolve(&self, token: Option<&str>) -> Identity {
        token
            .and_then(|t| self.sessions.get(t))
            .cloned()
            .unwrap_or(Identity::Anonymous)
    }

    pub fn close(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn revoke_student(&mut self, student_id: i64) {
        self.sessions
            .retain(|_, identity| !matches!(identity, Identity::Student { student_id: id } if *id == student_id));
    }

    pub fn revoke_admin_user(&mut self, user_id: i64) {
        self.sessions
            .retain(|_, identity| !matches!(identity, Identity::Admin { user_id: id, .. } if *id == user_id));
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
