//! User alert port - blocking, user-facing error messages

/// Shows a message to the user in the local language
pub trait UserAlert: Send + Sync {
    fn alert(&self, message: &str);
}
