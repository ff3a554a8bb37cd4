//! Session storage.
//!
//! A session is an opaque token mapped to a user id. Handlers receive the
//! store as a trait object so the in-memory map can be swapped for a
//! persistent one without touching them.

mod memory;

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

pub use memory::MemorySessionStore;

/// Header carrying the session token on API requests.
pub const SESSION_HEADER: &str = "x-session-id";

/// Length of a generated token, in alphanumeric characters.
pub const TOKEN_LEN: usize = 43;

pub trait SessionStore: Send + Sync {
    /// Bind `token` to `user_id`, replacing any previous binding.
    fn put(&self, token: String, user_id: Uuid);

    fn get(&self, token: &str) -> Option<Uuid>;

    /// Remove `token`, returning the user it was bound to.
    fn delete(&self, token: &str) -> Option<Uuid>;
}

/// A fresh random session token.
pub fn create_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
