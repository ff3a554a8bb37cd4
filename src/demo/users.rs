use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub provider: String,
    pub provider_id: Option<String>,
}

/// What a new user is created from when an email is seen for the first time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub provider: String,
    pub provider_id: Option<String>,
}

/// In-memory users, keyed by id and indexed by email.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_id: DashMap<Uuid, User>,
    by_email: DashMap<String, Uuid>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user registered under `new.email`, created from `new` if absent.
    pub fn find_or_create(&self, new: NewUser) -> User {
        let id = *self
            .by_email
            .entry(new.email.clone())
            .or_insert_with(Uuid::new_v4);

        self.by_id
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!(%id, email = %new.email, "Creating demo user");
                User {
                    id,
                    email: new.email,
                    name: new.name,
                    provider: new.provider,
                    provider_id: new.provider_id,
                }
            })
            .clone()
    }

    pub fn get(&self, id: &Uuid) -> Option<User> {
        self.by_id.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &Uuid) -> Option<User> {
        let (_, user) = self.by_id.remove(id)?;
        self.by_email.remove(&user.email);
        Some(user)
    }
}
