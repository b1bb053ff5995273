use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::{
    auth::{
        repo_types::{Invitation, NewUser, User},
        services::normalize_email,
    },
    rides::repo_types::{NewRide, Ride},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    rides: Vec<Ride>, // insertion order; newest last
    invitations: Vec<Invitation>,
}

/// In-process store used by tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_invitation(&self, email: &str, code: &str) -> Invitation {
        let invitation = Invitation {
            id: Uuid::new_v4(),
            email: email.to_string(),
            code: code.to_string(),
            created_at: OffsetDateTime::now_utc(),
            used_at: None,
        };
        self.tables.write().await.invitations.push(invitation.clone());
        invitation
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> anyhow::Result<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == user.email || u.username == user.username) {
            anyhow::bail!("unique constraint violated");
        }
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            firstname: user.firstname,
            lastname: user.lastname,
            password_hash: user.password_hash,
            reset_token: None,
            reset_token_expiry: None,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if let Some(u) = t.users.iter_mut().find(|u| u.id == user_id) {
            u.reset_token = Some(token.to_string());
            u.reset_token_expiry = Some(expiry);
        }
        Ok(())
    }

    async fn find_user_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users
            .iter()
            .find(|u| {
                u.reset_token.as_deref() == Some(token)
                    && u.reset_token_expiry.is_some_and(|exp| exp >= now)
            })
            .cloned())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> anyhow::Result<User> {
        let mut t = self.tables.write().await;
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| anyhow::anyhow!("user {user_id} not found"))?;
        user.password_hash = password_hash.to_string();
        user.reset_token = None;
        user.reset_token_expiry = None;
        Ok(user.clone())
    }

    async fn find_invitation(&self, email: &str, code: &str) -> anyhow::Result<Option<Invitation>> {
        let t = self.tables.read().await;
        Ok(t.invitations
            .iter()
            .find(|i| normalize_email(&i.email) == email && i.code == code)
            .cloned())
    }

    async fn mark_invitation_used(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if let Some(i) = t.invitations.iter_mut().find(|i| i.id == id) {
            i.used_at = Some(at);
        }
        Ok(())
    }

    async fn create_ride(&self, ride: NewRide) -> anyhow::Result<Ride> {
        let ride = Ride {
            id: Uuid::new_v4(),
            creator_id: ride.creator_id,
            name: ride.name,
            description: ride.description,
            points: ride.points,
            distance: ride.distance,
            start: ride.start,
            finish: ride.finish,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.write().await.rides.push(ride.clone());
        Ok(ride)
    }

    async fn find_ride(&self, id: Uuid) -> anyhow::Result<Option<Ride>> {
        let t = self.tables.read().await;
        Ok(t.rides.iter().find(|r| r.id == id).cloned())
    }

    async fn list_rides(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Ride>> {
        let t = self.tables.read().await;
        let take = limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(t.rides
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(take)
            .cloned()
            .collect())
    }

    async fn list_rides_by_creator(&self, creator_id: Uuid) -> anyhow::Result<Vec<Ride>> {
        let t = self.tables.read().await;
        Ok(t.rides
            .iter()
            .rev()
            .filter(|r| r.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn delete_ride(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        let before = t.rides.len();
        t.rides.retain(|r| r.id != id);
        Ok(t.rides.len() < before)
    }
}
