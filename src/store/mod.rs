use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::repo_types::{Invitation, NewUser, User},
    rides::repo_types::{NewRide, Ride},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Persistence for users, rides and invitations.
///
/// Every resolver goes through this trait; each call is a single round trip.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, user: NewUser) -> anyhow::Result<User>;
    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()>;
    /// A user whose reset token matches and has not expired at `now`.
    async fn find_user_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;
    /// Replaces the password hash and clears any pending reset token.
    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> anyhow::Result<User>;

    async fn find_invitation(&self, email: &str, code: &str) -> anyhow::Result<Option<Invitation>>;
    async fn mark_invitation_used(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()>;

    async fn create_ride(&self, ride: NewRide) -> anyhow::Result<Ride>;
    async fn find_ride(&self, id: Uuid) -> anyhow::Result<Option<Ride>>;
    /// Newest first. `limit = None` returns everything after `offset`.
    async fn list_rides(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Ride>>;
    async fn list_rides_by_creator(&self, creator_id: Uuid) -> anyhow::Result<Vec<Ride>>;
    /// Returns whether a row was removed.
    async fn delete_ride(&self, id: Uuid) -> anyhow::Result<bool>;
}
