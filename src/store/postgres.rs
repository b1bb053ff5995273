use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::Store;
use crate::{
    auth::repo_types::{Invitation, NewUser, User},
    config::AppConfig,
    rides::repo_types::{NewRide, Ride, RideRow},
};

const USER_COLUMNS: &str = "id, email, username, firstname, lastname, password_hash, \
                            reset_token, reset_token_expiry, created_at";
const RIDE_COLUMNS: &str =
    "id, creator_id, name, description, points, distance, start, finish, created_at";

#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }

    async fn user_where(&self, clause: &str, value: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("find user by {clause}"))?;
        Ok(user)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.user_where("email", email).await
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.user_where("username", username).await
    }

    async fn create_user(&self, user: NewUser) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (email, username, firstname, lastname, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.firstname)
            .bind(&user.lastname)
            .bind(&user.password_hash)
            .fetch_one(&self.db)
            .await
            .context("insert user")?;
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET reset_token = $2, reset_token_expiry = $3
             WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expiry)
        .execute(&self.db)
        .await
        .context("set reset token")?;
        Ok(())
    }

    async fn find_user_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1 AND reset_token_expiry >= $2"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.db)
            .await
            .context("find user by reset token")?;
        Ok(user)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            UPDATE users
               SET password_hash = $2, reset_token = NULL, reset_token_expiry = NULL
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(password_hash)
            .fetch_one(&self.db)
            .await
            .context("update password")?;
        Ok(user)
    }

    async fn find_invitation(&self, email: &str, code: &str) -> anyhow::Result<Option<Invitation>> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, email, code, created_at, used_at
              FROM invitations
             WHERE lower(trim(email)) = $1 AND code = $2
            "#,
        )
        .bind(email)
        .bind(code)
        .fetch_optional(&self.db)
        .await
        .context("find invitation")?;
        Ok(invitation)
    }

    async fn mark_invitation_used(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query("UPDATE invitations SET used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await
            .context("mark invitation used")?;
        Ok(())
    }

    async fn create_ride(&self, ride: NewRide) -> anyhow::Result<Ride> {
        let sql = format!(
            r#"
            INSERT INTO rides (creator_id, name, description, points, distance, start, finish)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RIDE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, RideRow>(&sql)
            .bind(ride.creator_id)
            .bind(&ride.name)
            .bind(&ride.description)
            .bind(Json(&ride.points))
            .bind(ride.distance)
            .bind(&ride.start)
            .bind(&ride.finish)
            .fetch_one(&self.db)
            .await
            .context("insert ride")?;
        Ok(row.into())
    }

    async fn find_ride(&self, id: Uuid) -> anyhow::Result<Option<Ride>> {
        let sql = format!("SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1");
        let row = sqlx::query_as::<_, RideRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find ride")?;
        Ok(row.map(Ride::from))
    }

    async fn list_rides(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Ride>> {
        // LIMIT NULL means no limit in Postgres.
        let sql = format!(
            r#"
            SELECT {RIDE_COLUMNS}
              FROM rides
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2
            "#
        );
        let rows = sqlx::query_as::<_, RideRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await
            .context("list rides")?;
        Ok(rows.into_iter().map(Ride::from).collect())
    }

    async fn list_rides_by_creator(&self, creator_id: Uuid) -> anyhow::Result<Vec<Ride>> {
        let sql = format!(
            r#"
            SELECT {RIDE_COLUMNS}
              FROM rides
             WHERE creator_id = $1
             ORDER BY created_at DESC, id DESC
            "#
        );
        let rows = sqlx::query_as::<_, RideRow>(&sql)
            .bind(creator_id)
            .fetch_all(&self.db)
            .await
            .context("list rides by creator")?;
        Ok(rows.into_iter().map(Ride::from).collect())
    }

    async fn delete_ride(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM rides WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete ride")?;
        Ok(res.rows_affected() > 0)
    }
}
