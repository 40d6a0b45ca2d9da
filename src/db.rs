use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::auth::{
    repo::{StoreError, StoreResult, UserStore},
    repo_types::{NewToken, NewUser, ProfileUpdate, Role, Token, TokenPurpose, User},
};

/// `UserStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
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
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let user_agents: Vec<String> = new.user_agent.into_iter().collect();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, user_agents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, phone, bio, photo, role,
                      is_verified, user_agents, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(user_agents)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, bio, photo, role,
                   is_verified, user_agents, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, bio, photo, role,
                   is_verified, user_agents, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, bio, photo, role,
                   is_verified, user_agents, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                bio = COALESCE($4, bio),
                photo = COALESCE($5, photo),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, phone, bio, photo, role,
                      is_verified, user_agents, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.phone)
        .bind(update.bio)
        .bind(update.photo)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, phone, bio, photo, role,
                      is_verified, user_agents, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn set_verified(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn replace_token(&self, new: NewToken) -> StoreResult<Token> {
        let token = sqlx::query_as::<_, Token>(
            r#"
            INSERT INTO tokens (user_id, purpose, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, purpose) DO UPDATE
            SET token_hash = EXCLUDED.token_hash,
                created_at = now(),
                expires_at = EXCLUDED.expires_at
            RETURNING id, user_id, purpose, token_hash, expires_at
            "#,
        )
        .bind(new.user_id)
        .bind(new.purpose)
        .bind(&new.token_hash)
        .bind(new.expires_at)
        .fetch_one(&self.db)
        .await?;
        Ok(token)
    }

    async fn find_token(&self, token_hash: &str, purpose: TokenPurpose) -> StoreResult<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(
            r#"
            SELECT id, user_id, purpose, token_hash, expires_at
            FROM tokens
            WHERE token_hash = $1 AND purpose = $2
            "#,
        )
        .bind(token_hash)
        .bind(purpose)
        .fetch_optional(&self.db)
        .await?;
        Ok(token)
    }

    async fn delete_token(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
