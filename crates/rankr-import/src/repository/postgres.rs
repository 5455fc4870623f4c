//! PostgreSQL user repository
//!
//! Schema lives in the workspace `migrations/` directory. A user and its
//! addresses are always written in one transaction; an upsert replaces the
//! whole address list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rankr_common::{RankrError, Result};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;

use super::UserRepository;
use crate::models::{Address, User, UserId};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    phone_number: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    addresses: Json<Vec<Address>>,
}

impl TryFrom<UserRow> for User {
    type Error = RankrError;

    fn try_from(row: UserRow) -> Result<Self> {
        let id = UserId::try_from(row.id)
            .map_err(|_| RankrError::Database(format!("stored user id {} is negative", row.id)))?;

        Ok(User {
            id,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            addresses: row.addresses.0,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

/// Repository over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RankrError {
    RankrError::Database(e.to_string())
}

/// Stored ids are BIGINT; zero and anything past `i64::MAX` cannot be stored
fn storage_id(id: UserId) -> Result<i64> {
    match i64::try_from(id) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(RankrError::InvalidId(format!(
            "id {id} is outside the storable range 1..={}",
            i64::MAX
        ))),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn upsert_user(&self, user: User) -> Result<()> {
        let id = storage_id(user.id)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, phone_number, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone_number = EXCLUDED.phone_number,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(user.created_at.unwrap_or(now))
        .bind(user.updated_at.unwrap_or(now))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query("DELETE FROM addresses WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for address in &user.addresses {
            sqlx::query(
                r#"
                INSERT INTO addresses (
                    user_id, street, city, state, zip_code, country, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(id)
            .bind(&address.street)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.zip_code)
            .bind(&address.country)
            .bind(address.created_at.unwrap_or(now))
            .bind(address.updated_at.unwrap_or(now))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        debug!(user_id = id, addresses = user.addresses.len(), "Upserted user");
        Ok(())
    }

    async fn get_by_id(&self, id: UserId) -> Result<User> {
        let db_id = i64::try_from(id).map_err(|_| RankrError::UserNotFound(id))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                u.id, u.name, u.email, u.phone_number, u.created_at, u.updated_at,
                COALESCE(
                    json_agg(
                        json_build_object(
                            'id', a.id,
                            'street', a.street,
                            'city', a.city,
                            'state', a.state,
                            'zip_code', a.zip_code,
                            'country', a.country,
                            'created_at', a.created_at,
                            'updated_at', a.updated_at
                        )
                        ORDER BY a.id
                    ) FILTER (WHERE a.id IS NOT NULL),
                    '[]'
                ) AS addresses
            FROM users u
            LEFT JOIN addresses a ON a.user_id = u.id
            WHERE u.id = $1
            GROUP BY u.id
            "#,
        )
        .bind(db_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RankrError::UserNotFound(id))?;

        User::try_from(row)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
