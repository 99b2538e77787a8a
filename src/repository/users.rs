//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateUser, User, UserQuery, UserRow},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get an enabled user by ID. Disabled users are invisible to reads.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE id = $1 AND enabled = TRUE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(row.into())
    }

    /// Get an enabled user by email, for authentication
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND enabled = TRUE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Check if an email is already taken
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a new user. The unique index on email backstops the
    /// service-level pre-check under concurrent registration.
    pub async fn create(&self, user: &CreateUser, password_hash: &str) -> AppResult<User> {
        let permissions: Vec<String> =
            user.permissions.iter().map(|p| p.to_string()).collect();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, permissions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(password_hash)
        .bind(&permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email already in use".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into())
    }

    /// List enabled users with optional filters
    pub async fn search(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        let mut builder = sqlx::QueryBuilder::<Postgres>::new(
            "SELECT * FROM users WHERE enabled = TRUE",
        );

        if let Some(ref name) = query.name {
            builder.push(" AND name ILIKE ");
            builder.push_bind(format!("%{}%", name));
        }
        if let Some(ref email) = query.email {
            builder.push(" AND LOWER(email) = LOWER(");
            builder.push_bind(email.clone());
            builder.push(")");
        }
        builder.push(" ORDER BY created_at");

        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Update only the provided fields of an enabled user
    pub async fn update(&self, id: Uuid, user: &UpdateUser) -> AppResult<User> {
        let permissions: Option<Vec<String>> = user
            .permissions
            .as_ref()
            .map(|ps| ps.iter().map(|p| p.to_string()).collect());

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                permissions = COALESCE($4, permissions),
                updated_at = NOW()
            WHERE id = $1 AND enabled = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&permissions)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email already in use".to_string())
            }
            _ => AppError::Database(e),
        })?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(row.into())
    }

    /// Soft-delete a user. Idempotent: disabling an already disabled user
    /// succeeds and leaves enabled = false.
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET enabled = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(row.into())
    }
}
