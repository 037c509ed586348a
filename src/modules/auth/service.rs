use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use shopfront_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use shopfront_config::JwtConfig;
use shopfront_core::{AppError, hash_password, verify_password};

use crate::metrics;

use super::model::{AccessTokenResponse, ROLE_ADMIN, ROLE_USER, TokenPairResponse, User, UserCredentials};

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials".to_string())
}

fn invalid_refresh_token() -> AppError {
    AppError::unauthorized("Invalid refresh token".to_string())
}

pub struct AuthService;

impl AuthService {
    /// Creates a user with a bcrypt-hashed password.
    ///
    /// `role` must be `user` or `admin`.
    #[instrument(skip(db, password), fields(db.operation = "INSERT", db.table = "users"))]
    pub async fn create_user(
        db: &PgPool,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<User, AppError> {
        if role != ROLE_USER && role != ROLE_ADMIN {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Role must be 'user' or 'admin'"
            )));
        }

        let hashed_password = hash_password(password)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password, role)
             VALUES ($1, $2, $3)
             RETURNING id, username, role, created_at",
        )
        .bind(username)
        .bind(&hashed_password)
        .bind(role)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!(user.username = %username, "Attempted to register existing username");
                return AppError::bad_request(anyhow::anyhow!("Username exists"));
            }
            error!(error = %e, "Database error creating user");
            AppError::from(e)
        })?;

        info!(user.id = %user.id, user.role = %user.role, "User created");

        Ok(user)
    }

    pub async fn register(db: &PgPool, username: &str, password: &str) -> Result<User, AppError> {
        Self::create_user(db, username, password, ROLE_USER).await
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn find_user_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(user.id = %id, error = %e, "Database error fetching user");
            AppError::from(e)
        })
    }

    /// Checks a username/password pair.
    ///
    /// Unknown users and wrong passwords produce the same 401.
    #[instrument(skip(db, password), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn verify_credentials(
        db: &PgPool,
        username: &str,
        password: &str,
    ) -> Result<UserCredentials, AppError> {
        let Some(user) = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, password, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(db)
        .await?
        else {
            debug!(user.username = %username, "Login attempt for unknown user");
            metrics::track_user_login_failure("unknown_user");
            return Err(invalid_credentials());
        };

        if !verify_password(password, &user.password)? {
            debug!(user.id = %user.id, "Login attempt with wrong password");
            metrics::track_user_login_failure("invalid_password");
            return Err(invalid_credentials());
        }

        Ok(user)
    }

    /// Issues an access/refresh pair and stores the refresh token on the user.
    #[instrument(skip(db, password, jwt_config), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn login(
        db: &PgPool,
        username: &str,
        password: &str,
        jwt_config: &JwtConfig,
    ) -> Result<TokenPairResponse, AppError> {
        let user = Self::verify_credentials(db, username, password).await?;

        let access_token = create_access_token(user.id, &user.username, &user.role, jwt_config)?;
        let refresh_token = create_refresh_token(user.id, &user.username, jwt_config)?;

        sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
            .bind(&refresh_token)
            .bind(user.id)
            .execute(db)
            .await?;

        metrics::track_user_login_success(&user.role);
        info!(user.id = %user.id, "User logged in");

        Ok(TokenPairResponse {
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// The token must verify and match the one stored at login.
    #[instrument(skip(db, refresh_token, jwt_config), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn refresh(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<AccessTokenResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| invalid_refresh_token())?;

        #[derive(sqlx::FromRow)]
        struct StoredToken {
            username: String,
            role: String,
            refresh_token: Option<String>,
        }

        let stored = sqlx::query_as::<_, StoredToken>(
            "SELECT username, role, refresh_token FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(invalid_refresh_token)?;

        if stored.refresh_token.as_deref() != Some(refresh_token) {
            warn!(user.id = %user_id, "Refresh token does not match stored token");
            return Err(invalid_refresh_token());
        }

        let access_token = create_access_token(user_id, &stored.username, &stored.role, jwt_config)?;

        Ok(AccessTokenResponse { access_token })
    }

    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn logout(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = NULL WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;

        info!(user.id = %user_id, "User logged out");

        Ok(())
    }
}
