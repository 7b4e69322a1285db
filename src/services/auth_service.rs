use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::{
    db::DbPool,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    error::{AppError, AppResult},
    models::User,
    state::AppState,
};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

fn validate_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::Validation(
            "Username must be at least 3 characters".into(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<RegisterResponse> {
    let RegisterRequest { username, password } = payload;
    validate_credentials(&username, &password)?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(pool)
        .await?;

    if exists.is_some() {
        return Err(AppError::Conflict("Username is already taken".into()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let inserted: Result<(i64,), sqlx::Error> =
        sqlx::query_as("INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id")
            .bind(&username)
            .bind(&password_hash)
            .fetch_one(pool)
            .await;

    // The existence check above is only the friendly fast path; under
    // concurrent registrations the unique constraint is the real guard.
    let (user_id,) = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(AppError::Conflict("Username is already taken".into()));
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(user_id, "user registered");

    Ok(RegisterResponse {
        message: "User registered".into(),
        user_id,
    })
}

pub async fn login_user(state: &AppState, payload: LoginRequest) -> AppResult<LoginResponse> {
    let LoginRequest { username, password } = payload;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&state.pool)
        .await?;

    // Same message for unknown user and wrong password.
    let user = user.ok_or_else(|| AppError::Unauthorized("Invalid username or password".into()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Stored password hash is malformed")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }

    let token = state.tokens.issue(user.id, &user.username)?;

    Ok(LoginResponse {
        message: "Login successful".into(),
        token,
        username: user.username,
        user_id: user.id,
    })
}
