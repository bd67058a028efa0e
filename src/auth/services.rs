use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
    },
    error::ApiError,
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed value of a required text field, or a validation error.
fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(message))
}

pub enum RegisterOutcome {
    Created(User),
    AlreadyRegistered,
}

pub enum LoginOutcome {
    Success { user: User, token: String },
    WrongPassword,
}

pub async fn register(st: &AppState, req: RegisterRequest) -> Result<RegisterOutcome, ApiError> {
    let name = required(req.name, "Name is required")?;
    let email = required(req.email, "Email is required")?.to_lowercase();
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Password is required"))?;
    let confirm = req
        .confirm_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Confirm Password is required"))?;
    if password != confirm {
        return Err(ApiError::validation("Passwords do not match"));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    let existing = st
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Error in registration", e))?;
    if existing.is_some() {
        info!(%email, "registration for existing email");
        return Ok(RegisterOutcome::AlreadyRegistered);
    }

    let hash = hash_password(&password).map_err(|e| ApiError::internal("Error in registration", e))?;
    let user = st
        .users
        .create(NewUser {
            name: &name,
            email: &email,
            password_hash: &hash,
            role: req.role.unwrap_or_default(),
        })
        .await
        .map_err(|e| ApiError::internal("Error in registration", e))?;

    info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user registered");
    Ok(RegisterOutcome::Created(user))
}

pub async fn login(st: &AppState, req: LoginRequest) -> Result<LoginOutcome, ApiError> {
    let (email, password) = match (req.email, req.password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => {
            (e.trim().to_lowercase(), p)
        }
        _ => return Err(ApiError::not_found("Invalid email or password")),
    };

    let user = st
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Error in Login", e))?
        .ok_or_else(|| {
            warn!(%email, "login unknown email");
            ApiError::not_found("Email is not registered")
        })?;

    let ok = verify_password(&password, &user.password_hash)
        .map_err(|e| ApiError::internal("Error in Login", e))?;
    if !ok {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Ok(LoginOutcome::WrongPassword);
    }

    let token = JwtKeys::from_ref(st)
        .sign(user.id, user.role)
        .map_err(|e| ApiError::internal("Error in Login", e))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(LoginOutcome::Success { user, token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::Role;
    use axum::http::StatusCode;

    fn signup(name: &str, email: &str, pw: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(pw.into()),
            confirm_password: Some(pw.into()),
            role: None,
        }
    }

    fn credentials(email: &str, pw: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(pw.into()),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.io"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.io"));
    }

    #[tokio::test]
    async fn register_rejects_missing_fields_in_order() {
        let st = AppState::fake();
        let mut req = signup("ann", "ann@example.com", "pw");
        req.name = None;
        let err = register(&st, req).await.err().unwrap();
        assert_eq!(err.to_string(), "Name is required");

        let mut req = signup("ann", "ann@example.com", "pw");
        req.confirm_password = None;
        let err = register(&st, req).await.err().unwrap();
        assert_eq!(err.to_string(), "Confirm Password is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_mismatched_passwords() {
        let st = AppState::fake();
        let mut req = signup("ann", "ann@example.com", "pw");
        req.confirm_password = Some("other".into());
        let err = register(&st, req).await.err().unwrap();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[tokio::test]
    async fn register_twice_keeps_one_record() {
        let st = AppState::fake();
        let first = register(&st, signup("ann", "Ann@Example.com", "pw")).await.unwrap();
        let RegisterOutcome::Created(user) = first else {
            panic!("first registration should create");
        };
        assert_eq!(user.role, Role::User);
        assert_eq!(user.email, "ann@example.com");

        let second = register(&st, signup("ann again", "ann@example.com", "other")).await.unwrap();
        assert!(matches!(second, RegisterOutcome::AlreadyRegistered));

        let stored = st.users.find_by_email("ann@example.com").await.unwrap().unwrap();
        assert_eq!(stored.id, user.id);
        assert_eq!(stored.name, "ann");
    }

    #[tokio::test]
    async fn login_outcomes() {
        let st = AppState::fake();
        register(&st, signup("bob", "bob@example.com", "secret")).await.unwrap();

        let err = login(&st, credentials("nobody@example.com", "secret")).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let wrong = login(&st, credentials("bob@example.com", "nope")).await.unwrap();
        assert!(matches!(wrong, LoginOutcome::WrongPassword));

        let ok = login(&st, credentials("bob@example.com", "secret")).await.unwrap();
        let LoginOutcome::Success { user, token } = ok else {
            panic!("expected success");
        };
        let claims = JwtKeys::from_ref(&st).verify(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn login_without_fields_is_not_found() {
        let st = AppState::fake();
        let err = login(&st, LoginRequest::default()).await.err().unwrap();
        assert_eq!(err.to_string(), "Invalid email or password");
    }
}
