//! User model, permissions and the authorization guard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Permission kinds known to the authorization guard.
///
/// Stored and transmitted as the legacy Spanish permission strings; modeled
/// as a closed enumeration so the guard can match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "crear_libro")]
    CreateBook,
    #[serde(rename = "modificar_libro")]
    UpdateBook,
    #[serde(rename = "inhabilitar_libro")]
    DisableBook,
    #[serde(rename = "modificar_usuario")]
    UpdateUser,
    #[serde(rename = "inhabilitar_usuario")]
    DisableUser,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateBook => "crear_libro",
            Permission::UpdateBook => "modificar_libro",
            Permission::DisableBook => "inhabilitar_libro",
            Permission::UpdateUser => "modificar_usuario",
            Permission::DisableUser => "inhabilitar_usuario",
        }
    }

    /// Parse a stored permission string. Unknown strings yield `None` and
    /// are dropped at the persistence edge.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "crear_libro" => Some(Permission::CreateBook),
            "modificar_libro" => Some(Permission::UpdateBook),
            "inhabilitar_libro" => Some(Permission::DisableBook),
            "modificar_usuario" => Some(Permission::UpdateUser),
            "inhabilitar_usuario" => Some(Permission::DisableUser),
            _ => None,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Internal row structure for database queries (permissions as raw strings)
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub permissions: Vec<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            permissions: row
                .permissions
                .iter()
                .filter_map(|s| Permission::parse(s))
                .collect(),
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub permissions: Vec<Permission>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Case-insensitive partial match on name
    pub name: Option<String>,
    /// Exact match on email
    pub email: Option<String>,
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Update user request. The credential is never mutated through this path;
/// there is no password field on purpose.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub permissions: Option<Vec<Permission>>,
}

/// A mutating operation submitted to the authorization guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateBook,
    UpdateBook,
    DisableBook,
    UpdateUser { target: Uuid },
    DisableUser { target: Uuid },
    CreateReservation,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub permissions: Vec<Permission>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Authorization decision. Pure: Allow (`true`) or Deny (`false`),
    /// never an error. A user may always mutate their own record; every
    /// other mutation requires the matching permission. Reservation
    /// creation needs nothing beyond a valid session.
    pub fn is_allowed(&self, operation: &Operation) -> bool {
        match operation {
            Operation::CreateBook => self.has(Permission::CreateBook),
            Operation::UpdateBook => self.has(Permission::UpdateBook),
            Operation::DisableBook => self.has(Permission::DisableBook),
            Operation::UpdateUser { target } => {
                *target == self.user_id || self.has(Permission::UpdateUser)
            }
            Operation::DisableUser { target } => {
                *target == self.user_id || self.has(Permission::DisableUser)
            }
            Operation::CreateReservation => true,
        }
    }

    /// Guard entry point for handlers: Deny surfaces as 403
    pub fn require(&self, operation: &Operation) -> Result<(), AppError> {
        if self.is_allowed(operation) {
            Ok(())
        } else {
            Err(AppError::Authorization("Not authorized".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with(permissions: Vec<Permission>) -> UserClaims {
        UserClaims {
            sub: "user@test.com".to_string(),
            user_id: Uuid::new_v4(),
            permissions,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        }
    }

    #[test]
    fn permission_strings_round_trip() {
        for p in [
            Permission::CreateBook,
            Permission::UpdateBook,
            Permission::DisableBook,
            Permission::UpdateUser,
            Permission::DisableUser,
        ] {
            assert_eq!(Permission::parse(p.as_str()), Some(p));
        }
        assert_eq!(Permission::parse("volar"), None);
    }

    #[test]
    fn unknown_stored_permissions_are_dropped() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "n".into(),
            email: "n@test.com".into(),
            password_hash: "h".into(),
            permissions: vec!["crear_libro".into(), "volar".into()],
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let user = User::from(row);
        assert_eq!(user.permissions, vec![Permission::CreateBook]);
    }

    #[test]
    fn book_mutations_require_the_matching_permission() {
        let ops = [
            (Operation::CreateBook, Permission::CreateBook),
            (Operation::UpdateBook, Permission::UpdateBook),
            (Operation::DisableBook, Permission::DisableBook),
        ];
        let all = [
            Permission::CreateBook,
            Permission::UpdateBook,
            Permission::DisableBook,
            Permission::UpdateUser,
            Permission::DisableUser,
        ];
        for (op, required) in ops {
            assert!(!claims_with(vec![]).is_allowed(&op));
            assert!(claims_with(vec![required]).is_allowed(&op));
            // Holding every permission except the required one still denies
            let others: Vec<_> = all.iter().copied().filter(|p| *p != required).collect();
            assert!(!claims_with(others).is_allowed(&op));
        }
    }

    #[test]
    fn self_action_clause_applies_only_to_own_user_record() {
        let claims = claims_with(vec![]);
        let own = claims.user_id;
        let other = Uuid::new_v4();

        assert!(claims.is_allowed(&Operation::UpdateUser { target: own }));
        assert!(claims.is_allowed(&Operation::DisableUser { target: own }));
        assert!(!claims.is_allowed(&Operation::UpdateUser { target: other }));
        assert!(!claims.is_allowed(&Operation::DisableUser { target: other }));
    }

    #[test]
    fn foreign_user_mutation_requires_explicit_permission() {
        let other = Uuid::new_v4();

        let updater = claims_with(vec![Permission::UpdateUser]);
        assert!(updater.is_allowed(&Operation::UpdateUser { target: other }));
        assert!(!updater.is_allowed(&Operation::DisableUser { target: other }));

        let disabler = claims_with(vec![Permission::DisableUser]);
        assert!(disabler.is_allowed(&Operation::DisableUser { target: other }));
        assert!(!disabler.is_allowed(&Operation::UpdateUser { target: other }));
    }

    #[test]
    fn reservation_creation_needs_only_a_session() {
        assert!(claims_with(vec![]).is_allowed(&Operation::CreateReservation));
    }

    #[test]
    fn deny_surfaces_as_authorization_error() {
        let err = claims_with(vec![])
            .require(&Operation::CreateBook)
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[test]
    fn token_round_trip_preserves_identity_and_permissions() {
        let claims = claims_with(vec![Permission::CreateBook, Permission::UpdateUser]);
        let token = claims.create_token("test-secret").unwrap();
        let parsed = UserClaims::from_token(&token, "test-secret").unwrap();
        assert_eq!(parsed.user_id, claims.user_id);
        assert_eq!(parsed.permissions, claims.permissions);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let claims = claims_with(vec![]);
        let token = claims.create_token("test-secret").unwrap();
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }
}
