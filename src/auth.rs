//! Request identity extractors
//!
//! Tokens are verified by the gateway in front of this service, which forwards the
//! resolved identity as `x-user-id` / `x-user-role` headers. Handlers only ever see
//! the resulting [`Identity`].

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::models::Owner;
use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn user(id: Uuid) -> Self {
        Self { id, role: Role::User }
    }

    pub fn admin(id: Uuid) -> Self {
        Self { id, role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the caller is `user_id` or an admin
    pub fn can_act_for(&self, user_id: Uuid) -> bool {
        self.is_admin() || self.id == user_id
    }
}

fn identity_from_parts(parts: &Parts) -> Result<Option<Identity>, AppError> {
    let Some(raw_id) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    let id = raw_id
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or(AppError::Unauthenticated)?;

    let role = match parts.headers.get(USER_ROLE_HEADER).map(|v| v.to_str()) {
        None => Role::User,
        Some(Ok(raw)) if raw.trim().eq_ignore_ascii_case("admin") => Role::Admin,
        Some(Ok(raw)) if raw.trim().eq_ignore_ascii_case("user") => Role::User,
        Some(_) => return Err(AppError::Unauthenticated),
    };

    Ok(Some(Identity { id, role }))
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)?.ok_or(AppError::Unauthenticated)
    }
}

/// Identity for public routes that behave differently for signed-in callers
#[derive(Debug, Clone, Copy)]
pub struct MaybeIdentity(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(identity_from_parts(parts)?))
    }
}

/// Identity that must carry the admin role
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            return Err(AppError::forbidden("Admin role required"));
        }
        Ok(AdminIdentity(identity))
    }
}

/// Whoever is asking to touch an owned cart or wishlist line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Account(Identity),
    Guest(String),
}

impl Requester {
    /// Signed-in identity wins; otherwise a non-blank guest id is required
    pub fn resolve(identity: Option<Identity>, guest_id: Option<String>) -> Result<Self, AppError> {
        if let Some(identity) = identity {
            return Ok(Requester::Account(identity));
        }
        match guest_id.map(|g| g.trim().to_string()) {
            Some(guest) if !guest.is_empty() => Ok(Requester::Guest(guest)),
            _ => Err(AppError::Unauthenticated),
        }
    }

    /// Admins may touch anything; everyone else only what they own
    pub fn may_access(&self, owner: &Owner) -> bool {
        match (self, owner) {
            (Requester::Account(identity), _) if identity.is_admin() => true,
            (Requester::Account(identity), Owner::User(user_id)) => identity.id == *user_id,
            (Requester::Guest(guest), Owner::Guest(owner_guest)) => guest == owner_guest,
            _ => false,
        }
    }
}
