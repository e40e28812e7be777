//! Domain records owned by the store
//!
//! - User: registered account with an Argon2 password hash
//! - Platform: an affiliate programme that links point into
//! - AffiliateLink: a tracked URL attached to a platform

use crate::AflError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateUrl;

/// Schemes accepted for affiliate link URLs
pub const LINK_URL_SCHEMES: [&str; 3] = ["ftp", "http", "https"];

/// User role
///
/// Roles are carried in issued tokens. Any authenticated role may create
/// platforms and links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = AflError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(AflError::ValidationError(format!("unknown role: {other}"))),
        }
    }
}

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Normalized with [`normalize_email`]; unique across the store
    pub email: String,
    /// Argon2 PHC string; never serialized in responses
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default role
    pub fn new(name: impl Into<String>, email: &str, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            email: normalize_email(email),
            password_hash: password_hash.into(),
            role: UserRole::default(),
            created_at: Utc::now(),
        }
    }
}

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fields accepted when creating a platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPlatform {
    pub name: String,
    pub description: String,
    pub niches: Vec<String>,
    pub commission_rate: f64,
    pub api_url: String,
}

/// Affiliate programme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Distinct niche labels in first-seen order
    pub niches: Vec<String>,
    pub commission_rate: f64,
    pub api_url: String,
    pub created_at: DateTime<Utc>,
}

impl Platform {
    pub fn new(input: NewPlatform) -> Self {
        let mut niches: Vec<String> = Vec::with_capacity(input.niches.len());
        for niche in input.niches {
            if !niches.contains(&niche) {
                niches.push(niche);
            }
        }

        Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            niches,
            commission_rate: input.commission_rate,
            api_url: input.api_url,
            created_at: Utc::now(),
        }
    }
}

/// Tracked link into a platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateLink {
    pub id: Uuid,
    pub url: String,
    pub platform_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl AffiliateLink {
    /// Build a link, rejecting URLs outside `scheme://...` for ftp, http and https
    pub fn new(url: impl Into<String>, platform_id: Uuid) -> crate::Result<Self> {
        let url = url.into();
        if !is_valid_link_url(&url) {
            return Err(AflError::ValidationError(format!("invalid URL: {url}")));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            url,
            platform_id,
            created_at: Utc::now(),
        })
    }
}

/// Check that `url` uses one of the link schemes
pub fn is_valid_link_url(url: &str) -> bool {
    is_url_with_scheme(url, &LINK_URL_SCHEMES)
}

/// Check that `url` has one of `schemes`, a non-empty remainder without
/// spaces or double quotes, and parses as a URL.
pub fn is_url_with_scheme(url: &str, schemes: &[&str]) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };

    schemes.contains(&scheme)
        && !rest.is_empty()
        && !rest.contains([' ', '"'])
        && url.validate_url()
}
