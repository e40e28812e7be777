//! Declarative request validation
//!
//! Rules are plain data: an ordered table of fields, each with an ordered
//! list of checks. [`validate`] interprets a table against the raw JSON body
//! and reports every failing field at once, in table order, with the message
//! of the first check that field failed.
//!
//! [`ValidatedJson`] wires this into axum: the handler only runs, and the
//! body is only deserialized into its typed form, once every rule passes.

use crate::error::AppError;
use afl_core::{is_url_with_scheme, LINK_URL_SCHEMES};
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidateEmail;

/// A single field-level failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check applied to one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Present, not null, not blank
    Required,
    /// Well-formed email address
    Email,
    /// At least this many characters
    MinLength(usize),
    /// URL with one of these schemes
    Url { schemes: &'static [&'static str] },
    /// Hyphenated or simple UUID
    Uuid,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub check: Check,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

pub const REGISTER_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        rules: &[Rule {
            check: Check::Required,
            message: "Name is required",
        }],
    },
    FieldRules {
        field: "email",
        rules: &[Rule {
            check: Check::Email,
            message: "Please include a valid email",
        }],
    },
    FieldRules {
        field: "password",
        rules: &[Rule {
            check: Check::MinLength(6),
            message: "Please enter a password with 6 or more characters",
        }],
    },
];

pub const LOGIN_RULES: &[FieldRules] = &[
    FieldRules {
        field: "email",
        rules: &[Rule {
            check: Check::Email,
            message: "Please include a valid email",
        }],
    },
    FieldRules {
        field: "password",
        rules: &[Rule {
            check: Check::Required,
            message: "Password is required",
        }],
    },
];

pub const AFFILIATE_LINK_RULES: &[FieldRules] = &[
    FieldRules {
        field: "url",
        rules: &[Rule {
            check: Check::Url {
                schemes: &LINK_URL_SCHEMES,
            },
            message: "Please include a valid URL",
        }],
    },
    FieldRules {
        field: "platformId",
        rules: &[
            Rule {
                check: Check::Required,
                message: "Platform id is required",
            },
            Rule {
                check: Check::Uuid,
                message: "Platform id must be a valid id",
            },
        ],
    },
];

pub const PLATFORM_RULES: &[FieldRules] = &[FieldRules {
    field: "name",
    rules: &[Rule {
        check: Check::Required,
        message: "Platform name is required",
    }],
}];

/// Every checked field is a string; any other JSON type counts as absent
fn as_text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn passes(check: Check, text: Option<&str>) -> bool {
    match (check, text) {
        (Check::Required, Some(text)) => !text.trim().is_empty(),
        (Check::Email, Some(text)) => text.validate_email(),
        (Check::MinLength(min), Some(text)) => text.chars().count() >= min,
        (Check::Url { schemes }, Some(text)) => is_url_with_scheme(text, schemes),
        (Check::Uuid, Some(text)) => Uuid::parse_str(text.trim()).is_ok(),
        (Check::MinLength(0), None) => true,
        (_, None) => false,
    }
}

/// Run `rules` against `payload`, collecting one violation per failing field
pub fn validate(rules: &[FieldRules], payload: &Value) -> Result<(), Vec<Violation>> {
    let violations: Vec<Violation> = rules
        .iter()
        .filter_map(|field| {
            let text = as_text(payload.get(field.field));
            field
                .rules
                .iter()
                .find(|rule| !passes(rule.check, text))
                .map(|rule| Violation::new(field.field, rule.message))
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Request body type with a declared rule table
pub trait Validated: DeserializeOwned {
    const RULES: &'static [FieldRules];
}

/// JSON extractor that validates against `T::RULES` before deserializing
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Validated,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        if let Err(violations) = validate(T::RULES, &payload) {
            tracing::debug!(?violations, "Request validation failed");
            return Err(AppError::Validation(violations));
        }

        serde_json::from_value(payload)
            .map(ValidatedJson)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
    }
}
