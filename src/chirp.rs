//! Chirp validation and redaction.
//!
//! A chirp is accepted when it is at most [`MAX_CHIRP_LEN`] characters long.
//! Accepted chirps come back with every forbidden word replaced by [`MASK`].
//!
//! Redaction works on tokens split by the space character only. Punctuation
//! stays attached to its word, so `kerfuffle!` is not a match for
//! `kerfuffle`. Runs of spaces yield empty tokens, which are kept so the
//! original spacing survives.
//!
//! Submissions are decoded leniently: only the first JSON value counts, a
//! top-level `null`, a missing `body` or a `null` body mean an empty chirp,
//! and the `body` key matches case-insensitively. A value of the wrong JSON
//! type is malformed.

use std::collections::HashSet;
use std::sync::Arc;

use serde::de::Error as _;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::handler::Handler;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::status::Status;

/// Longest accepted chirp, in Unicode scalar values.
pub const MAX_CHIRP_LEN: usize = 140;

/// What a forbidden word is replaced with.
pub const MASK: &str = "****";

pub const DEFAULT_FORBIDDEN_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

/// `POST /api/validate_chirp` request body.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChirpSubmission {
    pub body: String,
}

impl ChirpSubmission {
    /// Decodes the first JSON value in `payload`; anything after it is
    /// ignored.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let value = serde_json::Deserializer::from_slice(payload)
            .into_iter::<Value>()
            .next()
            .unwrap_or_else(|| Err(serde_json::Error::custom("empty payload")))?;

        let fields = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(fields) => fields,
            other => {
                return Err(serde_json::Error::custom(format!(
                    "expected an object, found {other}"
                )));
            }
        };

        let body = fields.get("body").or_else(|| {
            fields.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("body"))
                .map(|(_, value)| value)
        });
        match body {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::String(body)) => Ok(Self { body: body.clone() }),
            Some(other) => Err(serde_json::Error::custom(format!(
                "expected a string body, found {other}"
            ))),
        }
    }
}

/// Successful validation result.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct CleanedChirp {
    pub cleaned_body: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChirpError {
    #[error("Chirp is too long")]
    TooLong,

    /// The payload did not decode into a [`ChirpSubmission`].
    #[error("Something went wrong")]
    Malformed,
}

impl ChirpError {
    pub fn status(&self) -> Status {
        match self {
            Self::TooLong   => Status::BadRequest,
            Self::Malformed => Status::InternalServerError,
        }
    }
}

impl IntoResponse for ChirpError {
    fn into_response(self) -> Response {
        Json(ErrorBody { error: self.to_string() }).with_status(self.status())
    }
}

/// Case-insensitive whole-token redaction.
#[derive(Clone, Debug)]
pub struct WordFilter {
    forbidden: HashSet<String>,
}

impl WordFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let forbidden = words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        Self { forbidden }
    }

    /// Replaces every forbidden token in `text` with [`MASK`].
    pub fn clean(&self, text: &str) -> String {
        text.split(' ')
            .map(|token| {
                if self.forbidden.contains(&token.to_lowercase()) {
                    MASK
                } else {
                    token
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for WordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_FORBIDDEN_WORDS)
    }
}

/// Checks the length of `body`, then redacts it.
pub fn validate(body: &str, filter: &WordFilter) -> Result<CleanedChirp, ChirpError> {
    if body.chars().count() > MAX_CHIRP_LEN {
        return Err(ChirpError::TooLong);
    }
    Ok(CleanedChirp { cleaned_body: filter.clean(body) })
}

/// `POST /api/validate_chirp`.
pub fn handler(filter: Arc<WordFilter>) -> impl Handler {
    move |req: Request| {
        let result = ChirpSubmission::from_slice(req.body())
            .map_err(|e| {
                debug!("undecodable chirp: {e}");
                ChirpError::Malformed
            })
            .and_then(|chirp| validate(&chirp.body, &filter));

        async move {
            match result {
                Ok(cleaned) => Json(cleaned).into_response(),
                Err(e) => e.into_response(),
            }
        }
    }
}
