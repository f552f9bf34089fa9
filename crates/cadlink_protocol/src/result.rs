//! Responses returned to the client.

use crate::color::InvalidCode;
use crate::database::Database;
use crate::family::polymorphic_family;
use crate::geometry::Extents3d;
use cadlink_codec::{Envelope, Field, Tagged};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the message attached to a result when a query fails as a whole.
pub const UNHANDLED_PREFIX: &str = "Unhandled exception: ";

/// Outcome of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    /// Not yet decided. Never the final status of a result.
    #[default]
    Unknown,
    /// Everything succeeded.
    Success,
    /// Nothing succeeded.
    Failure,
    /// Some records failed, some succeeded.
    Warning,
}

impl Status {
    /// Classifies a batch by its success and failure counts.
    ///
    /// An empty batch is a success.
    pub fn classify(successes: u64, failures: u64) -> Status {
        match (successes, failures) {
            (_, 0) => Status::Success,
            (0, _) => Status::Failure,
            _ => Status::Warning,
        }
    }

    /// Converts to the numeric wire code.
    pub fn to_code(self) -> u8 {
        match self {
            Status::Unknown => 0,
            Status::Success => 1,
            Status::Failure => 2,
            Status::Warning => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Unknown => "unknown",
            Status::Success => "success",
            Status::Failure => "failure",
            Status::Warning => "warning",
        };
        f.write_str(name)
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.to_code()
    }
}

impl TryFrom<u8> for Status {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Status::Unknown),
            1 => Ok(Status::Success),
            2 => Ok(Status::Failure),
            3 => Ok(Status::Warning),
            _ => Err(InvalidCode::new("status", i64::from(code))),
        }
    }
}

/// Properties shared by every result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultProps {
    /// Outcome.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub status: Field<Status>,
    /// Error text, only set when the query failed as a whole.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub message: Field<String>,
}

impl ResultProps {
    /// Outcome, `Unknown` when unset.
    pub fn status(&self) -> Status {
        self.status.value_or(Status::Unknown)
    }

    /// Records an error that escaped the query.
    ///
    /// A status still `Unknown` becomes `Failure`; an aggregated status
    /// stands.
    pub fn set_unhandled(&mut self, error: impl fmt::Display) {
        self.message = Field::Value(format!("{UNHANDLED_PREFIX}{error}"));
        if self.status() == Status::Unknown {
            self.status = Field::Value(Status::Failure);
        }
    }
}

/// A result with no payload, used for ping failures and undecodable
/// requests.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlainResult {
    /// Shared result properties.
    #[serde(flatten)]
    pub result: ResultProps,
}

impl PlainResult {
    /// A successful result.
    pub fn success() -> Self {
        Self {
            result: ResultProps {
                status: Field::Value(Status::Success),
                message: Field::Absent,
            },
        }
    }

    /// A failed result carrying `error` as its message.
    pub fn unhandled(error: impl fmt::Display) -> Self {
        let mut result = Self::default();
        result.result.set_unhandled(error);
        result
    }
}

impl Tagged for PlainResult {
    const TAG: &'static str = "cadlink.result.Result";
}

/// Outcome of an insert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbInsertResult {
    /// Shared result properties.
    #[serde(flatten)]
    pub result: ResultProps,
    /// Records created.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub num_inserted: Field<u64>,
    /// Existing records updated.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub num_updated: Field<u64>,
    /// Records that failed.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub num_failure: Field<u64>,
    /// Requested bounding box.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub extents: Field<Extents3d>,
}

impl Tagged for DbInsertResult {
    const TAG: &'static str = "cadlink.result.DbInsertResult";
}

/// Outcome of a select.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSelectResult {
    /// Shared result properties.
    #[serde(flatten)]
    pub result: ResultProps,
    /// The captured snapshot.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub db: Field<Envelope<Database>>,
}

impl Tagged for DbSelectResult {
    const TAG: &'static str = "cadlink.result.DbSelectResult";
}

/// Outcome of a delete.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbDeleteResult {
    /// Shared result properties.
    #[serde(flatten)]
    pub result: ResultProps,
    /// Records erased.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub num_deleted: Field<u64>,
    /// Records that failed.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub num_failure: Field<u64>,
}

impl Tagged for DbDeleteResult {
    const TAG: &'static str = "cadlink.result.DbDeleteResult";
}

polymorphic_family! {
    /// Any response.
    pub enum QueryResult {
        PlainResult,
        DbInsertResult,
        DbSelectResult,
        DbDeleteResult,
    }
}

impl QueryResult {
    /// Shared result properties.
    pub fn props(&self) -> &ResultProps {
        match self {
            QueryResult::PlainResult(r) => &r.result,
            QueryResult::DbInsertResult(r) => &r.result,
            QueryResult::DbSelectResult(r) => &r.result,
            QueryResult::DbDeleteResult(r) => &r.result,
        }
    }

    /// Mutable shared result properties.
    pub fn props_mut(&mut self) -> &mut ResultProps {
        match self {
            QueryResult::PlainResult(r) => &mut r.result,
            QueryResult::DbInsertResult(r) => &mut r.result,
            QueryResult::DbSelectResult(r) => &mut r.result,
            QueryResult::DbDeleteResult(r) => &mut r.result,
        }
    }

    /// Outcome.
    pub fn status(&self) -> Status {
        self.props().status()
    }

    /// Error text, if the query failed as a whole.
    pub fn message(&self) -> Option<&str> {
        self.props().message.value().map(String::as_str)
    }
}
