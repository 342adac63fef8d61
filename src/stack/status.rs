//! Stack status classification.
//!
//! Every raw status string the provisioning backend reports maps to exactly one
//! [`StatusCode`], and every code falls into one [`Phase`]. The match in
//! [`StatusCode::phase`] is exhaustive, so a new status cannot be added without
//! deciding whether callers must wait on it.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A status value reported by the backend for an existing stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// `CREATE_IN_PROGRESS`
    CreateInProgress,
    /// `CREATE_FAILED`
    CreateFailed,
    /// `CREATE_COMPLETE`
    CreateComplete,
    /// `ROLLBACK_IN_PROGRESS`
    RollbackInProgress,
    /// `ROLLBACK_FAILED`
    RollbackFailed,
    /// `ROLLBACK_COMPLETE`
    RollbackComplete,
    /// `DELETE_IN_PROGRESS`
    DeleteInProgress,
    /// `DELETE_FAILED`
    DeleteFailed,
    /// `DELETE_COMPLETE`
    DeleteComplete,
    /// `UPDATE_IN_PROGRESS`
    UpdateInProgress,
    /// `UPDATE_COMPLETE_CLEANUP_IN_PROGRESS`
    UpdateCompleteCleanupInProgress,
    /// `UPDATE_COMPLETE`
    UpdateComplete,
    /// `UPDATE_FAILED`
    UpdateFailed,
    /// `UPDATE_ROLLBACK_IN_PROGRESS`
    UpdateRollbackInProgress,
    /// `UPDATE_ROLLBACK_FAILED`
    UpdateRollbackFailed,
    /// `UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS`
    UpdateRollbackCompleteCleanupInProgress,
    /// `UPDATE_ROLLBACK_COMPLETE`
    UpdateRollbackComplete,
    /// `REVIEW_IN_PROGRESS`
    ReviewInProgress,
    /// `IMPORT_IN_PROGRESS`
    ImportInProgress,
    /// `IMPORT_COMPLETE`
    ImportComplete,
    /// `IMPORT_ROLLBACK_IN_PROGRESS`
    ImportRollbackInProgress,
    /// `IMPORT_ROLLBACK_FAILED`
    ImportRollbackFailed,
    /// `IMPORT_ROLLBACK_COMPLETE`
    ImportRollbackComplete,
    /// A status string this crate does not know.
    Unrecognized(String),
}

/// The family of in-flight operation a transitional status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Create (including its rollback and the review phase).
    Create,
    /// Update (including its rollback and both cleanup sub-phases).
    Update,
    /// Delete.
    Delete,
    /// Resource import.
    Import,
    /// Rollback of a failed resource import.
    ImportRollback,
}

/// Whether a status is still moving or has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// An operation is in flight; the stack must not be mutated.
    Transitional(Transition),
    /// No operation is in flight.
    Terminal,
}

/// The settled status of a stack, as returned by the status resolver.
///
/// There is no transitional variant: a resolved status is either a terminal
/// code or the absence of the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackStatus {
    /// The stack does not exist.
    Absent,
    /// The stack exists and no operation is in flight.
    Terminal(StatusCode),
}

/// Known status strings, in backend order.
const STATUS_TABLE: &[(&str, StatusCode)] = &[
    ("CREATE_IN_PROGRESS", StatusCode::CreateInProgress),
    ("CREATE_FAILED", StatusCode::CreateFailed),
    ("CREATE_COMPLETE", StatusCode::CreateComplete),
    ("ROLLBACK_IN_PROGRESS", StatusCode::RollbackInProgress),
    ("ROLLBACK_FAILED", StatusCode::RollbackFailed),
    ("ROLLBACK_COMPLETE", StatusCode::RollbackComplete),
    ("DELETE_IN_PROGRESS", StatusCode::DeleteInProgress),
    ("DELETE_FAILED", StatusCode::DeleteFailed),
    ("DELETE_COMPLETE", StatusCode::DeleteComplete),
    ("UPDATE_IN_PROGRESS", StatusCode::UpdateInProgress),
    (
        "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
        StatusCode::UpdateCompleteCleanupInProgress,
    ),
    ("UPDATE_COMPLETE", StatusCode::UpdateComplete),
    ("UPDATE_FAILED", StatusCode::UpdateFailed),
    ("UPDATE_ROLLBACK_IN_PROGRESS", StatusCode::UpdateRollbackInProgress),
    ("UPDATE_ROLLBACK_FAILED", StatusCode::UpdateRollbackFailed),
    (
        "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
        StatusCode::UpdateRollbackCompleteCleanupInProgress,
    ),
    ("UPDATE_ROLLBACK_COMPLETE", StatusCode::UpdateRollbackComplete),
    ("REVIEW_IN_PROGRESS", StatusCode::ReviewInProgress),
    ("IMPORT_IN_PROGRESS", StatusCode::ImportInProgress),
    ("IMPORT_COMPLETE", StatusCode::ImportComplete),
    ("IMPORT_ROLLBACK_IN_PROGRESS", StatusCode::ImportRollbackInProgress),
    ("IMPORT_ROLLBACK_FAILED", StatusCode::ImportRollbackFailed),
    ("IMPORT_ROLLBACK_COMPLETE", StatusCode::ImportRollbackComplete),
];

impl StatusCode {
    /// Maps a raw backend status string to a code.
    ///
    /// Unknown strings are preserved as [`StatusCode::Unrecognized`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        STATUS_TABLE
            .iter()
            .find(|(name, _)| *name == raw)
            .map_or_else(|| Self::Unrecognized(raw.to_string()), |(_, code)| code.clone())
    }

    /// Returns the raw backend string for this code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unrecognized(raw) => raw,
            known => STATUS_TABLE
                .iter()
                .find(|(_, code)| code == known)
                .map_or("", |(name, _)| *name),
        }
    }

    /// Classifies the code.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::CreateInProgress | Self::RollbackInProgress | Self::ReviewInProgress => {
                Phase::Transitional(Transition::Create)
            }
            Self::DeleteInProgress => Phase::Transitional(Transition::Delete),
            Self::UpdateInProgress
            | Self::UpdateRollbackInProgress
            | Self::UpdateCompleteCleanupInProgress
            | Self::UpdateRollbackCompleteCleanupInProgress => {
                Phase::Transitional(Transition::Update)
            }
            Self::ImportInProgress => Phase::Transitional(Transition::Import),
            Self::ImportRollbackInProgress => Phase::Transitional(Transition::ImportRollback),
            Self::CreateFailed
            | Self::CreateComplete
            | Self::RollbackFailed
            | Self::RollbackComplete
            | Self::DeleteFailed
            | Self::DeleteComplete
            | Self::UpdateComplete
            | Self::UpdateFailed
            | Self::UpdateRollbackFailed
            | Self::UpdateRollbackComplete
            | Self::ImportComplete
            | Self::ImportRollbackFailed
            | Self::ImportRollbackComplete
            | Self::Unrecognized(_) => Phase::Terminal,
        }
    }

    /// Returns true if an operation is in flight.
    #[must_use]
    pub const fn is_transitional(&self) -> bool {
        matches!(self.phase(), Phase::Transitional(_))
    }
}

impl FromStr for StatusCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_raw(s))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Import => write!(f, "import"),
            Self::ImportRollback => write!(f, "import rollback"),
        }
    }
}

impl StackStatus {
    /// Returns true if the stack does not exist.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the terminal code, if the stack exists.
    #[must_use]
    pub const fn code(&self) -> Option<&StatusCode> {
        match self {
            Self::Absent => None,
            Self::Terminal(code) => Some(code),
        }
    }

    /// Returns the raw status string, empty when absent.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.code().map_or("", StatusCode::as_str)
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Terminal(code) => write!(f, "{code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_round_trips_every_known_status() {
        for (name, code) in STATUS_TABLE {
            assert_eq!(&StatusCode::from_raw(name), code);
            assert_eq!(code.as_str(), *name);
        }
    }

    #[test]
    fn test_in_progress_statuses_are_transitional() {
        let expected = [
            ("CREATE_IN_PROGRESS", Transition::Create),
            ("ROLLBACK_IN_PROGRESS", Transition::Create),
            ("REVIEW_IN_PROGRESS", Transition::Create),
            ("DELETE_IN_PROGRESS", Transition::Delete),
            ("UPDATE_IN_PROGRESS", Transition::Update),
            ("UPDATE_ROLLBACK_IN_PROGRESS", Transition::Update),
            ("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS", Transition::Update),
            ("UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS", Transition::Update),
            ("IMPORT_IN_PROGRESS", Transition::Import),
            ("IMPORT_ROLLBACK_IN_PROGRESS", Transition::ImportRollback),
        ];

        for (raw, transition) in expected {
            assert_eq!(
                StatusCode::from_raw(raw).phase(),
                Phase::Transitional(transition),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_everything_else_is_terminal() {
        let transitional = STATUS_TABLE
            .iter()
            .filter(|(_, code)| code.is_transitional())
            .count();
        assert_eq!(transitional, 10);

        assert_eq!(StatusCode::from_raw("UPDATE_COMPLETE").phase(), Phase::Terminal);
        assert_eq!(StatusCode::from_raw("ROLLBACK_COMPLETE").phase(), Phase::Terminal);
    }

    #[test]
    fn test_unrecognized_status_is_kept_verbatim() {
        let code: StatusCode = "SOMETHING_NEW".parse().expect("infallible");
        assert_eq!(code, StatusCode::Unrecognized(String::from("SOMETHING_NEW")));
        assert_eq!(code.to_string(), "SOMETHING_NEW");
        assert_eq!(code.phase(), Phase::Terminal);
    }

    #[test]
    fn test_stack_status_display() {
        assert_eq!(StackStatus::Absent.to_string(), "absent");
        assert_eq!(StackStatus::Absent.as_str(), "");

        let status = StackStatus::Terminal(StatusCode::UpdateComplete);
        assert_eq!(status.to_string(), "UPDATE_COMPLETE");
        assert!(!status.is_absent());
    }
}
