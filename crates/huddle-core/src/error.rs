use std::fmt;
use thiserror::Error;

/// Machine-readable error codes surfaced to orchestrating callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CardNotFound,
    SprintNotFound,
    ProjectNotFound,
    SnapNotFound,
    LockNotFound,
    SummaryNotFound,
    EffortRequired,
    SprintNotActive,
    SprintClosed,
    DateOutsideSprint,
    AlreadyLocked,
    DayLocked,
    SnapLocked,
    SnapNotToday,
    SlotInvalid,
    NotAuthor,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CardNotFound => "E1001",
            Self::SprintNotFound => "E1002",
            Self::ProjectNotFound => "E1003",
            Self::SnapNotFound => "E1004",
            Self::LockNotFound => "E1005",
            Self::SummaryNotFound => "E1006",
            Self::EffortRequired => "E2001",
            Self::SprintNotActive => "E2002",
            Self::SprintClosed => "E2003",
            Self::DateOutsideSprint => "E2004",
            Self::AlreadyLocked => "E2005",
            Self::DayLocked => "E2006",
            Self::SnapLocked => "E2007",
            Self::SnapNotToday => "E2008",
            Self::SlotInvalid => "E2009",
            Self::NotAuthor => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CardNotFound => "Card not found",
            Self::SprintNotFound => "Sprint not found",
            Self::ProjectNotFound => "Project not found",
            Self::SnapNotFound => "Snap not found",
            Self::LockNotFound => "Lock not found",
            Self::SummaryNotFound => "Daily summary not found",
            Self::EffortRequired => "Card has no estimated effort",
            Self::SprintNotActive => "Sprint is not active",
            Self::SprintClosed => "Sprint is closed",
            Self::DateOutsideSprint => "Date is outside the sprint window",
            Self::AlreadyLocked => "Standup is already locked",
            Self::DayLocked => "The day is locked",
            Self::SnapLocked => "Snap is locked",
            Self::SnapNotToday => "Only today's snaps are mutable",
            Self::SlotInvalid => "Invalid standup slot",
            Self::NotAuthor => "Caller is not the snap author",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::EffortRequired => {
                Some("Set a positive estimated-hours value on the card before snapping.")
            }
            Self::SprintNotActive => Some("Activate the sprint before recording snaps."),
            Self::DateOutsideSprint => {
                Some("Snaps and locks only apply to dates inside [start, end].")
            }
            Self::AlreadyLocked | Self::DayLocked => {
                Some("Locks are exactly-once; use the administrative unlock to reverse one.")
            }
            Self::SnapLocked => Some("Locked snaps are immutable."),
            Self::SnapNotToday => Some("Past days can no longer be edited."),
            Self::SlotInvalid => Some("Slots are 1-based and bounded by standups_per_day."),
            Self::NotAuthor => Some("Only the original author may edit or delete a snap."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the snapshot service and its collaborators.
///
/// `NotFound`, `Validation`, and `Forbidden` are structured, user-visible,
/// and non-retryable. Classifier degradation never appears here; it is
/// recovered inside the snap-creation path with the fallback parser.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{code}: {message}")]
    NotFound { code: ErrorCode, message: String },

    #[error("{code}: {message}")]
    Validation { code: ErrorCode, message: String },

    #[error("{code}: {message}")]
    Forbidden { code: ErrorCode, message: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("E9001: {message}")]
    Internal { message: String },
}

impl CoreError {
    #[must_use]
    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Machine code associated with this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { code, .. }
            | Self::Validation { code, .. }
            | Self::Forbidden { code, .. } => *code,
            Self::Storage(_) | Self::Internal { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
