//! Job status enum mapping to the `job_statuses` SMALLINT lookup table.
//!
//! Each variant's discriminant matches the seed data order (1-based) in
//! `20260101000001_create_job_statuses.sql`.

use serde::{Serialize, Serializer};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Last-known lifecycle status of a job.
///
/// `Completed` and `Failed` are terminal. `Unknown` marks a job whose
/// execution the engine no longer reports.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Submitted = 1,
    Started = 2,
    Running = 3,
    Completed = 4,
    Failed = 5,
    Unknown = 6,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        Self::Submitted,
        Self::Started,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Unknown,
    ];

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Lowercase name used on the wire and in the `name` column.
    pub fn name(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Started => "started",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<JobStatus> for StatusId {
    fn from(value: JobStatus) -> Self {
        value as StatusId
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Terminal statuses, in the order they are bound in repository queries.
pub const TERMINAL_STATUSES: [StatusId; 2] = [
    JobStatus::Completed as StatusId,
    JobStatus::Failed as StatusId,
];
