//! Wire-level resource models for the assignment server and work server APIs.
//!
//! Every type here round-trips losslessly through its JSON representation.
//! Enums serialize to their symbolic names, never ordinals, and unknown wire
//! values are rejected during deserialization rather than defaulted.

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref CORE_ID_RE: Regex = Regex::new(r"^0x[0-9a-fA-F]+$").unwrap();
}

/// Work unit compression applied by the work server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompressionType {
    None,
    Bzip2,
    #[default]
    Zlib,
    Gzip,
    Lz4,
}

impl std::fmt::Display for CompressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionType::None => write!(f, "NONE"),
            CompressionType::Bzip2 => write!(f, "BZIP2"),
            CompressionType::Zlib => write!(f, "ZLIB"),
            CompressionType::Gzip => write!(f, "GZIP"),
            CompressionType::Lz4 => write!(f, "LZ4"),
        }
    }
}

impl std::str::FromStr for CompressionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NONE" => Ok(CompressionType::None),
            "BZIP2" => Ok(CompressionType::Bzip2),
            "ZLIB" => Ok(CompressionType::Zlib),
            "GZIP" => Ok(CompressionType::Gzip),
            "LZ4" => Ok(CompressionType::Lz4),
            _ => Err(format!("Invalid compression type: {}", s)),
        }
    }
}

/// State of a job as reported by the work server.
///
/// The client never computes transitions; it only reads what the server
/// reports. A job starts in NEW/READY after a create action, moves through
/// ASSIGNED and PROCESSING, and ends in FINISHED, FAILED, or STOPPED. HELD
/// jobs stay held until the server releases them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    New,
    Ready,
    Assigned,
    Finished,
    Failed,
    Stopped,
    Held,
    Processing,
}

impl JobState {
    /// Whether the server will make no further transitions for this job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Finished | JobState::Failed | JobState::Stopped
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::New => write!(f, "NEW"),
            JobState::Ready => write!(f, "READY"),
            JobState::Assigned => write!(f, "ASSIGNED"),
            JobState::Finished => write!(f, "FINISHED"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Stopped => write!(f, "STOPPED"),
            JobState::Held => write!(f, "HELD"),
            JobState::Processing => write!(f, "PROCESSING"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NEW" => Ok(JobState::New),
            "READY" => Ok(JobState::Ready),
            "ASSIGNED" => Ok(JobState::Assigned),
            "FINISHED" => Ok(JobState::Finished),
            "FAILED" => Ok(JobState::Failed),
            "STOPPED" => Ok(JobState::Stopped),
            "HELD" => Ok(JobState::Held),
            "PROCESSING" => Ok(JobState::Processing),
            _ => Err(format!("Invalid job state: {}", s)),
        }
    }
}

fn default_gens() -> u32 {
    1
}

fn default_timeout() -> f64 {
    86400.0
}

fn default_deadline() -> f64 {
    172800.0
}

/// Configuration record for a project on the work server.
///
/// The `runs` count doubles as the allocator for the next unused run id:
/// the server-side record is authoritative and must equal the number of RUN
/// subtrees created under the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProjectData {
    /// Core identifier as a hex string, e.g. "0x23".
    #[validate(regex(path = "CORE_ID_RE", message = "must be a hex identifier like 0x23"))]
    pub core_id: String,
    /// Email of the person responsible for the project.
    #[validate(email(message = "must be a valid email address"))]
    pub contact: String,
    /// Number of runs; also the next unused run id.
    #[serde(default)]
    pub runs: u32,
    /// Number of clones per run.
    #[serde(default)]
    pub clones: u32,
    /// Maximum number of generations per job.
    #[serde(default = "default_gens")]
    pub gens: u32,
    /// Approximate number of atoms in the simulations.
    pub atoms: u64,
    /// Base credit awarded for a work unit.
    pub credit: u64,
    /// Seconds before a work unit can be reassigned.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    /// Seconds in which a work unit can be returned for credit.
    #[serde(default = "default_deadline")]
    pub deadline: f64,
    /// Work unit compression.
    #[serde(default)]
    pub compression: CompressionType,
}

impl ProjectData {
    /// Build a record from the required fields, applying server defaults
    /// for the rest.
    pub fn new(core_id: &str, contact: &str, atoms: u64, credit: u64) -> Self {
        ProjectData {
            core_id: core_id.to_string(),
            contact: contact.to_string(),
            runs: 0,
            clones: 0,
            gens: default_gens(),
            atoms,
            credit,
            timeout: default_timeout(),
            deadline: default_deadline(),
            compression: CompressionType::default(),
        }
    }
}

/// State snapshot for one clone, reported by the work server.
///
/// The trailing fields are absent until the job has been assigned at least
/// once; absence deserializes to `None`, never a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobData {
    /// ID of the work server that executed this job.
    pub server: i64,
    /// ID of the core that executed this job.
    pub core: u32,
    pub project: u32,
    pub run: u32,
    pub clone: u32,
    /// Latest generation produced for this job.
    pub gen: u32,
    pub state: JobState,
    /// Last time the job state changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<DateTime<Utc>>,
    /// Number of times the job has been retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Number of times the job has been assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
}

/// A batch of job updates plus the server timestamp to use for the next poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResults {
    pub jobs: Vec<JobData>,
    /// Timestamp for these results.
    pub ts: DateTime<Utc>,
}

/// One file in a project, run, clone, or generation directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    /// Path relative to the owning directory.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// File modification time.
    pub modified: DateTime<Utc>,
}

/// Work server record held by the assignment server, keyed by the WS IP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ASWorkServerData {
    /// Maximum assigns/sec allowed for this work server.
    pub max_assign_rate: f64,
    /// Scheduling weight of this work server.
    pub weight: f64,
    /// Constraints string as defined in the AS online help.
    pub constraints: String,
}

/// Project record held by the assignment server for one work server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ASProjectData {
    /// IP address of the owning work server. Reported on reads; omitted on
    /// writes, where the endpoint path carries the identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws: Option<Ipv4Addr>,
    /// Scheduling weight of the project.
    pub weight: f64,
    /// Constraints string as defined in the AS online help.
    pub constraints: String,
}

/// Action verbs accepted by the job endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    Create,
}

/// Request body for a job action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobActionRequest {
    pub action: JobAction,
}
