use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("not enough member in {group}")]
    RanOutOfMember { group: String },
    #[error("no more group left in the priority queue")]
    RanOutOfGroup,
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
    #[error("date out of range: {0}")]
    DateOutOfRange(NaiveDate),
}

impl PoolError {
    /// Vrai pour les erreurs qu'un nouveau tirage (ordre remélangé) peut lever.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RanOutOfMember { .. } | Self::RanOutOfGroup)
    }
}

/// Bilan d'une personne en fin de run, réutilisable comme report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberTally {
    pub name: String,
    pub group: String,
    pub real_count: i64,
    pub precount: i64,
    pub removed_count: i64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTally {
    pub name: String,
    pub real_count: i64,
}
