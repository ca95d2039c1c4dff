//! Demand curation: how a job position is sourced, derived from the owning
//! client's growth tier and the position's exclusivity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Client;
use crate::service::ServiceError;
use crate::store::{Record, Repository};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unrecognized {kind} '{value}'")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

/// Whether a position is committed to us or shared openly with other vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Exclusivity {
    Committed,
    NonCommitted,
}

impl Exclusivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exclusivity::Committed => "committed",
            Exclusivity::NonCommitted => "non_committed",
        }
    }
}

impl FromStr for Exclusivity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "committed" => Ok(Exclusivity::Committed),
            "non_committed" | "non-committed" | "noncommitted" => Ok(Exclusivity::NonCommitted),
            _ => Err(ParseError {
                kind: "exclusivity",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Exclusivity {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Exclusivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum DemandCuration {
    Strategic,
    Committed,
    Open,
}

impl DemandCuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandCuration::Strategic => "strategic",
            DemandCuration::Committed => "committed",
            DemandCuration::Open => "open",
        }
    }
}

impl FromStr for DemandCuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strategic" => Ok(DemandCuration::Strategic),
            "committed" => Ok(DemandCuration::Committed),
            "open" => Ok(DemandCuration::Open),
            _ => Err(ParseError {
                kind: "demand curation",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DemandCuration {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DemandCuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total decision table. A new exclusivity tier must add its own arms here.
pub fn classify(client_high_growth: bool, exclusivity: Exclusivity) -> DemandCuration {
    match (client_high_growth, exclusivity) {
        (true, Exclusivity::Committed) => DemandCuration::Strategic,
        (false, Exclusivity::Committed) => DemandCuration::Committed,
        (false, Exclusivity::NonCommitted) => DemandCuration::Open,
        (true, Exclusivity::NonCommitted) => DemandCuration::Open,
    }
}

/// Look up the client and classify. Reads only; a missing client is
/// `NotFound`, never a silent default.
pub async fn curate<R: Repository>(
    repo: &R,
    client_id: i32,
    exclusivity: Exclusivity,
) -> Result<DemandCuration, ServiceError> {
    let client = repo
        .find_for_share::<Client>(client_id)
        .await?
        .ok_or(ServiceError::NotFound {
            entity: Client::TABLE.label(),
            id: client_id,
        })?;

    let curation = classify(client.high_growth, exclusivity);
    debug!(
        client_id,
        high_growth = client.high_growth,
        %exclusivity,
        %curation,
        "classified demand"
    );
    Ok(curation)
}
