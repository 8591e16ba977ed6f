//! Startup seed: branches and facts loaded from a JSON file.
//!
//! ```json
//! { "branches": [ ...serialized StorylineBranch... ], "facts": { "title:world": "vacant" } }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use booker_domain::{BranchId, DomainError, StorylineBranch};
use serde::{Deserialize, Serialize};

use crate::infrastructure::facts::FactBook;
use crate::infrastructure::ports::{BranchRepo, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid seeded branch {branch_id}: {source}")]
    Invalid {
        branch_id: BranchId,
        #[source]
        source: DomainError,
    },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub branches: Vec<StorylineBranch>,
    #[serde(default)]
    pub facts: BTreeMap<String, String>,
}

impl Seed {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SeedError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&raw)
    }

    /// Store every branch and record every fact. Returns (branches, facts) counts.
    ///
    /// Branches are validated up front; one bad branch rejects the whole seed
    /// and nothing is stored.
    pub async fn apply(
        self,
        repo: &dyn BranchRepo,
        facts: &FactBook,
    ) -> Result<(usize, usize), SeedError> {
        for branch in &self.branches {
            branch.validate().map_err(|source| SeedError::Invalid {
                branch_id: branch.id(),
                source,
            })?;
        }
        let counts = (self.branches.len(), self.facts.len());
        for branch in &self.branches {
            repo.save(branch).await?;
        }
        for (key, value) in self.facts {
            facts.record(key, value);
        }
        Ok(counts)
    }
}
