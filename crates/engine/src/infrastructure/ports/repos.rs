//! Repository port traits for branch storage.

use async_trait::async_trait;
use booker_domain::{BranchId, BranchType, StorylineBranch};

use super::error::RepoError;

// =============================================================================
// Storyline Branch Storage
// =============================================================================

/// Load/save of whole branch aggregates, conditions and effects included.
///
/// Saves are atomic per aggregate. Listing order must be stable across calls
/// (oldest branch first) so that tick ordering stays deterministic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BranchRepo: Send + Sync {
    async fn get(&self, id: BranchId) -> Result<Option<StorylineBranch>, RepoError>;
    async fn save(&self, branch: &StorylineBranch) -> Result<(), RepoError>;
    async fn delete(&self, id: BranchId) -> Result<(), RepoError>;
    async fn list_all(&self) -> Result<Vec<StorylineBranch>, RepoError>;
    async fn list_by_type(&self, branch_type: BranchType)
        -> Result<Vec<StorylineBranch>, RepoError>;
}
