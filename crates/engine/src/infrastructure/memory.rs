//! In-memory branch storage.
//!
//! Backs the runner binary and the scenario tests. Aggregates are cloned in
//! and out, so a caller never holds a live reference into the store.

use async_trait::async_trait;
use booker_domain::{BranchId, BranchType, StorylineBranch};
use dashmap::DashMap;

use crate::infrastructure::ports::{BranchRepo, RepoError};

#[derive(Default)]
pub struct InMemoryBranchRepo {
    branches: DashMap<BranchId, StorylineBranch>,
}

impl InMemoryBranchRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Oldest first; id breaks ties so the order never depends on hashing.
    fn sorted(mut branches: Vec<StorylineBranch>) -> Vec<StorylineBranch> {
        branches.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        branches
    }
}

#[async_trait]
impl BranchRepo for InMemoryBranchRepo {
    async fn get(&self, id: BranchId) -> Result<Option<StorylineBranch>, RepoError> {
        Ok(self.branches.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, branch: &StorylineBranch) -> Result<(), RepoError> {
        self.branches.insert(branch.id(), branch.clone());
        Ok(())
    }

    async fn delete(&self, id: BranchId) -> Result<(), RepoError> {
        self.branches
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepoError::not_found("StorylineBranch", id))
    }

    async fn list_all(&self) -> Result<Vec<StorylineBranch>, RepoError> {
        let branches = self
            .branches
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Ok(Self::sorted(branches))
    }

    async fn list_by_type(
        &self,
        branch_type: BranchType,
    ) -> Result<Vec<StorylineBranch>, RepoError> {
        let branches = self
            .branches
            .iter()
            .filter(|entry| entry.value().branch_type() == branch_type)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(Self::sorted(branches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booker_domain::BranchName;
    use chrono::{Duration, TimeZone, Utc};

    fn branch(name: &str, branch_type: BranchType, offset_mins: i64) -> StorylineBranch {
        StorylineBranch::new(
            BranchName::new(name).unwrap(),
            branch_type,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(offset_mins),
        )
    }

    #[tokio::test]
    async fn list_all_is_oldest_first() {
        let repo = InMemoryBranchRepo::new();
        let newer = branch("Newer", BranchType::MatchOutcome, 10);
        let older = branch("Older", BranchType::MatchOutcome, 0);
        repo.save(&newer).await.unwrap();
        repo.save(&older).await.unwrap();

        let names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["Older", "Newer"]);
    }

    #[tokio::test]
    async fn list_by_type_filters() {
        let repo = InMemoryBranchRepo::new();
        repo.save(&branch("Match", BranchType::MatchOutcome, 0))
            .await
            .unwrap();
        repo.save(&branch("Title", BranchType::TitleChange, 0))
            .await
            .unwrap();

        let titles = repo.list_by_type(BranchType::TitleChange).await.unwrap();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].name().as_str(), "Title");
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let repo = InMemoryBranchRepo::new();
        let err = repo.delete(BranchId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn saved_copy_is_detached() {
        let repo = InMemoryBranchRepo::new();
        let mut original = branch("Detached", BranchType::FanReaction, 0);
        repo.save(&original).await.unwrap();
        original.set_priority(1, original.created_at());

        let stored = repo.get(original.id()).await.unwrap().unwrap();
        assert_eq!(stored.priority(), BranchType::FanReaction.default_priority());
    }
}
