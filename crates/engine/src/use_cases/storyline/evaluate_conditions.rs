//! Evaluate due conditions use case.
//!
//! Asks the external evaluator about every condition the scheduler reports as
//! due, in scheduler order, and records each answer on the owning branch.
//! An evaluator failure still stamps the check time so a broken evaluator is
//! not hammered every tick.

use std::sync::Arc;

use booker_domain::{
    due_conditions, BranchId, ConditionChange, ConditionId, ConditionType, StorylineBranch,
};
use chrono::{DateTime, Utc};

use crate::infrastructure::ports::{ConditionEvaluator, EvaluationError};

/// A condition whose evaluation failed this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionWarning {
    pub branch_id: BranchId,
    pub condition_id: ConditionId,
    pub condition_type: ConditionType,
    pub error: EvaluationError,
}

impl std::fmt::Display for ConditionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} on branch {}: {}",
            self.condition_type, self.branch_id, self.error
        )
    }
}

/// Summary of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionCheckReport {
    /// Evaluation attempts, failed ones included
    pub checked: usize,
    pub newly_met: Vec<(BranchId, ConditionId)>,
    pub warnings: Vec<ConditionWarning>,
    /// Branches with changed bookkeeping, in first-touch order
    pub touched: Vec<BranchId>,
}

impl ConditionCheckReport {
    fn touch(&mut self, branch_id: BranchId) {
        if !self.touched.contains(&branch_id) {
            self.touched.push(branch_id);
        }
    }
}

pub struct EvaluateConditions {
    evaluator: Arc<dyn ConditionEvaluator>,
}

impl EvaluateConditions {
    pub fn new(evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Evaluate every due condition across `branches` and record the answers.
    ///
    /// Never fails as a whole; per-condition failures land in `warnings`.
    #[tracing::instrument(skip(self, branches), fields(branches = branches.len()))]
    pub async fn execute(
        &self,
        branches: &mut [StorylineBranch],
        now: DateTime<Utc>,
    ) -> ConditionCheckReport {
        let mut report = ConditionCheckReport::default();

        for due in due_conditions(branches, now) {
            let Some(branch) = branches.iter_mut().find(|b| b.id() == due.branch_id) else {
                continue;
            };
            let Some((key, value)) = branch
                .condition(due.condition_id)
                .map(|c| (c.key().to_string(), c.value().to_string()))
            else {
                continue;
            };

            let answer = self
                .evaluator
                .evaluate(&due.condition_type, &key, &value)
                .await;
            report.checked += 1;
            report.touch(due.branch_id);

            match answer {
                Ok(met) => match branch.record_condition_check(due.condition_id, met, now) {
                    Ok(ConditionChange::BecameMet) => {
                        tracing::debug!(
                            branch_id = %due.branch_id,
                            condition_type = %due.condition_type,
                            "Condition met"
                        );
                        report.newly_met.push((due.branch_id, due.condition_id));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, branch_id = %due.branch_id, "Could not record condition check");
                    }
                },
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        branch_id = %due.branch_id,
                        condition_type = %due.condition_type,
                        key = %key,
                        "Condition evaluation failed"
                    );
                    if let Err(e) = branch.record_condition_failure(due.condition_id, now) {
                        tracing::warn!(error = %e, branch_id = %due.branch_id, "Could not record failed check");
                    }
                    report.warnings.push(ConditionWarning {
                        branch_id: due.branch_id,
                        condition_id: due.condition_id,
                        condition_type: due.condition_type,
                        error,
                    });
                }
            }
        }

        tracing::debug!(
            checked = report.checked,
            newly_met = report.newly_met.len(),
            warnings = report.warnings.len(),
            "Condition evaluation pass finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockConditionEvaluator;
    use booker_domain::{BranchCondition, BranchName, BranchStatus, BranchType};
    use chrono::{Duration, TimeZone};
    use mockall::Sequence;

    fn fixed_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn condition(kind: &str, key: &str) -> BranchCondition {
        BranchCondition::new(ConditionType::new(kind).unwrap(), key, "yes", fixed_time())
    }

    fn branch(conditions: Vec<BranchCondition>) -> StorylineBranch {
        conditions.into_iter().fold(
            StorylineBranch::new(
                BranchName::new("Evaluated").unwrap(),
                BranchType::MatchOutcome,
                fixed_time(),
            ),
            StorylineBranch::with_condition,
        )
    }

    #[tokio::test]
    async fn records_answers_and_flips_status() {
        let mut evaluator = MockConditionEvaluator::new();
        evaluator.expect_evaluate().times(2).returning(|_, _, _| Ok(true));

        let mut branches = vec![branch(vec![
            condition("WRESTLER_WINS", "a"),
            condition("HEAT_THRESHOLD", "b"),
        ])];
        assert_eq!(branches[0].status(), BranchStatus::WaitingForConditions);

        let use_case = EvaluateConditions::new(Arc::new(evaluator));
        let report = use_case.execute(&mut branches, fixed_time()).await;

        assert_eq!(report.checked, 2);
        assert_eq!(report.newly_met.len(), 2);
        assert_eq!(report.touched, vec![branches[0].id()]);
        assert!(report.warnings.is_empty());
        assert_eq!(branches[0].status(), BranchStatus::ReadyToActivate);
    }

    #[tokio::test]
    async fn asks_in_check_priority_order() {
        let mut evaluator = MockConditionEvaluator::new();
        let mut seq = Sequence::new();
        for expected in ["WRESTLER_WINS", "HEAT_THRESHOLD", "DAYS_PASSED"] {
            evaluator
                .expect_evaluate()
                .withf(move |t, _, _| t.as_str() == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _, _| Ok(false));
        }

        let mut branches = vec![branch(vec![
            condition("DAYS_PASSED", "c"),
            condition("HEAT_THRESHOLD", "b"),
            condition("WRESTLER_WINS", "a"),
        ])];

        let use_case = EvaluateConditions::new(Arc::new(evaluator));
        let report = use_case.execute(&mut branches, fixed_time()).await;
        assert_eq!(report.checked, 3);
        assert!(report.newly_met.is_empty());
    }

    #[tokio::test]
    async fn failure_stamps_check_time_and_continues() {
        let mut evaluator = MockConditionEvaluator::new();
        evaluator
            .expect_evaluate()
            .withf(|_, k, _| k == "broken")
            .returning(|_, _, _| Err(EvaluationError::failed("stats service down")));
        evaluator
            .expect_evaluate()
            .withf(|_, k, _| k == "fine")
            .returning(|_, _, _| Ok(true));

        let mut branches = vec![branch(vec![
            condition("WRESTLER_WINS", "broken"),
            condition("WRESTLER_LOSES", "fine"),
        ])];

        let use_case = EvaluateConditions::new(Arc::new(evaluator));
        let report = use_case.execute(&mut branches, fixed_time()).await;

        assert_eq!(report.checked, 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.newly_met.len(), 1);

        let broken = &branches[0].conditions()[0];
        assert!(!broken.is_met());
        assert_eq!(broken.last_checked_at(), Some(fixed_time()));
    }

    #[tokio::test]
    async fn not_due_conditions_are_left_alone() {
        let mut evaluator = MockConditionEvaluator::new();
        evaluator.expect_evaluate().never();

        let mut checked = condition("WRESTLER_WINS", "a");
        checked.record_check(false, fixed_time());
        let mut branches = vec![branch(vec![checked])];

        let use_case = EvaluateConditions::new(Arc::new(evaluator));
        let report = use_case
            .execute(&mut branches, fixed_time() + Duration::minutes(30))
            .await;

        assert_eq!(report, ConditionCheckReport::default());
    }
}
