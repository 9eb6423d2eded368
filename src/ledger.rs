//! Progress ledger
//!
//! Set of earned badge ids in the order they were earned. Membership only
//! grows; awarding an already-earned badge is a no-op.

use crate::catalog;
use crate::models::Badge;
use std::collections::HashSet;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ProgressLedger {
    order: Vec<String>,
    earned: HashSet<String>,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the badge was newly earned
    pub fn award(&mut self, badge_id: &str) -> bool {
        if !self.earned.insert(badge_id.to_string()) {
            return false;
        }
        self.order.push(badge_id.to_string());
        info!(badge = badge_id, total = self.order.len(), "badge earned");
        true
    }

    pub fn has(&self, badge_id: &str) -> bool {
        self.earned.contains(badge_id)
    }

    /// Earned ids in insertion order
    pub fn earned(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Catalog entries for earned ids; ids missing from the catalog are skipped
    pub fn earned_badges(&self) -> Vec<&'static Badge> {
        self.order.iter().filter_map(|id| catalog::badge(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_is_idempotent() {
        let mut ledger = ProgressLedger::new();
        assert!(ledger.award("quiz_whiz"));
        assert!(!ledger.award("quiz_whiz"));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has("quiz_whiz"));
    }

    #[test]
    fn test_insertion_order_and_monotonic_growth() {
        let mut ledger = ProgressLedger::new();
        let ids = ["tax_savvy", "budget_master", "loan_savvy", "budget_master"];
        let mut sizes = Vec::new();
        for id in ids {
            ledger.award(id);
            sizes.push(ledger.len());
        }
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ledger.earned(), ["tax_savvy", "budget_master", "loan_savvy"]);
    }

    #[test]
    fn test_unknown_ids_kept_but_not_displayed() {
        let mut ledger = ProgressLedger::new();
        ledger.award("made_up_badge");
        ledger.award("saving_pro");
        assert!(ledger.has("made_up_badge"));
        let shown: Vec<_> = ledger.earned_badges().iter().map(|b| b.id).collect();
        assert_eq!(shown, vec!["saving_pro"]);
    }
}
