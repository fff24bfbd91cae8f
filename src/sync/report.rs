use serde::Serialize;

use crate::taxonomy::TaxonomyIndex;

/// Terminal state of one catalog item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// A game with this title was already stored.
    Skipped { existing_id: i64 },
    /// Same title appeared earlier in this listing.
    DuplicateInBatch,
    Created { id: i64 },
    /// Stored, but some references, descriptions or images are missing.
    CreatedDegraded { id: i64, issues: Vec<String> },
    /// No record was stored for this item.
    Failed { reason: String },
}

/// Per-run tally. `created` includes degraded creations; `degraded` is that subset.
/// `skipped` counts titles already stored; repeats within the listing go to `duplicates`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub created: usize,
    pub degraded: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub taxonomy_created: usize,
    pub taxonomy_existing: usize,
    pub taxonomy_failed: usize,
    pub items: Vec<(String, ItemOutcome)>,
}

impl SyncReport {
    pub fn new(fetched: usize) -> Self {
        Self {
            fetched,
            ..Default::default()
        }
    }

    pub fn record_taxonomy(&mut self, index: &TaxonomyIndex) {
        self.taxonomy_created = index.created;
        self.taxonomy_existing = index.existing;
        self.taxonomy_failed = index.failed;
    }

    pub fn record(&mut self, title: &str, outcome: ItemOutcome) {
        match &outcome {
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::DuplicateInBatch => self.duplicates += 1,
            ItemOutcome::Created { .. } => self.created += 1,
            ItemOutcome::CreatedDegraded { .. } => {
                self.created += 1;
                self.degraded += 1;
            }
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
        self.items.push((title.to_string(), outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_follow_outcomes() {
        let mut report = SyncReport::new(5);
        report.record("a", ItemOutcome::Created { id: 1 });
        report.record(
            "b",
            ItemOutcome::CreatedDegraded {
                id: 2,
                issues: vec!["no cover".into()],
            },
        );
        report.record("c", ItemOutcome::Skipped { existing_id: 9 });
        report.record("c", ItemOutcome::DuplicateInBatch);
        report.record("d", ItemOutcome::Failed { reason: "x".into() });

        assert_eq!(report.created, 2);
        assert_eq!(report.degraded, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.items.len(), 5);
    }

    #[test]
    fn outcomes_serialize_with_tag() {
        let json = serde_json::to_value(ItemOutcome::Skipped { existing_id: 4 }).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["existing_id"], 4);
    }
}
