use crate::storage::models::nav::SourceKind;

#[derive(Debug, Clone, PartialEq)]
pub enum TickerStatus {
    Created { records: usize },
    Updated { added: usize, enriched: usize },
    Unchanged,
    Failed { kind: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerOutcome {
    pub symbol: String,
    pub source: SourceKind,
    pub status: TickerStatus,
}

impl TickerOutcome {
    pub fn wrote_file(&self) -> bool {
        matches!(
            self.status,
            TickerStatus::Created { .. } | TickerStatus::Updated { .. }
        )
    }

    pub fn failed(&self) -> bool {
        matches!(self.status, TickerStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<TickerOutcome>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: TickerOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn files_written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.wrote_file()).count()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed()).count()
    }

    pub fn unchanged(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == TickerStatus::Unchanged)
            .count()
    }
}
