use std::time::Duration;

use owo_colors::{OwoColorize, Style};
use tabled::{Table, Tabled};

use crate::services::summary::{RunSummary, TickerOutcome, TickerStatus};

#[derive(Debug, Tabled, Clone, PartialEq)]
struct StringifiedOutcome {
    ticker: String,
    source: String,
    result: String,
    details: String,
}

impl From<&TickerOutcome> for StringifiedOutcome {
    fn from(outcome: &TickerOutcome) -> Self {
        let (result, details) = match &outcome.status {
            TickerStatus::Created { records } => ("created", format!("{} records", records)),
            TickerStatus::Updated { added, enriched } => (
                "updated",
                format!("{} added, {} enriched", added, enriched),
            ),
            TickerStatus::Unchanged => ("unchanged", String::new()),
            TickerStatus::Failed { kind, reason } => ("failed", format!("{}: {}", kind, reason)),
        };
        StringifiedOutcome {
            ticker: outcome.symbol.clone(),
            source: outcome.source.to_string(),
            result: result.to_string(),
            details,
        }
    }
}

pub fn print_summary(summary: &RunSummary, elapsed: Duration) {
    let rows: Vec<StringifiedOutcome> = summary.outcomes.iter().map(Into::into).collect();
    let table = Table::new(&rows).to_string();

    println!("\n");
    println!("{}", table);
    println!("====");
    let totals_style = Style::new().black().on_white().bold();
    println!(
        "Files rewritten: {}",
        summary.files_written().style(totals_style)
    );
    println!(
        "Unchanged: {}, failed: {}, took {:.1}s",
        summary.unchanged(),
        summary.failures().red(),
        elapsed.as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::nav::SourceKind;

    #[test]
    fn outcomes_render_as_table_rows() {
        let failed = TickerOutcome {
            symbol: "JEPI".to_string(),
            source: SourceKind::Jpmorgan,
            status: TickerStatus::Failed {
                kind: "parse",
                reason: "no table".to_string(),
            },
        };
        assert_eq!(
            StringifiedOutcome::from(&failed),
            StringifiedOutcome {
                ticker: "JEPI".to_string(),
                source: "jpmorgan".to_string(),
                result: "failed".to_string(),
                details: "parse: no table".to_string(),
            }
        );

        let updated = TickerOutcome {
            symbol: "XDTE".to_string(),
            source: SourceKind::Yahoo,
            status: TickerStatus::Updated {
                added: 1,
                enriched: 2,
            },
        };
        let table = Table::new([StringifiedOutcome::from(&updated)]).to_string();
        assert!(table.contains("1 added, 2 enriched"));
    }
}
