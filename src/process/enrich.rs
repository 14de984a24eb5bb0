use serde::Serialize;
use tracing::info;

use super::validate::{COL_FILENAME, SRC_FILENAME};
use crate::classify::habitat_for;
use crate::table::Table;

/// A filename column and the column its habitat label is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitatColumn {
    pub filename: usize,
    pub label: usize,
}

/// Consolidated FILENAME → HABITAT, extracted FILENAME → HABITAT.
pub const HABITAT_COLUMNS: [HabitatColumn; 2] = [
    HabitatColumn {
        filename: COL_FILENAME,
        label: 10,
    },
    HabitatColumn {
        filename: SRC_FILENAME,
        label: 19,
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    /// Labels written into the consolidated block.
    pub consolidated: usize,
    /// Labels written into the extracted block.
    pub extracted: usize,
}

/// Label every row that has a filename, independently per column pair.
/// Blank filename cells leave their label cell untouched.
pub fn enrich_habitats(sheet: &mut Table) -> EnrichSummary {
    let mut counts = [0usize; 2];
    for row in 0..sheet.len() {
        for (i, cols) in HABITAT_COLUMNS.iter().enumerate() {
            if sheet.is_blank(row, cols.filename) {
                continue;
            }
            let habitat = habitat_for(sheet.cell(row, cols.filename));
            sheet.set(row, cols.label, habitat.as_str());
            counts[i] += 1;
        }
    }

    let summary = EnrichSummary {
        consolidated: counts[0],
        extracted: counts[1],
    };
    info!(
        consolidated = summary.consolidated,
        extracted = summary.extracted,
        "habitat labels written"
    );
    summary
}
