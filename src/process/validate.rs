// src/process/validate.rs
//! Consolidate duplicate annotations of the same image into one row.
//!
//! Works on the combined sheet: columns 0..=10 hold the consolidated block
//! this stage writes, columns 11..=19 the extracted rows it reads.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use tracing::{debug, info};

use super::extract::EXTRACTED_HEADERS;
use super::progress::{GroupProgress, ProgressSink};
use crate::classify::extract_season;
use crate::error::PipelineError;
use crate::parse::NODATA;
use crate::table::Table;

pub const CONSOLIDATED_HEADERS: [&str; 11] = [
    "VALIDATION",
    "SEASON",
    "FILENAME",
    "SPECIES 1",
    "HOW MANY OF SPECIES 1",
    "SPECIES 2",
    "HOW MANY OF SPECIES 2",
    "TIME OF DAY",
    "TEMPERATURE",
    "MONTH",
    "HABITAT",
];

/// Width of the consolidated block.
pub const CONSOLIDATED_WIDTH: usize = CONSOLIDATED_HEADERS.len();
/// Minimum width of a sheet the aggregator accepts.
pub const SHEET_WIDTH: usize = CONSOLIDATED_WIDTH + EXTRACTED_HEADERS.len();

pub const COL_VALIDATION: usize = 0;
pub const COL_SEASON: usize = 1;
pub const COL_FILENAME: usize = 2;
/// First of the eight copied annotation fields in the consolidated block.
pub const COL_FIELDS: usize = 3;

/// Grouping key in the extracted block.
pub const SRC_FILENAME: usize = 11;
/// Fields that must agree across duplicates: both species and counts.
const SRC_CORE: RangeInclusive<usize> = 12..=15;
/// First of the eight annotation fields in the extracted block.
const SRC_FIELDS: usize = 12;
/// TIME OF DAY, the context field carrying the `NODATA` sentinel.
const SRC_CONTEXT: usize = 16;
/// Offset of TIME OF DAY within the eight annotation fields.
const CONTEXT_FIELD: usize = SRC_CONTEXT - SRC_FIELDS;
/// TIME OF DAY, TEMPERATURE, MONTH.
const CONTEXT_FIELDS: usize = 3;

/// One consolidated output row per distinct filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedRow {
    pub validation: bool,
    pub season: String,
    pub filename: String,
    /// Species 1, count 1, species 2, count 2, time of day, temperature,
    /// month, habitat. `None` cells are left untouched on the sheet.
    pub fields: [Option<String>; 8],
}

impl ConsolidatedRow {
    fn write_to(&self, sheet: &mut Table, row: usize) {
        let flag = if self.validation { "TRUE" } else { "FALSE" };
        sheet.set(row, COL_VALIDATION, flag);
        sheet.set(row, COL_SEASON, self.season.as_str());
        sheet.set(row, COL_FILENAME, self.filename.as_str());
        for (i, value) in self.fields.iter().enumerate() {
            if let Some(v) = value {
                sheet.set(row, COL_FIELDS + i, v.as_str());
            }
        }
    }
}

/// Sheet rows sharing one filename, keyed in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationGroup {
    pub filename: String,
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub groups: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Invalid groups where every duplicate left TIME OF DAY as `NODATA`.
    pub invalid_all_nodata: usize,
    /// Extracted rows without a filename, which join no group.
    pub rows_without_filename: usize,
}

#[derive(Debug, Clone)]
pub struct Consolidation {
    pub sheet: Table,
    pub rows: Vec<ConsolidatedRow>,
    pub summary: ValidationSummary,
}

/// Place a 9-column extracted table into the extracted block of an otherwise
/// empty sheet.
pub fn lift_extracted(extracted: &Table) -> Table {
    let pad = |cells: &[String]| -> Vec<String> {
        let mut row = vec![String::new(); CONSOLIDATED_WIDTH];
        row.extend(cells.iter().cloned());
        row
    };
    let mut sheet = Table::new(pad(&extracted.headers));
    for r in &extracted.rows {
        sheet.push_row(pad(r));
    }
    sheet
}

/// Whether `table` carries exactly the extracted-table header row.
pub fn is_extracted_layout(table: &Table) -> bool {
    table.headers == EXTRACTED_HEADERS
}

/// Group rows by the filename column. Blank filenames form no group.
pub fn group_by_filename(sheet: &Table) -> (Vec<ValidationGroup>, usize) {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ValidationGroup> = Vec::new();
    let mut blank = 0;

    for row in 0..sheet.len() {
        let filename = sheet.cell(row, SRC_FILENAME);
        if filename.is_empty() {
            blank += 1;
            continue;
        }
        match index.get(filename) {
            Some(&g) => groups[g].rows.push(row),
            None => {
                index.insert(filename, groups.len());
                groups.push(ValidationGroup {
                    filename: filename.to_string(),
                    rows: vec![row],
                });
            }
        }
    }
    (groups, blank)
}

/// True when every core column holds exactly one distinct non-blank value.
fn is_consistent(sheet: &Table, rows: &[usize]) -> bool {
    SRC_CORE.clone().all(|col| {
        let distinct: HashSet<&str> = rows
            .iter()
            .map(|&r| sheet.cell(r, col))
            .filter(|v| !v.is_empty())
            .collect();
        distinct.len() == 1
    })
}

/// Decide the consolidated row for one group.
pub fn consolidate_group(sheet: &Table, group: &ValidationGroup) -> ConsolidatedRow {
    let validation = is_consistent(sheet, &group.rows);
    let mut fields: [Option<String>; 8] = Default::default();

    if validation {
        let first = group.rows[0];
        for (i, slot) in fields.iter_mut().enumerate() {
            *slot = Some(sheet.cell(first, SRC_FIELDS + i).to_string());
        }
    } else {
        // species and habitat stay unset on this branch
        let answered = group
            .rows
            .iter()
            .copied()
            .find(|&r| sheet.cell(r, SRC_CONTEXT) != NODATA);
        for i in 0..CONTEXT_FIELDS {
            fields[CONTEXT_FIELD + i] = Some(match answered {
                Some(r) => sheet.cell(r, SRC_CONTEXT + i).to_string(),
                None => NODATA.to_string(),
            });
        }
    }

    ConsolidatedRow {
        validation,
        season: extract_season(&group.filename),
        filename: group.filename.clone(),
        fields,
    }
}

/// Forward-only cursor over rows whose consolidated block is still empty.
struct AppendCursor {
    next: usize,
}

impl AppendCursor {
    fn new() -> Self {
        Self { next: 0 }
    }

    fn next_free(&mut self, sheet: &Table) -> usize {
        while (0..CONSOLIDATED_WIDTH).any(|c| !sheet.is_blank(self.next, c)) {
            self.next += 1;
        }
        self.next
    }
}

/// Write one consolidated row per distinct filename into the sheet.
///
/// Rows already present in the consolidated block are kept; new rows go into
/// the first rows whose consolidated block is empty.
#[tracing::instrument(level = "info", skip_all, fields(rows = sheet.len()))]
pub fn consolidate<P: ProgressSink + ?Sized>(
    mut sheet: Table,
    progress: &P,
) -> Result<Consolidation, PipelineError> {
    sheet.require_width(SHEET_WIDTH)?;
    for (col, name) in CONSOLIDATED_HEADERS.iter().enumerate() {
        sheet.set_header(col, *name);
    }

    let (groups, blank) = group_by_filename(&sheet);
    let total = groups.len();
    let mut summary = ValidationSummary {
        groups: total,
        rows_without_filename: blank,
        ..Default::default()
    };
    let mut out = Vec::with_capacity(total);
    let mut cursor = AppendCursor::new();

    for (i, group) in groups.iter().enumerate() {
        let row = consolidate_group(&sheet, group);
        if row.validation {
            summary.valid += 1;
        } else {
            summary.invalid += 1;
            if row.fields[CONTEXT_FIELD].as_deref() == Some(NODATA) {
                summary.invalid_all_nodata += 1;
            }
        }

        let at = cursor.next_free(&sheet);
        row.write_to(&mut sheet, at);
        debug!(
            filename = %row.filename,
            valid = row.validation,
            duplicates = group.rows.len(),
            row = at,
            "consolidated"
        );
        out.push(row);

        progress.report(GroupProgress {
            current: i + 1,
            total,
        });
    }

    info!(
        groups = summary.groups,
        valid = summary.valid,
        invalid = summary.invalid,
        "validation done"
    );
    Ok(Consolidation {
        sheet,
        rows: out,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::progress::NoProgress;
    use std::cell::RefCell;

    /// Extracted-block row: filename then the eight annotation fields.
    fn ex(filename: &str, f: [&str; 8]) -> Vec<String> {
        std::iter::once(filename)
            .chain(f.iter().copied())
            .map(String::from)
            .collect()
    }

    fn sheet(rows: Vec<Vec<String>>) -> Table {
        let mut t = Table::with_headers(&EXTRACTED_HEADERS);
        for r in rows {
            t.push_row(r);
        }
        lift_extracted(&t)
    }

    const FOX: [&str; 8] = ["Fox", "1", "NONE", "NONE", "Night", "Cold", "May", "Scrub"];

    #[test]
    fn consistent_group_copies_first_row() {
        let mut second = FOX;
        second[4] = "Day";
        second[7] = "Oak";
        let s = sheet(vec![ex("CPW01_SPRING_a.jpg", FOX), ex("CPW01_SPRING_a.jpg", second)]);

        let c = consolidate(s, &NoProgress).unwrap();
        assert_eq!(c.rows.len(), 1);
        let row = &c.rows[0];
        assert!(row.validation);
        assert_eq!(row.season, "SPRING");
        let got: Vec<_> = row.fields.iter().map(|f| f.as_deref().unwrap()).collect();
        assert_eq!(got, FOX.to_vec());

        assert_eq!(&c.sheet.headers[..CONSOLIDATED_WIDTH], &CONSOLIDATED_HEADERS[..]);
        assert_eq!(c.sheet.cell(0, COL_VALIDATION), "TRUE");
        assert_eq!(c.sheet.cell(0, COL_FILENAME), "CPW01_SPRING_a.jpg");
        assert_eq!(c.sheet.cell(0, 7), "Night");
        assert!(c.sheet.is_blank(1, COL_FILENAME));
    }

    #[test]
    fn divergent_group_uses_first_answered_context() {
        let nodata = ["Fox", "1", "NONE", "NONE", "NODATA", "NODATA", "NODATA", ""];
        let other = ["Fox", "2", "NONE", "NONE", "Dusk", "Mild", "June", "Riparian"];
        let s = sheet(vec![ex("x_W_1.jpg", nodata), ex("x_W_1.jpg", other)]);

        let c = consolidate(s, &NoProgress).unwrap();
        let row = &c.rows[0];
        assert!(!row.validation);
        assert_eq!(
            row.fields,
            [
                None,
                None,
                None,
                None,
                Some("Dusk".to_string()),
                Some("Mild".to_string()),
                Some("June".to_string()),
                None
            ]
        );
        assert_eq!(c.sheet.cell(0, COL_VALIDATION), "FALSE");
        assert!(c.sheet.is_blank(0, COL_FIELDS));
        assert!(c.sheet.is_blank(0, 10));
        assert_eq!(c.summary.invalid, 1);
        assert_eq!(c.summary.invalid_all_nodata, 0);
    }

    #[test]
    fn all_nodata_writes_only_current_row() {
        // nine groups; the first is invalid with no context anywhere
        let nodata = ["Fox", "1", "NONE", "NONE", "NODATA", "NODATA", "NODATA", ""];
        let mut diverge = nodata;
        diverge[0] = "Deer";
        let mut rows = vec![ex("g0.jpg", nodata), ex("g0.jpg", diverge)];
        for g in 1..9 {
            rows.push(ex(&format!("g{}.jpg", g), FOX));
        }
        let s = sheet(rows);

        let c = consolidate(s, &NoProgress).unwrap();
        assert_eq!(c.summary.invalid_all_nodata, 1);
        for col in 7..=9 {
            assert_eq!(c.sheet.cell(0, col), NODATA);
        }
        // output rows are contiguous and each carries its own values
        for g in 0..9 {
            assert_eq!(c.sheet.cell(g, COL_FILENAME), format!("g{}.jpg", g));
        }
        for g in 1..9 {
            assert_eq!(c.sheet.cell(g, 8), "Cold");
        }
        assert!(c.sheet.is_blank(9, COL_FILENAME));
    }

    #[test]
    fn non_contiguous_duplicates_emit_once() {
        let mut b = FOX;
        b[1] = "3";
        let s = sheet(vec![
            ex("a.jpg", FOX),
            ex("b.jpg", FOX),
            ex("a.jpg", FOX),
            ex("c.jpg", FOX),
            ex("b.jpg", b),
            ex("a.jpg", FOX),
        ]);
        let c = consolidate(s, &NoProgress).unwrap();
        let names: Vec<_> = c.rows.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
        let flags: Vec<_> = c.rows.iter().map(|r| r.validation).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(c.summary.groups, 3);
    }

    #[test]
    fn blanks_do_not_count_as_values() {
        let mut partial = FOX;
        partial[2] = "";
        let mut empty = FOX;
        empty[2] = "";
        let s = sheet(vec![
            ex("a.jpg", FOX),
            ex("a.jpg", partial),
            ex("b.jpg", empty),
            ex("", FOX),
        ]);
        let c = consolidate(s, &NoProgress).unwrap();
        assert!(c.rows[0].validation);
        assert!(!c.rows[1].validation);
        assert_eq!(c.summary.rows_without_filename, 1);
    }

    #[test]
    fn appends_after_existing_consolidated_rows() {
        let mut s = sheet(vec![ex("a.jpg", FOX), ex("b.jpg", FOX), ex("c.jpg", FOX)]);
        s.set(0, COL_FILENAME, "earlier.jpg");
        s.set(1, COL_VALIDATION, "TRUE");

        let c = consolidate(s, &NoProgress).unwrap();
        assert_eq!(c.sheet.cell(0, COL_FILENAME), "earlier.jpg");
        assert_eq!(c.sheet.cell(2, COL_FILENAME), "a.jpg");
        assert_eq!(c.sheet.cell(3, COL_FILENAME), "b.jpg");
        assert_eq!(c.sheet.cell(4, COL_FILENAME), "c.jpg");
    }

    #[test]
    fn narrow_sheet_is_rejected() {
        let mut t = Table::with_headers(&EXTRACTED_HEADERS);
        t.push_row(ex("a.jpg", FOX));
        match consolidate(t, &NoProgress) {
            Err(PipelineError::SchemaMismatch { expected, found }) => {
                assert_eq!((expected, found), (20, 9));
            }
            other => panic!("unexpected {:?}", other.map(|c| c.rows)),
        }
    }

    struct Recorder(RefCell<Vec<GroupProgress>>);

    impl ProgressSink for Recorder {
        fn report(&self, progress: GroupProgress) {
            self.0.borrow_mut().push(progress);
        }
    }

    #[test]
    fn reports_progress_per_group() {
        let s = sheet(vec![ex("a.jpg", FOX), ex("b.jpg", FOX), ex("a.jpg", FOX)]);
        let rec = Recorder(RefCell::new(Vec::new()));
        consolidate(s, &rec).unwrap();
        let seen = rec.0.into_inner();
        assert_eq!(
            seen,
            vec![
                GroupProgress {
                    current: 1,
                    total: 2
                },
                GroupProgress {
                    current: 2,
                    total: 2
                }
            ]
        );
    }
}
