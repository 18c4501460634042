use crate::{document::Document, Error, Result};
use chrono::NaiveDate;

const USED_TABLE: &str = "div#history-panes-used-numbers-print";
const UNUSED_TABLE: &str = "div#history-panes-unused-numbers-print";
const STATUS_COLUMN: usize = 5;
const DATE_FORMAT: &str = "%d/%m/%Y";

/// What the portal prints in empty cells.
pub const PLACEHOLDER: &str = "-----------";
pub const DASH: &str = "─";

/// One previously issued number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: String,
    pub merchant: String,
    pub number: String,
    pub limit: String,
    pub transaction: String,
}

impl HistoryEntry {
    /// The synthetic first row of a history listing.
    #[must_use]
    pub fn header() -> Self {
        Self {
            date: "DATE   ".to_string(),
            merchant: "COMMERCANT".to_string(),
            number: "E-NUMERO     ".to_string(),
            limit: "PLAFOND".to_string(),
            transaction: "TRANSACTION".to_string(),
        }
    }

    #[must_use]
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.date,
            &self.merchant,
            &self.number,
            &self.limit,
            &self.transaction,
        ]
    }

    fn from_cells(mut cells: Vec<String>) -> Result<Self> {
        if cells.len() > STATUS_COLUMN {
            cells.remove(STATUS_COLUMN);
        }

        let mut cells = cells.into_iter().map(|cell| {
            if cell == PLACEHOLDER {
                DASH.to_string()
            } else {
                cell
            }
        });

        let mut next = || {
            cells
                .next()
                .ok_or_else(|| Error::parse("history row has fewer than 5 columns"))
        };

        Ok(Self {
            date: next()?,
            merchant: next()?,
            number: next()?,
            limit: next()?,
            transaction: next()?,
        })
    }

    fn day(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|e| Error::parse(format!("invalid history date {}: {e}", self.date)))
    }
}

/// Most recent first; rows of the same day keep their page order.
///
/// # Errors
/// Returns [`Error::Parse`] if a date is not `dd/mm/yyyy`.
pub fn sort_by_date(entries: Vec<HistoryEntry>) -> Result<Vec<HistoryEntry>> {
    let mut dated = entries
        .into_iter()
        .map(|entry| entry.day().map(|day| (day, entry)))
        .collect::<Result<Vec<_>>>()?;

    // stable
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(dated.into_iter().map(|(_, entry)| entry).collect())
}

/// Used then unused numbers, sorted, behind [`HistoryEntry::header`].
///
/// # Errors
/// Returns [`Error::Portal`] for the error panel, [`Error::Parse`] for malformed rows.
pub fn parse(body: &str) -> Result<Vec<HistoryEntry>> {
    let doc = Document::parse(body);
    doc.check_error()?;

    let mut rows = doc.table_rows(USED_TABLE)?;
    rows.extend(doc.table_rows(UNUSED_TABLE)?);

    let entries = rows
        .into_iter()
        .map(HistoryEntry::from_cells)
        .collect::<Result<Vec<_>>>()?;

    let mut listing = vec![HistoryEntry::header()];
    listing.extend(sort_by_date(entries)?);
    Ok(listing)
}
