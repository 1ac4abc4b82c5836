//! Extraction of the daily index-composition table.
//!
//! Page acquisition lives behind the `IndexPage` trait so the extractor can
//! be exercised without a network (and so the page mechanics stay out of the
//! core). The extractor owns two things: selecting the right on-page filters
//! before asking for rows, and mapping raw string rows positionally onto
//! `RawRow`.

use ibovetl_core::domain::RawRow;
use thiserror::Error;

/// On-page grouping option that puts the sector column first.
pub const SECTOR_SEGMENT: &str = "Setor de Atuação";

/// Page size large enough to list every constituent on one page.
pub const FULL_PAGE_SIZE: u32 = 120;

/// Column count of the sector-grouped composition table.
const COLUMN_COUNT: usize = 7;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("composition table not found on the index page")]
    TableNotFound,
    #[error("table row {row} has {len} columns, expected {COLUMN_COUNT}")]
    RowShape { row: usize, len: usize },
    #[error("index page error: {0}")]
    Page(String),
}

/// Page-acquisition collaborator: filter selection plus raw table rows.
pub trait IndexPage {
    /// Select the grouping segment by its visible label.
    fn select_segment(&mut self, label: &str) -> Result<(), ExtractError>;

    /// Select the listing page size.
    fn select_page_size(&mut self, size: u32) -> Result<(), ExtractError>;

    /// Raw table rows in on-page column order, or `None` when the page
    /// carries no table (layout failure, empty render).
    fn table_rows(&mut self) -> Result<Option<Vec<Vec<String>>>, ExtractError>;
}

/// Pull the full composition table for the day.
///
/// Selects the sector grouping and the full-page listing, then maps each raw
/// row positionally onto `RawRow`. A missing table is an error, never an
/// empty result; rows that do not fit the fixed column order are rejected.
pub fn extract(page: &mut dyn IndexPage) -> Result<Vec<RawRow>, ExtractError> {
    page.select_segment(SECTOR_SEGMENT)?;
    page.select_page_size(FULL_PAGE_SIZE)?;

    let rows = page.table_rows()?.ok_or(ExtractError::TableNotFound)?;

    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != COLUMN_COUNT {
            return Err(ExtractError::RowShape {
                row: i,
                len: row.len(),
            });
        }
        let mut fields = row.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        out.push(RawRow {
            setor: next(),
            codigo: next(),
            acao: next(),
            tipo: next(),
            qtde_teorica: next(),
            part: next(),
            part_acum: next(),
        });
    }
    Ok(out)
}
