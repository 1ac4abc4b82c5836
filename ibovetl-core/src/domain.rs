//! Row-level domain types shared across the pipeline stages.

use serde::{Deserialize, Serialize};

/// One IBOV constituent as scraped, on a given day.
///
/// Every field is a string: the source table formats numbers in pt-BR locale
/// (`.` thousands separator, `,` decimal separator) and the landing stage
/// preserves them verbatim. Coercion is the transform stage's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub setor: String,
    pub codigo: String,
    pub acao: String,
    pub tipo: String,
    pub qtde_teorica: String,
    pub part: String,
    pub part_acum: String,
}

/// Landed parquet header order, matching the source table verbatim.
pub const LANDED_COLUMNS: [&str; 7] = [
    "Setor",
    "Código",
    "Ação",
    "Tipo",
    "Qtde. Teórica",
    "Part. (%)",
    "Part. (%)Acum.",
];

/// Name of the trading-day column appended at landing time (`YYYY-MM-DD`).
pub const DATE_COLUMN: &str = "date";
