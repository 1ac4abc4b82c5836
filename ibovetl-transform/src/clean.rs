//! Column-name normalization and canonical renames for landed frames.
//!
//! The landed headers are the source table's verbatim Portuguese labels.
//! Normalization lowercases, joins with underscores, and strips punctuation;
//! the canonical map then folds accents and applies the two semantic renames
//! (participation → `part_teorica`, landing `date` → `date_init`).

use polars::prelude::*;

/// Lowercase, spaces to underscores, punctuation stripped. Unicode letters,
/// digits, and `_` survive.
pub fn normalize_column(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Canonical column name for a normalized header.
pub fn canonical_column(normalized: &str) -> &str {
    match normalized {
        "código" => "codigo",
        "ação" => "acao",
        "qtde_teórica" => "qtde_teorica",
        // "Part. (%)" normalizes to "part_": the space before the stripped
        // "(%)" leaves a trailing underscore.
        "part_" => "part_teorica",
        "date" => "date_init",
        other => other,
    }
}

/// Rename every column of a landed frame to its canonical name.
pub fn normalize_frame(df: &mut DataFrame) -> Result<(), PolarsError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    for name in names {
        let target = canonical_column(&normalize_column(&name)).to_string();
        if target != name {
            df.rename(&name, target.into())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibovetl_core::domain::LANDED_COLUMNS;

    #[test]
    fn normalizes_the_landed_headers() {
        assert_eq!(normalize_column("Setor"), "setor");
        assert_eq!(normalize_column("Qtde. Teórica"), "qtde_teórica");
        assert_eq!(normalize_column("Part. (%)"), "part_");
        assert_eq!(normalize_column("Part. (%)Acum."), "part_acum");
    }

    #[test]
    fn canonical_names_cover_every_landed_column() {
        let canonical: Vec<String> = LANDED_COLUMNS
            .iter()
            .map(|name| canonical_column(&normalize_column(name)).to_string())
            .collect();
        assert_eq!(
            canonical,
            vec![
                "setor",
                "codigo",
                "acao",
                "tipo",
                "qtde_teorica",
                "part_teorica",
                "part_acum",
            ]
        );
    }

    #[test]
    fn date_column_is_renamed_to_date_init() {
        assert_eq!(canonical_column("date"), "date_init");
    }

    #[test]
    fn frame_renames_apply_in_place() {
        let mut df = DataFrame::new(vec![
            Column::new("Setor".into(), vec!["Financeiro"]),
            Column::new("Part. (%)".into(), vec!["10,5"]),
            Column::new("date".into(), vec!["2024-06-03"]),
        ])
        .unwrap();

        normalize_frame(&mut df).unwrap();

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["setor", "part_teorica", "date_init"]);
    }
}
