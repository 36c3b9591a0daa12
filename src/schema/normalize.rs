//! Ordinal column selection and canonical renaming.
//!
//! The weather source names columns inconsistently across years, so the
//! canonical schema is applied by position, not by name: column N of the raw
//! table maps to canonical field N of the extraction list, and the result is
//! reordered into one fixed canonical order.

use crate::schema::error::SchemaError;
use polars::prelude::*;

/// Ordinal positions of the columns kept from a raw weather table, in
/// extraction order. Positions 19+ are the broadcast metadata columns.
pub const WEATHER_ORDINALS: [usize; 10] = [0, 1, 6, 7, 15, 18, 22, 24, 25, 26];

/// Canonical names for the extracted columns, position-for-position against
/// [`WEATHER_ORDINALS`].
pub const WEATHER_FIELD_NAMES: [&str; 10] = [
    "data_completa",
    "hora",
    "radiacao_global",
    "temperatura_ar",
    "umidade_relativa",
    "velocidade_vento",
    "estacao",
    "latitude",
    "longitude",
    "altitude",
];

/// Final column order of the canonical weather schema, independent of
/// extraction order.
pub const WEATHER_CANONICAL_ORDER: [&str; 10] = [
    "estacao",
    "data_completa",
    "hora",
    "radiacao_global",
    "temperatura_ar",
    "umidade_relativa",
    "velocidade_vento",
    "latitude",
    "longitude",
    "altitude",
];

/// Administrative columns stripped from the generation dataset.
pub const GENERATION_DROP_COLUMNS: [&str; 4] = [
    "id_subsistema",
    "nom_estado",
    "cod_modalidadeoperacao",
    "nom_tipocombustivel",
];

/// Plant technology class column of the generation dataset.
pub const GENERATION_TYPE_COLUMN: &str = "nom_tipousina";

/// Administrative region column of the generation dataset.
pub const GENERATION_STATE_COLUMN: &str = "id_estado";

/// Extracts the columns at `ordinals` (in that order), renames them
/// position-for-position to `canonical_names`, then reorders the result into
/// `canonical_order`.
pub fn select_and_rename(
    df: &DataFrame,
    ordinals: &[usize],
    canonical_names: &[&str],
    canonical_order: &[&str],
) -> Result<DataFrame, SchemaError> {
    let required = ordinals.iter().copied().max().map_or(0, |max| max + 1);
    if df.width() < required {
        return Err(SchemaError::SchemaMismatch {
            required,
            found: df.width(),
        });
    }

    let source_names = df.get_column_names();
    let picked: Vec<String> = ordinals
        .iter()
        .map(|&idx| source_names[idx].to_string())
        .collect();

    let mut selected = df.select(picked.iter().cloned())?;
    for (old, new) in picked.iter().zip(canonical_names) {
        selected.rename(old, (*new).into())?;
    }

    Ok(selected.select(canonical_order.iter().copied())?)
}

/// Strips the administrative columns from a generation table and keeps only
/// rows matching the requested plant technology and state. All six columns
/// must exist; their absence signals a source format change.
pub fn filter_and_drop(
    df: &DataFrame,
    technology: &str,
    state: &str,
) -> Result<DataFrame, SchemaError> {
    for column in GENERATION_DROP_COLUMNS
        .iter()
        .chain([&GENERATION_TYPE_COLUMN, &GENERATION_STATE_COLUMN])
    {
        df.column(column)
            .map_err(|_| SchemaError::MissingColumn(column.to_string()))?;
    }

    let mut out = df.clone();
    for column in GENERATION_DROP_COLUMNS {
        out = out.drop(column)?;
    }

    Ok(out
        .lazy()
        .filter(
            col(GENERATION_TYPE_COLUMN)
                .eq(lit(technology.to_owned()))
                .and(col(GENERATION_STATE_COLUMN).eq(lit(state.to_owned()))),
        )
        .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 27-column table shaped like a parsed weather file: positions carry
    /// meaning, names are deliberately unhelpful.
    fn raw_weather_table() -> DataFrame {
        let mut columns: Vec<Column> = (0..27)
            .map(|i| Column::new(format!("col_{i}").into(), vec![format!("filler_{i}"); 2]))
            .collect();
        columns[0] = Column::new("col_0".into(), vec!["2021-05-03", "2021-05-04"]);
        columns[1] = Column::new("col_1".into(), vec!["1200 UTC", "1300 UTC"]);
        columns[22] = Column::new("col_22".into(), vec!["CERCADINHO", "CERCADINHO"]);
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn output_follows_canonical_order_regardless_of_input_names() {
        let df = raw_weather_table();
        let out = select_and_rename(
            &df,
            &WEATHER_ORDINALS,
            &WEATHER_FIELD_NAMES,
            &WEATHER_CANONICAL_ORDER,
        )
        .unwrap();

        let names: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, WEATHER_CANONICAL_ORDER);
        assert_eq!(names[0], "estacao");

        let station = out.column("estacao").unwrap().str().unwrap();
        assert_eq!(station.get(0), Some("CERCADINHO"));
        let date = out.column("data_completa").unwrap().str().unwrap();
        assert_eq!(date.get(1), Some("2021-05-04"));
    }

    #[test]
    fn narrow_table_is_a_schema_mismatch() {
        let df = DataFrame::new(
            (0..5)
                .map(|i| Column::new(format!("col_{i}").into(), vec!["x"]))
                .collect(),
        )
        .unwrap();

        let err = select_and_rename(
            &df,
            &WEATHER_ORDINALS,
            &WEATHER_FIELD_NAMES,
            &WEATHER_CANONICAL_ORDER,
        )
        .unwrap_err();
        match err {
            SchemaError::SchemaMismatch { required, found } => {
                assert_eq!(required, 27);
                assert_eq!(found, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn generation_table() -> DataFrame {
        DataFrame::new(vec![
            Column::new("id_subsistema".into(), vec!["SE", "SE", "S"]),
            Column::new("nom_estado".into(), vec!["Minas Gerais", "Minas Gerais", "Parana"]),
            Column::new("cod_modalidadeoperacao".into(), vec!["P", "P", "P"]),
            Column::new("nom_tipocombustivel".into(), vec!["Solar", "Eolica", "Solar"]),
            Column::new("nom_tipousina".into(), vec!["FOTOVOLTAICA", "EOLICA", "FOTOVOLTAICA"]),
            Column::new("id_estado".into(), vec!["MG", "MG", "PR"]),
            Column::new("val_geracao".into(), vec![10.5, 22.0, 7.0]),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_only_matching_technology_and_state() {
        let out = filter_and_drop(&generation_table(), "FOTOVOLTAICA", "MG").unwrap();

        assert_eq!(out.height(), 1);
        let generated = out.column("val_geracao").unwrap().f64().unwrap();
        assert_eq!(generated.get(0), Some(10.5));

        // A wind plant in the right state is still excluded.
        let kinds = out.column("nom_tipousina").unwrap().str().unwrap();
        assert_eq!(kinds.get(0), Some("FOTOVOLTAICA"));
    }

    #[test]
    fn administrative_columns_are_dropped() {
        let out = filter_and_drop(&generation_table(), "FOTOVOLTAICA", "MG").unwrap();
        for column in GENERATION_DROP_COLUMNS {
            assert!(out.column(column).is_err(), "column {column} should be gone");
        }
    }

    #[test]
    fn missing_filter_column_is_a_hard_failure() {
        let df = generation_table().drop("id_estado").unwrap();
        let err = filter_and_drop(&df, "FOTOVOLTAICA", "MG").unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(name) if name == "id_estado"));
    }

    #[test]
    fn missing_drop_column_is_a_hard_failure() {
        let df = generation_table().drop("nom_estado").unwrap();
        let err = filter_and_drop(&df, "FOTOVOLTAICA", "MG").unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(name) if name == "nom_estado"));
    }
}
