//! Affected families per municipality from the conflict-area sheet

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use ucmonitor_core::{Error, Result, Table};

use crate::places::{fold_accents, title_case};

/// Municipalities followed by the monitoring panels
pub const MUNICIPALITIES_OF_INTEREST: &[&str] =
    &["SÃO FÉLIX DO XINGU", "ALTAMIRA", "ITAITUBA", "JACAREACANGA", "NOVO PROGRESSO"];

/// One conflict-area row
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictRow {
    /// Conflict name, shared by the rows of one conflict
    pub name: String,
    /// One or more municipalities separated by `;` or `,`
    pub municipalities: String,
    pub families: Option<f64>,
}

/// Read conflict rows from a table with municipality, families and
/// conflict-name columns.
///
/// Fails with `MissingAttribute` when the municipality or name column
/// cannot be resolved. A missing families column yields no families.
pub fn conflict_rows(table: &Table) -> Result<Vec<ConflictRow>> {
    let mun_col = table
        .find_column(&["mun", "municipio", "Município"])
        .ok_or_else(|| Error::MissingAttribute("mun".to_string()))?;
    let name_col = table
        .find_column(&["Nome do Conflito", "nome_conflito", "conflito"])
        .ok_or_else(|| Error::MissingAttribute("Nome do Conflito".to_string()))?;
    let families_col = table.find_column(&["Famílias", "familias"]);

    Ok(table
        .rows
        .iter()
        .filter_map(|row| {
            Some(ConflictRow {
                name: row.get(name_col)?.as_text()?,
                municipalities: row.get(mun_col)?.as_text()?,
                families: families_col.and_then(|c| row.get(c)).and_then(|v| v.as_f64()),
            })
        })
        .collect())
}

/// Families and conflicts attributed to one municipality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityFamilies {
    pub municipality: String,
    pub families: f64,
    /// Conflict rows naming the municipality
    pub conflicts: usize,
}

fn municipality_keys(field: &str) -> Vec<String> {
    field
        .split([';', ','])
        .map(|m| fold_accents(m.trim()))
        .filter(|m| !m.is_empty())
        .collect()
}

/// Split each conflict's families evenly among the distinct
/// municipalities it spans and total them for the municipalities of
/// interest.
///
/// Names are compared after [`fold_accents`], so `"SÃO FÉLIX DO XINGU"`
/// matches `"Sao Felix do Xingu"`. Only municipalities of interest that
/// appear in some conflict are returned, with title-cased names, most
/// families first.
pub fn families_per_municipality(rows: &[ConflictRow], municipalities_of_interest: &[&str]) -> Vec<MunicipalityFamilies> {
    let interest: HashMap<String, String> = municipalities_of_interest
        .iter()
        .map(|m| (fold_accents(m.trim()), title_case(m.trim())))
        .collect();

    let exploded: Vec<(&ConflictRow, Vec<String>)> = rows.iter().map(|r| (r, municipality_keys(&r.municipalities))).collect();

    let mut spans: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for (row, keys) in &exploded {
        spans
            .entry(row.name.as_str())
            .or_default()
            .extend(keys.iter().map(String::as_str));
    }

    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for (row, keys) in &exploded {
        let span = &spans[row.name.as_str()];
        if !span.iter().any(|k| interest.contains_key(*k)) {
            continue;
        }
        let share = row.families.unwrap_or(0.0) / span.len() as f64;
        for key in keys {
            if interest.contains_key(key) {
                let e = totals.entry(key.as_str()).or_default();
                e.0 += share;
                e.1 += 1;
            }
        }
    }

    let mut out: Vec<MunicipalityFamilies> = totals
        .into_iter()
        .map(|(key, (families, conflicts))| MunicipalityFamilies {
            municipality: interest[key].clone(),
            families,
            conflicts,
        })
        .collect();
    out.sort_by(|a, b| {
        b.families
            .total_cmp(&a.families)
            .then_with(|| a.municipality.cmp(&b.municipality))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucmonitor_core::{AttributeValue, Record};

    fn row(name: &str, muns: &str, families: f64) -> ConflictRow {
        ConflictRow {
            name: name.into(),
            municipalities: muns.into(),
            families: Some(families),
        }
    }

    #[test]
    fn families_split_across_municipalities() {
        let rows = vec![
            row("Gleba A", "Altamira; São Félix do Xingu", 100.0),
            row("Gleba B", "ALTAMIRA", 30.0),
            row("Gleba C", "Marabá, Parauapebas", 500.0),
            row("Gleba D", "Itaituba, Trairão, Itaituba", 90.0),
        ];
        let out = families_per_municipality(&rows, MUNICIPALITIES_OF_INTEREST);
        assert_eq!(out.len(), 3);

        // two distinct municipalities, listed three times
        assert_eq!(out[0].municipality, "Itaituba");
        assert_eq!(out[0].families, 90.0);
        assert_eq!(out[0].conflicts, 2);

        assert_eq!(out[1].municipality, "Altamira");
        assert_eq!(out[1].families, 80.0);
        assert_eq!(out[1].conflicts, 2);

        assert_eq!(out[2].municipality, "São Félix Do Xingu");
        assert_eq!(out[2].families, 50.0);
    }

    #[test]
    fn rows_from_table() {
        let mut t = Table::default();
        let r: Record = [
            ("mun".to_string(), AttributeValue::from("Altamira")),
            ("Famílias".to_string(), AttributeValue::from("12")),
            ("Nome do Conflito".to_string(), AttributeValue::from("Gleba A")),
        ]
        .into_iter()
        .collect();
        t.push(r);
        let rows = conflict_rows(&t).unwrap();
        assert_eq!(rows, vec![row("Gleba A", "Altamira", 12.0)]);

        let empty = Table::new(vec!["x".into()]);
        assert!(matches!(conflict_rows(&empty), Err(Error::MissingAttribute(_))));
    }
}
