//! Attribute-only tables for non-spatial sources

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::vector::AttributeValue;

/// One row of a table, keyed by column name
pub type Record = HashMap<String, AttributeValue>;

/// Rows with a known column order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Keys not yet listed become new columns.
    pub fn push(&mut self, row: Record) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Values of one column, `Null` where a row lacks it
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AttributeValue> + 'a {
        self.rows
            .iter()
            .map(move |r| r.get(name).unwrap_or(&AttributeValue::Null))
    }

    /// Resolve a column from a list of aliases.
    ///
    /// Each pass tries every candidate in order: exact name, then
    /// case-insensitive name, then substring containment in either
    /// direction (case-insensitive).
    pub fn find_column(&self, candidates: &[&str]) -> Option<&str> {
        for cand in candidates {
            if let Some(c) = self.columns.iter().find(|c| c.as_str() == *cand) {
                return Some(c.as_str());
            }
        }
        for cand in candidates {
            let cand = cand.to_lowercase();
            if let Some(c) = self.columns.iter().find(|c| c.to_lowercase() == cand) {
                return Some(c.as_str());
            }
        }
        for cand in candidates {
            let cand = cand.to_lowercase();
            if let Some(c) = self.columns.iter().find(|c| {
                let col = c.to_lowercase();
                col.contains(&cand) || cand.contains(&col)
            }) {
                return Some(c.as_str());
            }
        }
        None
    }
}

impl FromIterator<Record> for Table {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut table = Table::default();
        for row in iter {
            table.push(row);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, AttributeValue)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn push_tracks_columns() {
        let mut t = Table::new(vec!["a".into()]);
        t.push(row(&[("a", 1i64.into()), ("b", "x".into())]));
        t.push(row(&[("a", 2i64.into())]));
        assert_eq!(t.columns, vec!["a".to_string(), "b".to_string()]);
        let bs: Vec<_> = t.column_values("b").collect();
        assert_eq!(bs, vec![&AttributeValue::from("x"), &AttributeValue::Null]);
    }

    #[test]
    fn find_column_precedence() {
        let t = Table::new(vec![
            "Municipio_Conflito".into(),
            "ANO".into(),
            "municipio".into(),
        ]);
        assert_eq!(t.find_column(&["municipio"]), Some("municipio"));
        assert_eq!(t.find_column(&["Ano", "year"]), Some("ANO"));
        assert_eq!(t.find_column(&["conflito"]), Some("Municipio_Conflito"));
        assert_eq!(t.find_column(&["familias"]), None);
    }
}
