//! TJ-PA environmental lawsuit tallies

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use ucmonitor_core::Table;

use crate::places::fold_accents;
use crate::timeseries::{contiguous_months, parse_datetime, MonthlyValue, YearMonth};

/// Rows kept by each tally of [`case_overview`]
pub const OVERVIEW_TOP_N: usize = 10;

/// Occurrences of one column value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// The `n` most frequent trimmed values of `column`, most frequent first,
/// ties by value. Null and blank cells are ignored; a missing column gives
/// an empty list.
pub fn top_counts(table: &Table, column: &str, n: usize) -> Vec<ValueCount> {
    if !table.has_column(column) {
        return Vec::new();
    }
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in table.column_values(column) {
        if let Some(text) = value.as_text() {
            let text = text.trim();
            if !text.is_empty() {
                *counts.entry(text.to_string()).or_default() += 1;
            }
        }
    }

    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out.truncate(n);
    out
}

/// Filing counts per month of `data_ajuizamento`, contiguous, with
/// unparsable dates skipped
pub fn monthly_filings(table: &Table) -> Vec<MonthlyValue> {
    let mut buckets: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for value in table.column_values("data_ajuizamento") {
        if let Some(date) = value.as_text().and_then(|s| parse_datetime(&s)) {
            *buckets.entry(YearMonth::of(&date)).or_default() += 1.0;
        }
    }
    contiguous_months(&buckets)
}

/// Dashboard tallies of a lawsuit table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseOverview {
    pub municipalities: Vec<ValueCount>,
    pub classes: Vec<ValueCount>,
    pub subjects: Vec<ValueCount>,
    pub courts: Vec<ValueCount>,
    pub monthly_filings: Vec<MonthlyValue>,
}

/// Top-10 tallies of `municipio`, `classe`, `assuntos` and
/// `orgao_julgador`, plus monthly filings
pub fn case_overview(table: &Table) -> CaseOverview {
    CaseOverview {
        municipalities: top_counts(table, "municipio", OVERVIEW_TOP_N),
        classes: top_counts(table, "classe", OVERVIEW_TOP_N),
        subjects: top_counts(table, "assuntos", OVERVIEW_TOP_N),
        courts: top_counts(table, "orgao_julgador", OVERVIEW_TOP_N),
        monthly_filings: monthly_filings(table),
    }
}

const CLASS_LABELS: &[(&str, &str)] = &[
    ("procedimento comum civel", "Proc. Comum Cível"),
    ("acao civil publica", "Ação Civil Pública"),
    ("peticao civel", "Petição Cível"),
    ("cumprimento de sentenca", "Cumpr. Sentença"),
    ("termo circunstanciado", "Termo Circunstan."),
    ("carta precatoria civel", "Carta Prec. Cível"),
    ("acao penal - procedimento ordinario", "Ação Penal Ordinária"),
    ("alvara judicial - lei 6858/80", "Alvará Judicial"),
    ("crimes ambientais", "Crimes Ambientais"),
    ("homologacao da transacao extrajudicial", "Homolog. Transação"),
];

const SUBJECT_LABELS: &[(&str, &str)] = &[
    ("indenizacao por dano ambiental", "Dano Ambiental"),
    ("obrigacao de fazer / nao fazer", "Obrig. Fazer/Não Fazer"),
    ("flora", "Flora"),
    ("fauna", "Fauna"),
    ("mineracao", "Mineração"),
    ("poluicao", "Poluição"),
    ("unidade de conservacao da natureza", "Unid. Conservação"),
    ("revogacao/anulacao de multa ambiental", "Anulação Multa Ambiental"),
    ("area de preservacao permanente", "APP"),
    ("agrotoxicos", "Agrotóxicos"),
];

const COURT_LABELS: &[(&str, &str)] = &[
    ("1a vara civel e empresarial de altamira", "1ª V. Cível Altamira"),
    ("vara civil e empresarial da comarca de sao felix do xingu", "V. Cível São Félix"),
    ("vara civel de novo progresso", "V. Cível Novo Progresso"),
    ("2a vara civel e empresarial de altamira", "2ª V. Cível Altamira"),
    ("3a vara civel e empresarial de altamira", "3ª V. Cível Altamira"),
    ("1a vara civel e empresarial de itaituba", "1ª V. Cível Itaituba"),
    ("juizado especial civel e criminal de itaituba", "JEC Itaituba"),
    ("2a vara civel e empresarial de itaituba", "2ª V. Cível Itaituba"),
    ("vara criminal de itaituba", "V. Criminal Itaituba"),
    ("vara unica de jacareacanga", "V. Única Jacareacanga"),
];

/// Short chart label for a `classe`, `assuntos` or `orgao_julgador`
/// value; other columns and unknown values come back unchanged.
pub fn short_label(column: &str, value: &str) -> String {
    let labels = match column {
        "classe" => CLASS_LABELS,
        "assuntos" => SUBJECT_LABELS,
        "orgao_julgador" => COURT_LABELS,
        _ => return value.to_string(),
    };
    let key = fold_accents(value.trim()).replace(['º', 'ª'], "a");
    labels
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucmonitor_core::{AttributeValue, Record};

    fn lawsuits() -> Table {
        let rows = [
            ("Altamira", "Ação Civil Pública", "2022-01-15"),
            ("Altamira", "Procedimento Comum Cível", "2022-03-02"),
            ("Itaituba", "Ação Civil Pública", "data inválida"),
            ("Itaituba", "Termo Circunstanciado", "2022-01-30 09:00:00"),
            ("Novo Progresso", "", "2022-03-10"),
        ];
        rows.iter()
            .map(|(m, c, d)| {
                Record::from([
                    ("municipio".to_string(), AttributeValue::from(*m)),
                    ("classe".to_string(), AttributeValue::from(*c)),
                    ("data_ajuizamento".to_string(), AttributeValue::from(*d)),
                ])
            })
            .collect()
    }

    #[test]
    fn counts_with_name_ties() {
        let top = top_counts(&lawsuits(), "municipio", 2);
        assert_eq!(
            top,
            vec![
                ValueCount { value: "Altamira".into(), count: 2 },
                ValueCount { value: "Itaituba".into(), count: 2 },
            ]
        );
        let classes = top_counts(&lawsuits(), "classe", 10);
        assert_eq!(classes.len(), 3);
        assert_eq!(classes[0].value, "Ação Civil Pública");
        assert!(top_counts(&lawsuits(), "assuntos", 10).is_empty());
    }

    #[test]
    fn overview_monthly_series() {
        let overview = case_overview(&lawsuits());
        assert_eq!(overview.municipalities.len(), 3);
        assert!(overview.courts.is_empty());
        let counts: Vec<f64> = overview.monthly_filings.iter().map(|m| m.value).collect();
        assert_eq!(counts, vec![2.0, 0.0, 2.0]);
        assert_eq!(overview.monthly_filings[0].month, YearMonth::new(2022, 1));
    }

    #[test]
    fn labels() {
        assert_eq!(short_label("classe", "Ação Civil Pública"), "Ação Civil Pública");
        assert_eq!(short_label("classe", "PROCEDIMENTO COMUM CÍVEL"), "Proc. Comum Cível");
        assert_eq!(short_label("orgao_julgador", "1ª Vara Cível e Empresarial de Altamira"), "1ª V. Cível Altamira");
        assert_eq!(short_label("assuntos", "Outro assunto"), "Outro assunto");
        assert_eq!(short_label("municipio", "flora"), "flora");
    }
}
