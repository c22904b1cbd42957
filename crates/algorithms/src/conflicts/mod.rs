//! CPT rural-conflict tables
//!
//! Per-municipality tallies of conflict areas, murders, land conflicts and
//! slave-labor cases, plus the split of affected families among the
//! municipalities a conflict spans.

mod families;

pub use families::{conflict_rows, families_per_municipality, ConflictRow, MunicipalityFamilies, MUNICIPALITIES_OF_INTEREST};

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};
use ucmonitor_core::{Record, Table};

use crate::places::{clean_state, title_case};

/// Kind of CPT table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ConflictKind {
    ConflictAreas,
    Murders,
    LandConflicts,
    SlaveLabor,
}

const COMMON_MUNICIPALITY: &[&str] = &["municipio", "Municipio", "MUNICIPIO", "município", "Município"];
const COMMON_YEAR: &[&str] = &["ano", "Ano", "ano_referencia", "data", "Data", "year"];
const STATE_COLUMNS: &[&str] = &["estado", "Estado", "ESTADO", "uf", "UF", "sigla_uf", "unidade_federacao"];
const MUNICIPALITY_PLACEHOLDERS: &[&str] = &["Nan", "None", "Null", "Na"];

impl ConflictKind {
    pub const ALL: [ConflictKind; 4] = [
        ConflictKind::ConflictAreas,
        ConflictKind::Murders,
        ConflictKind::LandConflicts,
        ConflictKind::SlaveLabor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ConflictKind::ConflictAreas => "Areas Conflito",
            ConflictKind::Murders => "Assassinatos",
            ConflictKind::LandConflicts => "Conflitos Terra",
            ConflictKind::SlaveLabor => "Trabalho Escravo",
        }
    }

    fn municipality_columns(self) -> &'static [&'static str] {
        match self {
            ConflictKind::SlaveLabor => &[
                "municipio",
                "Municipio",
                "MUNICIPIO",
                "município",
                "Município",
                "nome_municipio",
                "cidade",
            ],
            _ => COMMON_MUNICIPALITY,
        }
    }

    fn year_columns(self) -> &'static [&'static str] {
        match self {
            ConflictKind::SlaveLabor => &[
                "ano",
                "Ano",
                "ANO",
                "ano_referencia",
                "data",
                "Data",
                "year",
                "anodetec",
                "periodo",
            ],
            _ => COMMON_YEAR,
        }
    }

    fn value_columns(self) -> &'static [&'static str] {
        match self {
            ConflictKind::ConflictAreas => &["area", "Area", "AREA", "hectares", "ha", "tamanho"],
            ConflictKind::Murders => &["assassinatos", "quantidade", "qtd", "total", "vitimas", "mortos"],
            ConflictKind::LandConflicts => &["familias", "Familias", "total_familias", "familias_envolvidas", "pessoas"],
            ConflictKind::SlaveLabor => &[
                "trabalhadores",
                "quantidade",
                "total",
                "pessoas",
                "vitimas",
                "libertados",
                "qtd_pessoas",
                "numero",
            ],
        }
    }
}

/// Conflict tallies of one municipality
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MunicipalityConflicts {
    pub municipality: String,
    pub conflict_areas: u64,
    pub murders: u64,
    pub land_conflicts: u64,
    pub slave_labor: u64,
    pub total_occurrences: u64,
    pub total_families: u64,
}

impl MunicipalityConflicts {
    fn slot(&mut self, kind: ConflictKind) -> &mut u64 {
        match kind {
            ConflictKind::ConflictAreas => &mut self.conflict_areas,
            ConflictKind::Murders => &mut self.murders,
            ConflictKind::LandConflicts => &mut self.land_conflicts,
            ConflictKind::SlaveLabor => &mut self.slave_labor,
        }
    }
}

/// Records of one kind in one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyConflicts {
    pub year: i32,
    pub kind: ConflictKind,
    pub count: usize,
}

/// Result of [`summarize_conflicts`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConflictReport {
    /// Sorted by `total_occurrences`, highest first
    pub municipalities: Vec<MunicipalityConflicts>,
    pub yearly: Vec<YearlyConflicts>,
    pub total_occurrences: u64,
}

/// Cleaned row of a CPT table
struct ConflictRecord<'a> {
    municipality: String,
    year: i32,
    row: &'a Record,
}

/// Resolve columns and keep the usable rows of one table
fn clean_rows<'a>(kind: ConflictKind, table: &'a Table) -> Option<Vec<ConflictRecord<'a>>> {
    let (Some(mun_col), Some(year_col)) = (
        table.find_column(kind.municipality_columns()),
        table.find_column(kind.year_columns()),
    ) else {
        warn!(?kind, "municipality or year column not found, table skipped");
        return None;
    };
    let state_col = STATE_COLUMNS.iter().find(|c| table.has_column(c)).copied();

    let rows = table
        .rows
        .iter()
        .filter_map(|row| {
            let municipality = title_case(row.get(mun_col)?.as_text()?.trim());
            if MUNICIPALITY_PLACEHOLDERS.contains(&municipality.as_str()) || municipality.chars().count() <= 2 {
                return None;
            }
            if let Some(col) = state_col {
                row.get(col).and_then(|v| v.as_text()).and_then(|s| clean_state(&s))?;
            }
            let year = row.get(year_col)?.as_f64()?;
            if !(year > 1980.0 && year < 2030.0) {
                return None;
            }
            Some(ConflictRecord {
                municipality,
                year: year as i32,
                row,
            })
        })
        .collect();
    Some(rows)
}

/// Per-municipality value of one kind, and families for land conflicts
fn tally(kind: ConflictKind, table: &Table, rows: &[ConflictRecord<'_>]) -> BTreeMap<String, (u64, f64)> {
    let value_col = table.find_column(kind.value_columns());
    let mut out: BTreeMap<String, (f64, usize, f64)> = BTreeMap::new();
    for r in rows {
        let e = out.entry(r.municipality.clone()).or_default();
        e.1 += 1;
        if let Some(col) = value_col {
            let value = r.row.get(col).and_then(|v| v.as_f64());
            match kind {
                ConflictKind::Murders | ConflictKind::SlaveLabor => e.0 += value.unwrap_or(1.0),
                ConflictKind::LandConflicts => e.2 += value.unwrap_or(0.0),
                ConflictKind::ConflictAreas => {}
            }
        }
    }

    let uses_value = value_col.is_some() && matches!(kind, ConflictKind::Murders | ConflictKind::SlaveLabor);
    out.into_iter()
        .map(|(m, (sum, count, families))| {
            let value = if uses_value { sum.max(0.0) as u64 } else { count as u64 };
            (m, (value, families))
        })
        .collect()
}

/// Summarize CPT tables per municipality and per year.
///
/// Each table has its municipality and year columns resolved from alias
/// lists; a table missing either is skipped with a warning. Rows with a
/// placeholder or too-short municipality, an unrecognizable state (when a
/// state column exists) or a year outside (1980, 2030) are dropped.
///
/// Murders and slave labor take the sum of their value column when it
/// exists, counting non-numeric values as 1; every other kind counts
/// records. Land conflicts also add their family totals.
pub fn summarize_conflicts(tables: &HashMap<ConflictKind, Table>) -> ConflictReport {
    let mut municipalities: HashMap<String, MunicipalityConflicts> = HashMap::new();
    let mut yearly = Vec::new();

    for kind in ConflictKind::ALL {
        let Some(table) = tables.get(&kind).filter(|t| !t.is_empty()) else {
            continue;
        };
        let Some(rows) = clean_rows(kind, table) else {
            continue;
        };
        if rows.is_empty() {
            continue;
        }

        for (municipality, (value, families)) in tally(kind, table, &rows) {
            let entry = municipalities
                .entry(municipality.clone())
                .or_insert_with(|| MunicipalityConflicts {
                    municipality,
                    ..Default::default()
                });
            *entry.slot(kind) = value;
            entry.total_occurrences += value;
            if kind == ConflictKind::LandConflicts {
                entry.total_families += families.max(0.0) as u64;
            }
        }

        let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
        for r in &rows {
            *per_year.entry(r.year).or_default() += 1;
        }
        yearly.extend(per_year.into_iter().map(|(year, count)| YearlyConflicts { year, kind, count }));
        debug!(?kind, rows = rows.len(), "conflict table summarized");
    }

    let mut municipalities: Vec<MunicipalityConflicts> = municipalities.into_values().collect();
    municipalities.sort_by(|a, b| {
        b.total_occurrences
            .cmp(&a.total_occurrences)
            .then_with(|| a.municipality.cmp(&b.municipality))
    });
    let total_occurrences = municipalities.iter().map(|m| m.total_occurrences).sum();

    ConflictReport {
        municipalities,
        yearly,
        total_occurrences,
    }
}
