//! Place-name normalization for Brazilian states and municipalities

/// Abbreviation and canonical name of every Brazilian state
const STATES: &[(&str, &str)] = &[
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AP", "Amapá"),
    ("AM", "Amazonas"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MT", "Mato Grosso"),
    ("MS", "Mato Grosso do Sul"),
    ("MG", "Minas Gerais"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PR", "Paraná"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RS", "Rio Grande do Sul"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("SC", "Santa Catarina"),
    ("SP", "São Paulo"),
    ("SE", "Sergipe"),
    ("TO", "Tocantins"),
];

/// Values that stand for "no state" in source tables
const STATE_PLACEHOLDERS: &[&str] = &["UF", "NAN", "NONE", "NULL", ""];

/// Resolve a state abbreviation or upper-cased full name to its canonical
/// name. `"pa"`, `"PARÁ"` and `" Pará "` all give `Some("Pará")`.
pub fn normalize_state(value: &str) -> Option<&'static str> {
    let upper = value.trim().to_uppercase();
    STATES
        .iter()
        .find(|(abbr, name)| *abbr == upper || name.to_uppercase() == upper)
        .map(|(_, name)| *name)
}

/// Stricter state cleanup for free-text sources.
///
/// Rejects placeholders, anything with digits or punctuation and values
/// shorter than two letters. Accepts abbreviations, full names (with or
/// without accents) and names written without spaces.
pub fn clean_state(value: &str) -> Option<&'static str> {
    let upper = value.trim().to_uppercase();

    if STATE_PLACEHOLDERS.contains(&upper.as_str()) {
        return None;
    }
    if !upper.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return None;
    }
    if upper.chars().filter(|c| !c.is_whitespace()).count() < 2 {
        return None;
    }

    if let Some((_, name)) = STATES.iter().find(|(abbr, _)| *abbr == upper) {
        return Some(name);
    }

    let squashed: String = fold_accents(&upper).chars().filter(|c| !c.is_whitespace()).collect();
    STATES
        .iter()
        .find(|(_, name)| {
            let canonical: String = fold_accents(name).chars().filter(|c| !c.is_whitespace()).collect();
            canonical == squashed
        })
        .map(|(_, name)| *name)
}

/// Title-case a string the way Python's `str.title` does: a letter is
/// upper-cased when it follows a non-letter, lower-cased otherwise.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_alpha = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Split a multi-municipality field on `;` and `,`, title-casing each part.
/// Empty parts are dropped.
pub fn split_municipalities(value: &str) -> Vec<String> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(title_case)
        .collect()
}

/// Lower-case and strip Portuguese diacritics, for accent-insensitive
/// name matching.
pub fn fold_accents(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
