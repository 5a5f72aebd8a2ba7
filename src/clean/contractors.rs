use std::sync::LazyLock;

use regex::Regex;

use crate::records::ContractorRow;

static SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*/\s*").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Former-name notes, closed or left open at the end of the name.
static NOTE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\(\s*FORMERLY\s*:.*?\)",
        r"(?i)\(\s*FORM\s*:.*?\)",
        r"(?i)\(\s*FOR\s*:.*?\)",
        r"(?i)\(\s*(FORMERLY|FOR)\s*[:\.\)]?[^)]*\)",
        r"(?i)\(\s*(FORMERLY|FOR)[^)]*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Drop `(FORMERLY: ...)`-style notes, collapse whitespace and trailing
/// separators. Internal punctuation such as `INC.` is kept.
pub fn clean_contractor_name(raw: &str) -> String {
    let mut name = raw.to_string();
    for re in NOTE_RES.iter() {
        name = re.replace_all(&name, "").into_owned();
    }
    let collapsed = WS_RE.replace_all(&name, " ");
    collapsed
        .trim()
        .trim_end_matches([' ', ',', ';', '/'])
        .to_string()
}

/// One row per contractor of a contract. Joint ventures are listed with
/// `/` between members; commas stay inside names.
pub fn split_contractors(contract_id: &str, raw: &str) -> Vec<ContractorRow> {
    let names: Vec<String> = SPLIT_RE
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(clean_contractor_name)
        .filter(|s| !s.is_empty())
        .collect();

    let contract_type = if names.len() == 1 { "solo" } else { "multiple" };
    names
        .into_iter()
        .map(|contractor| ContractorRow {
            contract_id: contract_id.to_string(),
            contractor,
            contract_type: contract_type.to_string(),
        })
        .collect()
}
