use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static COORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([-\d\.]+)\s*,\s*([-\d\.]+)\)").unwrap());
static PARENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(.*?\)").unwrap());
static CITY_OF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^City\s+Of\s+(.+)").unwrap());

/// Highly urbanized and independent component cities. These are reported
/// as their own province.
const CHARTERED_CITIES: &[&str] = &[
    "Manila City", "Quezon City", "Caloocan City", "Las Piñas City", "Makati City",
    "Malabon City", "Mandaluyong City", "Marikina City", "Muntinlupa City", "Navotas City",
    "Parañaque City", "Pasay City", "Pasig City", "Taguig City", "Valenzuela City",
    "Baguio City", "Angeles City", "Olongapo City", "Lucena City", "Puerto Princesa City",
    "Iloilo City", "Bacolod City", "Cebu City", "Lapu-Lapu City", "Mandaue City", "Tacloban City",
    "Zamboanga City", "Iligan City", "Cagayan de Oro City", "Davao City", "General Santos City",
    "Butuan City", "Cotabato City", "Dagupan City", "Naga City", "Ormoc City", "Santiago City",
];

/// Reformat `M/D/YYYY` or `M/D/YY` as `MM/DD/YYYY`. Anything else is `None`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let year = raw.rsplit('/').next()?;
    let format = if year.len() == 2 { "%m/%d/%y" } else { "%m/%d/%Y" };
    NaiveDate::parse_from_str(raw, format)
        .ok()
        .map(|d| d.format("%m/%d/%Y").to_string())
}

/// Split `"(lat, lon)"` into its two numbers as written.
pub fn split_coordinates(raw: &str) -> Option<(String, String)> {
    let caps = COORDS_RE.captures(raw)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Costs are listed with thousands separators, e.g. `1,234,567.89`.
pub fn is_numeric_cost(raw: &str) -> bool {
    raw.trim().replace(',', "").parse::<f64>().is_ok_and(f64::is_finite)
}

/// Capitalize the first letter of every word; a word starts after any
/// non-letter.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// `"CITY OF MAKATI (Capital)"` → `"Makati City"`.
pub fn normalize_municipality(raw: &str) -> String {
    let stripped = PARENS_RE.replace_all(raw, "");
    let titled = title_case(stripped.trim());
    let titled = titled.trim();
    match CITY_OF_RE.captures(titled) {
        Some(caps) => format!("{} City", &caps[1]),
        None => titled.to_string(),
    }
}

/// Chartered cities replace the province they sit in.
pub fn resolve_province(province: &str, municipality: Option<&str>) -> String {
    let city = municipality.filter(|m| {
        CHARTERED_CITIES
            .iter()
            .any(|c| c.to_lowercase() == m.to_lowercase())
    });
    title_case(city.unwrap_or(province).trim())
}
