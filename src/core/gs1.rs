//! Keyword lookup of common Egyptian GS1/EGS codes.

use super::types::DEFAULT_GS1_CODE;

/// (keywords, code) pairs, checked in order. Keywords are lowercase
/// English or Arabic.
static KEYWORD_CODES: &[(&[&str], &str)] = &[
    (&["software", "برمجيات"], "6220100000"),
    (&["consulting", "استشارات"], "7020100000"),
    (&["training", "تدريب"], "8559100000"),
    (&["hardware", "computer"], "4741000000"),
    (&["medical", "طبي"], "8620100000"),
    (&["legal", "قانوني"], "6910100000"),
    (&["accounting", "محاسبة"], "6920100000"),
    (&["engineering", "هندسة"], "7112100000"),
    (&["construction", "بناء"], "4100100000"),
    (&["food", "طعام"], "5610100000"),
    (&["transport", "نقل"], "4922100000"),
];

/// Pick a GS1/EGS code from a free-text line description.
///
/// Returns the generic service code "10000000" when no keyword matches.
pub fn map_to_gs1_code(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    KEYWORD_CODES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(DEFAULT_GS1_CODE, |(_, code)| *code)
}
