//! Format and checksum rules for Egyptian identifiers.
//!
//! All functions are pure and never fail: malformed input is simply invalid.

use super::types::CustomerType;

/// Weights applied left-to-right to the nine tax number digits.
const TAX_NUMBER_WEIGHTS: [u32; 9] = [9, 8, 7, 6, 5, 4, 3, 2, 1];

/// Governorate codes allowed in positions 8-9 of a national ID.
/// 88 marks births abroad.
const GOVERNORATE_CODES: &[u8] = &[
    1, 2, 3, 4, 11, 12, 13, 14, 15, 16, 17, 18, 19, 21, 22, 23, 24, 25, 26, 27, 28, 29, 31, 32,
    33, 34, 35, 88,
];

fn is_digits(s: &str, len: std::ops::RangeInclusive<usize>) -> bool {
    len.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

fn two_digits(bytes: &[u8]) -> u8 {
    (bytes[0] - b'0') * 10 + (bytes[1] - b'0')
}

/// Validate a 9-digit ETA tax registration number.
///
/// The weighted digit sum must be divisible by 11.
///
/// ```
/// use egyvat::core::is_valid_tax_number;
///
/// assert!(is_valid_tax_number("123456789"));
/// assert!(!is_valid_tax_number("123456788"));
/// ```
pub fn is_valid_tax_number(tax_number: &str) -> bool {
    if !is_digits(tax_number, 9..=9) {
        return false;
    }
    let sum: u32 = tax_number
        .bytes()
        .zip(TAX_NUMBER_WEIGHTS)
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();
    sum % 11 == 0
}

/// Components encoded in a 14-digit Egyptian national ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NationalIdParts {
    /// Four-digit birth year (century marker 2 → 19xx, 3 → 20xx).
    pub birth_year: u16,
    pub birth_month: u8,
    pub birth_day: u8,
    pub governorate: u8,
}

/// Decode the structure of a national ID.
///
/// Layout: century(1) + YY(2) + MM(2) + DD(2) + governorate(2) +
/// sequence(4) + check digit(1). The day is checked against 1..=31 only,
/// not against the length of the given month.
pub fn parse_national_id(national_id: &str) -> Option<NationalIdParts> {
    if !is_digits(national_id, 14..=14) {
        return None;
    }
    let b = national_id.as_bytes();

    let century: u16 = match b[0] {
        b'2' => 1900,
        b'3' => 2000,
        _ => return None,
    };
    let year = u16::from(two_digits(&b[1..3]));
    let month = two_digits(&b[3..5]);
    let day = two_digits(&b[5..7]);
    let governorate = two_digits(&b[7..9]);

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    if !GOVERNORATE_CODES.contains(&governorate) {
        return None;
    }

    Some(NationalIdParts {
        birth_year: century + year,
        birth_month: month,
        birth_day: day,
        governorate,
    })
}

/// Validate the structure of a 14-digit national ID.
///
/// ```
/// use egyvat::core::is_valid_national_id;
///
/// assert!(is_valid_national_id("29001010100012"));
/// assert!(!is_valid_national_id("29013010100012")); // month 13
/// ```
pub fn is_valid_national_id(national_id: &str) -> bool {
    parse_national_id(national_id).is_some()
}

/// Validate a passport number: 6-20 ASCII letters or digits, any case.
pub fn is_valid_passport_number(passport: &str) -> bool {
    (6..=20).contains(&passport.len()) && passport.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Validate a GS1/EGS item classification code (8-16 digits).
pub fn is_valid_gs1_code(code: &str) -> bool {
    is_digits(code, 8..=16)
}

/// Validate an ETA activity code (4-5 digits).
pub fn is_valid_activity_code(code: &str) -> bool {
    is_digits(code, 4..=5)
}

/// Classify a customer from whichever credentials are present.
///
/// A valid tax number wins, then a valid national ID, then a valid
/// passport. When nothing is valid the customer is treated as `B2C`.
pub fn determine_customer_type(
    tax_number: Option<&str>,
    national_id: Option<&str>,
    passport: Option<&str>,
) -> CustomerType {
    if tax_number.is_some_and(is_valid_tax_number) {
        CustomerType::B2B
    } else if national_id.is_some_and(is_valid_national_id) {
        CustomerType::B2C
    } else if passport.is_some_and(is_valid_passport_number) {
        CustomerType::Foreign
    } else {
        CustomerType::B2C
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Tax number ---

    #[test]
    fn tax_number_checksum() {
        // 1*9 + 2*8 + ... + 9*1 = 165 = 15 * 11
        assert!(is_valid_tax_number("123456789"));
        assert!(!is_valid_tax_number("123456788"));
    }

    #[test]
    fn tax_number_all_zero_is_divisible() {
        assert!(is_valid_tax_number("000000000"));
    }

    #[test]
    fn tax_number_wrong_length() {
        assert!(!is_valid_tax_number("12345678"));
        assert!(!is_valid_tax_number("1234567890"));
        assert!(!is_valid_tax_number(""));
    }

    #[test]
    fn tax_number_non_digits() {
        assert!(!is_valid_tax_number("12345678A"));
        assert!(!is_valid_tax_number(" 23456789"));
        assert!(!is_valid_tax_number("١٢٣٤٥٦٧٨٩"));
    }

    // --- National ID ---

    #[test]
    fn national_id_parts() {
        let parts = parse_national_id("29001010100012").unwrap();
        assert_eq!(parts.birth_year, 1990);
        assert_eq!(parts.birth_month, 1);
        assert_eq!(parts.birth_day, 1);
        assert_eq!(parts.governorate, 1);
    }

    #[test]
    fn national_id_2000s_century() {
        let parts = parse_national_id("30507152101234").unwrap();
        assert_eq!(parts.birth_year, 2005);
        assert_eq!(parts.governorate, 21);
    }

    #[test]
    fn national_id_bad_month() {
        assert!(!is_valid_national_id("29013010100012"));
        assert!(!is_valid_national_id("29000010100012"));
    }

    #[test]
    fn national_id_bad_day() {
        assert!(!is_valid_national_id("29001000100012"));
        assert!(!is_valid_national_id("29001320100012"));
    }

    #[test]
    fn national_id_day_not_checked_against_month() {
        // 31 February is accepted.
        assert!(is_valid_national_id("29002310100012"));
    }

    #[test]
    fn national_id_bad_century() {
        assert!(!is_valid_national_id("19001010100012"));
        assert!(!is_valid_national_id("49001010100012"));
    }

    #[test]
    fn national_id_governorates() {
        assert!(!is_valid_national_id("19991010990012"));
        assert!(!is_valid_national_id("29001010500012"));
        assert!(!is_valid_national_id("29001011000012"));
        assert!(is_valid_national_id("29001018800012"));
        assert!(is_valid_national_id("29001013500012"));
    }

    #[test]
    fn national_id_wrong_length() {
        assert!(!is_valid_national_id("2900101010001"));
        assert!(!is_valid_national_id("290010101000123"));
    }

    // --- Passport, GS1, activity ---

    #[test]
    fn passport_rules() {
        assert!(is_valid_passport_number("A1234567"));
        assert!(is_valid_passport_number("ab12cd"));
        assert!(!is_valid_passport_number("A1234"));
        assert!(!is_valid_passport_number("A123-4567"));
        assert!(!is_valid_passport_number(&"A".repeat(21)));
    }

    #[test]
    fn gs1_length_bounds() {
        assert!(is_valid_gs1_code("10000000"));
        assert!(is_valid_gs1_code("1234567890123456"));
        assert!(!is_valid_gs1_code("1234567"));
        assert!(!is_valid_gs1_code("12345678901234567"));
        assert!(!is_valid_gs1_code("EG-12345678"));
    }

    #[test]
    fn activity_code_length_bounds() {
        assert!(is_valid_activity_code("4620"));
        assert!(is_valid_activity_code("46200"));
        assert!(!is_valid_activity_code("462"));
        assert!(!is_valid_activity_code("462000"));
    }

    // --- Customer type ---

    #[test]
    fn customer_type_precedence() {
        assert_eq!(
            determine_customer_type(Some("123456789"), Some("29001010100012"), None),
            CustomerType::B2B
        );
        assert_eq!(
            determine_customer_type(Some("123456788"), Some("29001010100012"), None),
            CustomerType::B2C
        );
        assert_eq!(
            determine_customer_type(None, None, Some("A1234567")),
            CustomerType::Foreign
        );
    }

    #[test]
    fn customer_type_fallback_is_b2c() {
        assert_eq!(determine_customer_type(None, None, None), CustomerType::B2C);
        assert_eq!(
            determine_customer_type(Some("bad"), Some("bad"), Some("x")),
            CustomerType::B2C
        );
    }
}
