use regex::Regex;
use std::sync::OnceLock;

/// Factory serial suffix letter and the manufacture year it encodes.
/// The letters A, E, F and G are never stamped.
const LETTER_YEARS: &[(&str, u16)] = &[
    ("B", 2013),
    ("C", 2014),
    ("D", 2015),
    ("H", 2016),
    ("I", 2017),
    ("J", 2018),
    ("K", 2019),
    ("L", 2020),
    ("M", 2021),
    ("N", 2022),
    ("O", 2023),
    ("P", 2024),
    ("Q", 2025),
    ("R", 2026),
    ("S", 2027),
    ("T", 2028),
    ("U", 2029),
    ("V", 2030),
    ("W", 2031),
    ("X", 2032),
    ("Y", 2033),
    ("Z", 2034),
];

/// Units whose serials carry free-form non-numeric suffixes instead of a
/// year letter.
const LETTER_EXEMPT_UNITS: &[&str] = &["ТК-021", "ТК-026"];

/// Shape of a serial ending in three digits plus one letter (123B).
pub const LETTER_SUFFIX_PATTERN: &str = r"\d{3}\D\z";

fn letter_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LETTER_SUFFIX_PATTERN).expect("valid serial suffix regex"))
}

/// Checks the manufacturer's serial/year correspondence rule.
///
/// Serials shaped like three digits plus a letter must carry the letter
/// assigned to the manufacture year. Any other non-numeric serial is only
/// accepted for the exempt units. Purely numeric serials are accepted up
/// to three digits.
pub fn serial_matches_year(serial: &str, year: u16, canonical_unit: &str) -> bool {
    if serial.chars().any(|c| !c.is_ascii_digit()) {
        if letter_suffix_re().is_match(serial) {
            // The letter is whatever follows the first three characters;
            // longer serials (00123B) leave a multi-character remainder
            // that matches no table entry.
            let suffix: String = serial.chars().skip(3).collect();
            LETTER_YEARS
                .iter()
                .any(|(letter, mapped)| *letter == suffix && *mapped == year)
        } else {
            LETTER_EXEMPT_UNITS.contains(&canonical_unit)
        }
    } else {
        serial.chars().count() <= 3
    }
}
