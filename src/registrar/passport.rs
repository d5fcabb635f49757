use crate::registrar::protocol::Protocol;
use crate::registrar::registry::PassportRecord;
use anyhow::{Context, Result};
use regex::RegexBuilder;

/// Finds the passport record whose digest matches the protocol's
/// `<unit> № <serial>/<year>` pattern.
///
/// Digests are plain display strings, so the search is a case-insensitive
/// unanchored regex match, and the first record in store order wins.
pub fn find_passport<'a>(
    passports: &'a [PassportRecord],
    protocol: &Protocol,
) -> Result<Option<&'a PassportRecord>> {
    let pattern = protocol.passport_pattern();
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("invalid passport search pattern `{pattern}`"))?;

    Ok(passports.iter().find(|record| re.is_match(&record.digest)))
}
