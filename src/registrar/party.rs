use crate::registrar::protocol::Protocol;
use crate::registrar::registry::PartyRecord;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Composite display name of a manufacturing party:
/// `<unit> - <count> - <month/year>`.
pub const PARTY_NAME_PATTERN: &str = r"(.*) - (.*) - (.*)";

fn party_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PARTY_NAME_PATTERN).expect("valid party name regex"))
}

/// Parsed view of one party row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyCandidate {
    pub display_name: String,
    pub unit_name: String,
    pub unit_count: i64,
    pub date: String,
    pub month: u16,
}

/// Splits a party display name into its three composite fields. Names
/// that do not fit the composite shape, or whose count is not an integer,
/// yield `None`. The month comes from the first slash-delimited segment
/// of the date field and is not range-checked; an unreadable month counts
/// as zero.
pub fn parse_candidate(name: &str) -> Option<PartyCandidate> {
    let caps = party_name_re().captures(name)?;
    let unit_count: i64 = caps[2].parse().ok()?;
    let date = caps[3].to_string();
    let month = date
        .split('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .unwrap_or(0);

    Some(PartyCandidate {
        display_name: name.to_string(),
        unit_name: caps[1].to_string(),
        unit_count,
        date,
        month,
    })
}

/// Picks the most recent manufacturing party for the protocol's unit and
/// year: rows matching `<unit>.*<year>` case-insensitively, parsed into
/// candidates, maximum by month. Ties on month are broken by unit count
/// and then display name, so the result does not depend on row order.
pub fn select_party(rows: &[PartyRecord], protocol: &Protocol) -> Result<Option<PartyCandidate>> {
    let pattern = protocol.party_pattern();
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("invalid party search pattern `{pattern}`"))?;

    Ok(rows
        .iter()
        .filter(|row| re.is_match(&row.name))
        .filter_map(|row| parse_candidate(&row.name))
        .max_by(|a, b| {
            (a.month, a.unit_count, &a.display_name).cmp(&(b.month, b.unit_count, &b.display_name))
        }))
}
