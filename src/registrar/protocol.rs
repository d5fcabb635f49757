use crate::registrar::serial::serial_matches_year;
use crate::registrar::units::canonical_unit_name;
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Grammar of a protocol filename without its extension
/// (ПК-01.05.11-18-11-ПКВМ7), capturing document type, test date, factory
/// serial number, two-digit manufacture year and raw unit name in that
/// order. The serial group is greedy and swallows extra hyphenated
/// segments; that is part of the grammar, not an accident.
pub const FILENAME_PATTERN: &str = r"^(\w{2})-(\d{2}\.\d{2}\.\d{2})-(.*)-(\d{2})-(.*)$";

fn filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FILENAME_PATTERN).expect("valid protocol filename regex"))
}

/// Document categories encoded by the two-letter filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// ДИ, measurement data.
    MeasurementData,
    /// ПК, acceptance test protocol.
    AcceptanceProtocol,
    /// ПР, calibration protocol.
    CalibrationProtocol,
    /// СП, verification certificate.
    VerificationCertificate,
    /// ПВ, verification protocol.
    VerificationProtocol,
}

impl DocumentKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ДИ" => Some(Self::MeasurementData),
            "ПК" => Some(Self::AcceptanceProtocol),
            "ПР" => Some(Self::CalibrationProtocol),
            "СП" => Some(Self::VerificationCertificate),
            "ПВ" => Some(Self::VerificationProtocol),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::MeasurementData => "ДИ",
            Self::AcceptanceProtocol => "ПК",
            Self::CalibrationProtocol => "ПР",
            Self::VerificationCertificate => "СП",
            Self::VerificationProtocol => "ПВ",
        }
    }

    /// Opaque category identifier the external registry expects on an
    /// attached file.
    pub fn category_id(self) -> &'static str {
        match self {
            Self::MeasurementData => "{7CD55E06-7BA9-467D-8A3A-89AEC914B5BF}",
            Self::AcceptanceProtocol => "{937151F3-A501-4DE0-991E-59594D73CBE2}",
            Self::CalibrationProtocol => "{3F290A81-39F4-4DEA-83B4-B26F1B569B73}",
            Self::VerificationCertificate => "{991867CF-8D3E-4A3F-B319-8AB8CDF63739}",
            Self::VerificationProtocol => "{CD7A90AB-4BD5-4F15-B5F7-A695911E594F}",
        }
    }
}

/// One calibration-protocol document, identified entirely by its filename.
///
/// Parsed once at construction; `is_valid` is false when either the
/// filename grammar or the serial/year rule fails, and the remaining
/// fields must not be trusted in that case.
#[derive(Debug, Clone)]
pub struct Protocol {
    pub source_path: PathBuf,
    pub document_type: String,
    pub date_token: String,
    pub serial_number: String,
    pub short_year: String,
    pub raw_unit_name: String,
    pub is_valid: bool,
}

impl Protocol {
    pub fn from_path(path: &Path) -> Self {
        let mut protocol = Self {
            source_path: path.to_path_buf(),
            document_type: String::new(),
            date_token: String::new(),
            serial_number: String::new(),
            short_year: String::new(),
            raw_unit_name: String::new(),
            is_valid: false,
        };

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let Some(caps) = filename_re().captures(stem) else {
            return protocol;
        };

        protocol.document_type = caps[1].to_string();
        protocol.date_token = caps[2].to_string();
        protocol.serial_number = caps[3].to_string();
        protocol.short_year = caps[4].to_string();
        protocol.raw_unit_name = caps[5].to_string();
        protocol.is_valid = serial_matches_year(
            &protocol.serial_number,
            protocol.year(),
            protocol.canonical_unit_name(),
        );
        protocol
    }

    pub fn file_name(&self) -> &str {
        self.source_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_code(&self.document_type)
    }

    /// Test start date; the raw token survives in `date_token` even when
    /// it does not form a real calendar date.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_token, "%d.%m.%y").ok()
    }

    /// Four-digit manufacture year expanded from the two-digit token.
    pub fn year(&self) -> u16 {
        let short: u16 = self.short_year.parse().unwrap_or(0);
        if short < 90 { 2000 + short } else { 1900 + short }
    }

    pub fn canonical_unit_name(&self) -> &str {
        canonical_unit_name(&self.raw_unit_name)
    }

    /// Pattern locating this instrument's passport digest
    /// (`ПКВ/М7 № 19/2010`).
    pub fn passport_pattern(&self) -> String {
        format!(
            "{} № {}/{}",
            self.canonical_unit_name(),
            self.serial_number,
            self.year()
        )
    }

    /// Pattern locating manufacturing batches of this unit and year in the
    /// party index (`МИКО-2.3 - 6 - 12/2010`).
    pub fn party_pattern(&self) -> String {
        format!("{}.*{}", self.canonical_unit_name(), self.year())
    }
}
