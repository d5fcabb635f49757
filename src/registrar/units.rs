/// Maps a raw instrument-name token (as it appears in protocol filenames)
/// to the display form used by the instrument registry. Unknown tokens pass
/// through unchanged, so the mapping is total.
pub fn canonical_unit_name(raw: &str) -> &str {
    match raw {
        "МИКО1" => "МИКО-1",
        "МИКО21" => "МИКО-21",
        "МИКО2.2" => "МИКО-2.2",
        "МИКО2.3" => "МИКО-2.3",
        "МИКО7" => "МИКО-7",
        "МИКО7М" => "МИКО-7М",
        "МИКО7МА" => "МИКО-7МА",
        "МИКО8" => "МИКО-8",
        "МИКО8М" => "МИКО-8М",
        "МИКО8МА" => "МИКО-8МА",
        "МИКО9" => "МИКО-9",
        "МИКО9А" => "МИКО-9А",
        "МИКО10" => "МИКО-10",
        "ПКВМ1" => "ПКВ/М1",
        "ПКВМ2" => "ПКВ/М2",
        "ПКВМ3" => "ПКВ/М3",
        "ПКВМ4" => "ПКВ/М4",
        "ПКВМ5" => "ПКВ/М5",
        "ПКВМ5А" => "ПКВ/М5А",
        "ПКВМ5Н" => "ПКВ/М5Н",
        "ПКВМ6" => "ПКВ/М6",
        "ПКВМ6Н" => "ПКВ/М6Н",
        "ПКВМ7" => "ПКВ/М7",
        "ПКВМ16" => "ПКВ/М16",
        "ПКВУ1" => "ПКВ/У1",
        "ПКВУ2" => "ПКВ/У2",
        "ПКВУ3.0" => "ПКВ/У3.0",
        "ПКВУ3.1" => "ПКВ/У3.1",
        "ПКВУ3.0-01" => "ПКВ/У3.0-01",
        "ПКВВ1" => "ПКВ/В1",
        "ПКВВ2" => "ПКВ/В2",
        "ПКВВ3" => "ПКВ/В3",
        "ПКВВ3А" => "ПКВ/В3А",
        "ПКВ35" => "ПКВ-35",
        "ПУВ35" => "ПУВ-35",
        "ПУВ10" => "ПУВ-10",
        "ПУВ50" => "ПУВ-50",
        "ПУВрегулятор" => "ПУВ-регулятор",
        "ПКР1" => "ПКР-1",
        "ПКР2" => "ПКР-2",
        "ПКР2М" => "ПКР-2М",
        "ТК021" => "ТК-021",
        "ТК026" => "ТК-026",
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::canonical_unit_name;

    #[test]
    fn known_tokens_gain_manufacturer_separators() {
        assert_eq!(canonical_unit_name("ПКВМ7"), "ПКВ/М7");
        assert_eq!(canonical_unit_name("МИКО2.2"), "МИКО-2.2");
        assert_eq!(canonical_unit_name("ПКВУ3.0-01"), "ПКВ/У3.0-01");
        assert_eq!(canonical_unit_name("ПУВрегулятор"), "ПУВ-регулятор");
    }

    #[test]
    fn unknown_tokens_pass_through_unchanged() {
        assert_eq!(canonical_unit_name("НЕИЗВЕСТНЫЙ"), "НЕИЗВЕСТНЫЙ");
        assert_eq!(canonical_unit_name(""), "");
    }

    #[test]
    fn mapping_is_deterministic() {
        assert_eq!(
            canonical_unit_name("ТК021"),
            canonical_unit_name("ТК021")
        );
    }
}
