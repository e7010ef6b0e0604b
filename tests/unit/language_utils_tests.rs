/*!
 * Tests for language code utilities
 */

use bimtrans::language_utils::{get_language_name, language_codes_match, to_api_language_code, validate_language_code};

#[test]
fn test_validateLanguageCode_withKnownSpellings_shouldAccept() {
    for code in ["fr", "FR", "fra", "fre", "de", "ger", "en-GB", "EN_us", "pt-br", "zh-hans", "ja"] {
        assert!(validate_language_code(code).is_ok(), "code {}", code);
    }
}

#[test]
fn test_validateLanguageCode_withUnknownSpellings_shouldReject() {
    for code in ["", "x", "xx", "abcd", "fr-be", "en-xx"] {
        assert!(validate_language_code(code).is_err(), "code {}", code);
    }
}

#[test]
fn test_toApiLanguageCode_withThreeLetterCodes_shouldReturnTwoLetters() {
    assert_eq!(to_api_language_code("spa").unwrap(), "ES");
    assert_eq!(to_api_language_code("dut").unwrap(), "NL");
    assert_eq!(to_api_language_code("nld").unwrap(), "NL");
    assert_eq!(to_api_language_code("chi").unwrap(), "ZH");
}

#[test]
fn test_toApiLanguageCode_withVariant_shouldKeepRegion() {
    assert_eq!(to_api_language_code("en-us").unwrap(), "EN-US");
    assert_eq!(to_api_language_code("PT_pt").unwrap(), "PT-PT");
    assert_eq!(to_api_language_code("zh-Hant").unwrap(), "ZH-HANT");
}

#[test]
fn test_languageCodesMatch_withDetectedSource_shouldCompareLanguages() {
    // Detected source languages come back as bare upper-case codes
    assert!(language_codes_match("FR", "fr"));
    assert!(language_codes_match("EN", "EN-GB"));
    assert!(language_codes_match("PT", "pt-br"));
    assert!(language_codes_match("fre", "FR"));
    assert!(!language_codes_match("DE", "NL"));
    assert!(!language_codes_match("", "FR"));
}

#[test]
fn test_getLanguageName_shouldAcceptAnySpelling() {
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert_eq!(get_language_name("fre").unwrap(), "French");
    assert_eq!(get_language_name("pt-BR").unwrap(), "Portuguese");
    assert!(get_language_name("xx").is_err());
}
