//! Supported storefront currencies and their static metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CurrencyError;

/// ISO 4217 code of a currency the storefront can display prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
    Chf,
    Cny,
    Krw,
    Sek,
}

impl CurrencyCode {
    /// Every supported currency, in display order.
    pub const ALL: [CurrencyCode; 10] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Jpy,
        CurrencyCode::Cad,
        CurrencyCode::Aud,
        CurrencyCode::Chf,
        CurrencyCode::Cny,
        CurrencyCode::Krw,
        CurrencyCode::Sek,
    ];

    /// Three-letter ISO code.
    pub fn code(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Cad => "CAD",
            CurrencyCode::Aud => "AUD",
            CurrencyCode::Chf => "CHF",
            CurrencyCode::Cny => "CNY",
            CurrencyCode::Krw => "KRW",
            CurrencyCode::Sek => "SEK",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "$",
            CurrencyCode::Eur => "€",
            CurrencyCode::Gbp => "£",
            CurrencyCode::Jpy => "¥",
            CurrencyCode::Cad => "C$",
            CurrencyCode::Aud => "A$",
            CurrencyCode::Chf => "CHF",
            CurrencyCode::Cny => "¥",
            CurrencyCode::Krw => "₩",
            CurrencyCode::Sek => "kr",
        }
    }

    /// English display name.
    pub fn name(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "US Dollar",
            CurrencyCode::Eur => "Euro",
            CurrencyCode::Gbp => "British Pound",
            CurrencyCode::Jpy => "Japanese Yen",
            CurrencyCode::Cad => "Canadian Dollar",
            CurrencyCode::Aud => "Australian Dollar",
            CurrencyCode::Chf => "Swiss Franc",
            CurrencyCode::Cny => "Chinese Yuan",
            CurrencyCode::Krw => "South Korean Won",
            CurrencyCode::Sek => "Swedish Krona",
        }
    }

    /// Locale used to format this currency when the caller supplies none.
    pub fn default_locale(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "en-US",
            CurrencyCode::Eur => "de-DE",
            CurrencyCode::Gbp => "en-GB",
            CurrencyCode::Jpy => "ja-JP",
            CurrencyCode::Cad => "en-CA",
            CurrencyCode::Aud => "en-AU",
            CurrencyCode::Chf => "de-CH",
            CurrencyCode::Cny => "zh-CN",
            CurrencyCode::Krw => "ko-KR",
            CurrencyCode::Sek => "sv-SE",
        }
    }

    /// Standard number of minor-unit digits.
    pub fn decimal_places(&self) -> u32 {
        match self {
            CurrencyCode::Jpy | CurrencyCode::Krw => 0,
            _ => 2,
        }
    }

    /// Static metadata record for this currency.
    pub fn info(&self) -> CurrencyInfo {
        CurrencyInfo {
            code: *self,
            symbol: self.symbol(),
            name: self.name(),
            locale: self.default_locale(),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CurrencyCode::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CurrencyError::Unsupported(wanted.to_string()))
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Display metadata for a supported currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    pub code: CurrencyCode,
    pub symbol: &'static str,
    pub name: &'static str,
    pub locale: &'static str,
}

/// Check whether `code` is exactly the ISO code of a supported currency.
///
/// Unlike parsing, this does not trim or fold case.
pub fn is_valid_currency(code: &str) -> bool {
    CurrencyCode::ALL.iter().any(|c| c.code() == code)
}

/// Metadata for every supported currency.
pub fn supported_currencies() -> Vec<CurrencyInfo> {
    CurrencyCode::ALL.iter().map(CurrencyCode::info).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("usd".parse::<CurrencyCode>().unwrap(), CurrencyCode::Usd);
        assert_eq!(" Eur ".parse::<CurrencyCode>().unwrap(), CurrencyCode::Eur);
        assert_eq!(CurrencyCode::try_from("KRW").unwrap(), CurrencyCode::Krw);
    }

    #[test]
    fn test_invalid_currency() {
        assert!(!is_valid_currency("XYZ"));
        assert!(!is_valid_currency(""));
        assert!(!is_valid_currency("US"));
        assert!(is_valid_currency("SEK"));
        assert!(!is_valid_currency("sek"));
        assert!(!is_valid_currency(" USD "));
        // Parsing stays lenient for user input.
        assert!(" usd ".parse::<CurrencyCode>().is_ok());

        let err = "BTC".parse::<CurrencyCode>().unwrap_err();
        assert_eq!(err, CurrencyError::Unsupported("BTC".to_string()));
    }

    #[test]
    fn test_code_round_trips_through_display() {
        for code in CurrencyCode::ALL {
            assert_eq!(code.to_string().parse::<CurrencyCode>().unwrap(), code);
        }
    }

    #[test]
    fn test_supported_currencies() {
        let all = supported_currencies();
        assert_eq!(all.len(), 10);
        assert_eq!(all[0].code, CurrencyCode::Usd);
        assert_eq!(all[0].symbol, "$");
        assert_eq!(all[0].locale, "en-US");
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(CurrencyCode::Usd.decimal_places(), 2);
        assert_eq!(CurrencyCode::Jpy.decimal_places(), 0);
        assert_eq!(CurrencyCode::Krw.decimal_places(), 0);
    }

    #[test]
    fn test_serde_uses_iso_code() {
        let json = serde_json::to_string(&CurrencyCode::Gbp).unwrap();
        assert_eq!(json, "\"GBP\"");

        let parsed: CurrencyCode = serde_json::from_str("\"CHF\"").unwrap();
        assert_eq!(parsed, CurrencyCode::Chf);
    }
}
