//! Locale-aware price formatting.
//!
//! Each supported locale maps to a number layout: grouping separator,
//! decimal separator and where the currency symbol goes. Amounts are rounded
//! to the currency's minor units (none for zero-minor-unit currencies), drop
//! trailing zeros and are laid out by `rusty_money`'s formatter, so
//! `1234.50 USD` renders as `$1,234.5`.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{iso, Formatter, Money as IsoMoney, Params, Position};
use storefront_common::{CurrencyCode, Money};

use crate::converter::PriceConverter;
use crate::error::{FxError, FxResult};

const NBSP: char = '\u{00A0}';
const NARROW_NBSP: char = '\u{202F}';

// `Formatter` places separators by byte offset, so it always runs with these
// ASCII placeholders and the locale's characters are substituted afterwards.
const GROUP_PLACEHOLDER: char = ',';
const DECIMAL_PLACEHOLDER: char = '.';

/// Enough groups for the 29 integer digits a `Decimal` can hold.
const GROUPS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolPlacement {
    /// `$1,234.5`
    Prefix,
    /// `CHF 1’234.5`
    PrefixSpaced,
    /// `1.234,5 €`
    SuffixSpaced,
}

impl SymbolPlacement {
    fn positions(self) -> Vec<Position> {
        match self {
            SymbolPlacement::Prefix => vec![Position::Sign, Position::Symbol, Position::Amount],
            SymbolPlacement::PrefixSpaced => vec![
                Position::Sign,
                Position::Symbol,
                Position::Space,
                Position::Amount,
            ],
            SymbolPlacement::SuffixSpaced => vec![
                Position::Sign,
                Position::Amount,
                Position::Space,
                Position::Symbol,
            ],
        }
    }
}

/// Separators and symbol placement for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLayout {
    pub tag: &'static str,
    group: char,
    decimal: char,
    symbol: SymbolPlacement,
}

const LAYOUTS: &[NumberLayout] = &[
    NumberLayout { tag: "en-US", group: ',', decimal: '.', symbol: SymbolPlacement::Prefix },
    NumberLayout { tag: "en-GB", group: ',', decimal: '.', symbol: SymbolPlacement::Prefix },
    NumberLayout { tag: "en-CA", group: ',', decimal: '.', symbol: SymbolPlacement::Prefix },
    NumberLayout { tag: "en-AU", group: ',', decimal: '.', symbol: SymbolPlacement::Prefix },
    NumberLayout { tag: "ja-JP", group: ',', decimal: '.', symbol: SymbolPlacement::Prefix },
    NumberLayout { tag: "zh-CN", group: ',', decimal: '.', symbol: SymbolPlacement::Prefix },
    NumberLayout { tag: "ko-KR", group: ',', decimal: '.', symbol: SymbolPlacement::Prefix },
    NumberLayout { tag: "de-DE", group: '.', decimal: ',', symbol: SymbolPlacement::SuffixSpaced },
    NumberLayout { tag: "fr-FR", group: NARROW_NBSP, decimal: ',', symbol: SymbolPlacement::SuffixSpaced },
    NumberLayout { tag: "sv-SE", group: NBSP, decimal: ',', symbol: SymbolPlacement::SuffixSpaced },
    NumberLayout { tag: "de-CH", group: '’', decimal: '.', symbol: SymbolPlacement::PrefixSpaced },
];

impl NumberLayout {
    /// Look up the layout for a BCP 47 tag such as `en-US` or `de_de`.
    pub fn for_locale(tag: &str) -> FxResult<&'static NumberLayout> {
        let wanted = tag.trim().replace('_', "-");
        LAYOUTS
            .iter()
            .find(|layout| layout.tag.eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| FxError::UnsupportedLocale(tag.to_string()))
    }

    fn params(&self, currency: CurrencyCode) -> Params {
        Params {
            digit_separator: GROUP_PLACEHOLDER,
            exponent_separator: DECIMAL_PLACEHOLDER,
            separator_pattern: vec![3; GROUPS],
            positions: self.symbol.positions(),
            rounding: None,
            symbol: Some(currency.symbol()),
            code: Some(currency.code()),
        }
    }

    fn render(&self, amount: Decimal, currency: CurrencyCode) -> FxResult<String> {
        let rounded = Money::new(amount, currency).round().value.normalize();
        // Keep "-0" from picking up a sign.
        let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };

        let iso_currency =
            iso::find(currency.code()).ok_or(FxError::MissingCurrencyMetadata(currency))?;
        let formatted = Formatter::money(
            &IsoMoney::from_decimal(rounded, iso_currency),
            self.params(currency),
        );

        Ok(formatted
            .chars()
            .map(|c| match c {
                GROUP_PLACEHOLDER => self.group,
                DECIMAL_PLACEHOLDER => self.decimal,
                ' ' => NBSP,
                c => c,
            })
            .collect())
    }
}

/// Format a price, failing if the locale has no known layout.
///
/// Uses the currency's default locale when `locale` is `None`.
pub fn try_format_price(
    amount: Decimal,
    currency: CurrencyCode,
    locale: Option<&str>,
) -> FxResult<String> {
    let layout = NumberLayout::for_locale(locale.unwrap_or(currency.default_locale()))?;
    layout.render(amount, currency)
}

/// Format a price for display. Never fails: an unusable locale falls back
/// to the symbol followed by the amount fixed to two decimals.
pub fn format_price(amount: Decimal, currency: CurrencyCode, locale: Option<&str>) -> String {
    try_format_price(amount, currency, locale).unwrap_or_else(|e| {
        tracing::debug!(error = %e, currency = %currency, "Falling back to plain price format");
        fallback_format(amount, currency)
    })
}

/// `symbol + amount` with exactly two decimals.
pub fn fallback_format(amount: Decimal, currency: CurrencyCode) -> String {
    let fixed = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{}{:.2}", currency.symbol(), fixed)
}

/// Convert `amount` and format it in the target currency.
pub async fn convert_and_format(
    converter: &PriceConverter,
    amount: Decimal,
    from: CurrencyCode,
    to: CurrencyCode,
    locale: Option<&str>,
) -> String {
    let converted = converter.convert(amount, from, to).await;
    format_price(converted, to, locale)
}
