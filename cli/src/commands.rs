//! `pricectl` subcommand implementations.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use storefront_common::{supported_currencies, CurrencyCode, Money};
use storefront_display::{PriceDisplay, PriceView};
use storefront_fx::{convert_and_format, format_price, RateSource};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch::Receiver;

use crate::app::PricingApp;

#[derive(Debug, Serialize)]
struct RatesReport {
    base: CurrencyCode,
    source: RateSource,
    timestamp: DateTime<Utc>,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

/// Rate table for `base` as pretty JSON.
pub async fn rates(app: &PricingApp, base: CurrencyCode) -> anyhow::Result<String> {
    let table = app.rates().get_rates(base).await;
    let report = RatesReport {
        base: table.base,
        source: table.source,
        timestamp: table.timestamp,
        rates: table.rates.iter().map(|(code, rate)| (*code, *rate)).collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub async fn convert(
    app: &PricingApp,
    amount: Decimal,
    from: CurrencyCode,
    to: CurrencyCode,
    locale: Option<&str>,
) -> String {
    let original = format_price(amount, from, locale);
    let converted = convert_and_format(&app.converter, amount, from, to, locale).await;
    format!("{} = {}", original, converted)
}

pub fn format(amount: Decimal, currency: CurrencyCode, locale: Option<&str>) -> String {
    format_price(amount, currency, locale)
}

pub fn currencies() -> String {
    supported_currencies()
        .iter()
        .map(|info| format!("{:<4} {:<4} {:<18} {}", info.code, info.symbol, info.name, info.locale))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Persist and announce the preferred currency.
pub async fn prefer(app: &PricingApp, currency: CurrencyCode) -> anyhow::Result<String> {
    app.preference.set_preferred(currency).await?;
    Ok(format!("Preferred currency set to {} ({})", currency, currency.name()))
}

/// Render a price the way the storefront shows it on first load.
pub async fn show(
    app: &PricingApp,
    amount: Decimal,
    currency: CurrencyCode,
    locale: Option<&str>,
) -> String {
    let display = new_display(app, amount, currency, locale);
    describe(&display.mount(&app.preference).await)
}

/// Mount a live price and switch currency for every code read from `input`.
pub async fn watch<R, F>(
    app: &PricingApp,
    amount: Decimal,
    currency: CurrencyCode,
    locale: Option<&str>,
    input: R,
    mut emit: F,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str),
{
    let display = Arc::new(new_display(app, amount, currency, locale));
    emit(&describe(&display.mount(&app.preference).await));

    let mut views = display.watch();
    let mounted = display.clone().attach(app.preference.subscribe());

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let target = match line.parse::<CurrencyCode>() {
            Ok(target) => target,
            Err(e) => {
                emit(&e.to_string());
                continue;
            }
        };

        app.preference.set_preferred(target).await?;
        let view = settled(&mut views, target).await?;
        emit(&describe(&view));
    }

    mounted.unmount().await;
    Ok(())
}

fn new_display(
    app: &PricingApp,
    amount: Decimal,
    currency: CurrencyCode,
    locale: Option<&str>,
) -> PriceDisplay {
    PriceDisplay::new(
        Money::new(amount, currency),
        locale.map(str::to_string),
        app.converter.clone(),
        app.session.clone(),
    )
}

async fn settled(
    views: &mut Receiver<PriceView>,
    target: CurrencyCode,
) -> anyhow::Result<PriceView> {
    loop {
        {
            let view = views.borrow_and_update();
            if view.currency == target && !view.dimmed {
                return Ok(view.clone());
            }
        }
        views.changed().await?;
    }
}

fn describe(view: &PriceView) -> String {
    if view.unconverted {
        format!("{} (rates unavailable, amount not converted)", view.text)
    } else {
        view.text.clone()
    }
}
