//! Live price display.
//!
//! A [`PriceDisplay`] renders one product price. It starts in the product's
//! native currency, switches to the shopper's stored preference on mount and
//! follows every later [`CurrencyChange`](crate::events::CurrencyChange).
//! While a conversion is in flight the previous text stays visible, dimmed.
//!
//! Every switch takes a new generation number. A conversion that finishes
//! after a newer switch has started is dropped, so the display always ends
//! on the most recently requested currency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use storefront_common::{CurrencyCode, Money};
use storefront_fx::{format_price, PriceConverter};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::events::CurrencySubscription;
use crate::preference::CurrencyPreference;
use crate::session::SessionRateCache;

/// Conversion state of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPhase {
    Idle,
    Converting,
}

/// What a display currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceView {
    pub text: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    /// Rendered at reduced opacity because a conversion is pending.
    pub dimmed: bool,
    /// Amount was not actually converted (identity rate).
    pub unconverted: bool,
}

/// A single price shown to the shopper.
pub struct PriceDisplay {
    id: Uuid,
    native: Money,
    locale: Option<String>,
    converter: Arc<PriceConverter>,
    session: Arc<SessionRateCache>,
    phase: RwLock<DisplayPhase>,
    generation: AtomicU64,
    view_tx: watch::Sender<PriceView>,
}

impl PriceDisplay {
    pub fn new(
        native: Money,
        locale: Option<String>,
        converter: Arc<PriceConverter>,
        session: Arc<SessionRateCache>,
    ) -> Self {
        let initial = render(native.value, native.currency, locale.as_deref(), false);
        let (view_tx, _) = watch::channel(initial);

        Self {
            id: Uuid::new_v4(),
            native,
            locale,
            converter,
            session,
            phase: RwLock::new(DisplayPhase::Idle),
            generation: AtomicU64::new(0),
            view_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn native(&self) -> &Money {
        &self.native
    }

    pub fn phase(&self) -> DisplayPhase {
        *self.phase.read()
    }

    pub fn view(&self) -> PriceView {
        self.view_tx.borrow().clone()
    }

    /// Receiver that observes every view update.
    pub fn watch(&self) -> watch::Receiver<PriceView> {
        self.view_tx.subscribe()
    }

    /// Apply the stored preference, converting if it differs from the
    /// native currency.
    pub async fn mount(&self, preference: &CurrencyPreference) -> PriceView {
        match preference.preferred().await {
            Some(currency) if currency != self.native.currency => self.convert_to(currency).await,
            _ => self.view(),
        }
    }

    /// Show the price in `target`.
    ///
    /// Returns the view computed for `target`. If another switch started
    /// while this one awaited rates, that view is returned but not shown.
    #[instrument(skip(self), fields(display_id = %self.id, native = %self.native))]
    pub async fn convert_to(&self, target: CurrencyCode) -> PriceView {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if target == self.native.currency {
            let view = render(self.native.value, target, self.locale.as_deref(), false);
            return self.settle(view, generation);
        }

        *self.phase.write() = DisplayPhase::Converting;
        self.view_tx.send_modify(|view| view.dimmed = true);

        let quote = self
            .session
            .resolve(&self.converter, self.native.currency, target)
            .await;
        if quote.fallback {
            warn!(target = %target, "Showing unconverted amount in target currency");
        }

        let view = match quote.try_apply(self.native.value) {
            Some(amount) => render(amount, target, self.locale.as_deref(), quote.fallback),
            None => {
                warn!(target = %target, "Converted amount overflows, showing unconverted amount");
                render(self.native.value, target, self.locale.as_deref(), true)
            }
        };
        debug!(text = %view.text, "Price converted");
        self.settle(view, generation)
    }

    fn settle(&self, view: PriceView, generation: u64) -> PriceView {
        let mut phase = self.phase.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(display_id = %self.id, currency = %view.currency, "Dropping superseded conversion");
            return view;
        }
        *phase = DisplayPhase::Idle;
        self.view_tx.send_replace(view.clone());
        view
    }

    /// Start following `subscription` on a background task.
    ///
    /// Changes are applied in arrival order. A [`mount`](Self::mount) still
    /// awaiting rates when a change arrives is superseded by that change.
    pub fn attach(self: Arc<Self>, mut subscription: CurrencySubscription) -> MountedPrice {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let id = self.id;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    change = subscription.recv() => match change {
                        Some(change) => {
                            self.convert_to(change.currency).await;
                        }
                        None => break,
                    },
                    _ = shutdown_rx.recv() => break,
                }
            }

            subscription.unsubscribe();
            debug!(display_id = %id, "Price display detached");
        });

        MountedPrice {
            id,
            shutdown_tx,
            handle,
        }
    }
}

fn render(amount: Decimal, currency: CurrencyCode, locale: Option<&str>, unconverted: bool) -> PriceView {
    PriceView {
        text: format_price(amount, currency, locale),
        amount,
        currency,
        dimmed: false,
        unconverted,
    }
}

/// A display attached to the currency bus. Dropping it detaches the display.
pub struct MountedPrice {
    id: Uuid,
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl MountedPrice {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop listening for currency changes and wait for the task to end.
    pub async fn unmount(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.handle.await;
    }

    pub fn is_mounted(&self) -> bool {
        !self.handle.is_finished()
    }
}
