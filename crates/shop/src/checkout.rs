//! Checkout flow: compute a server-confirmed total, then place the order.
//!
//! ```text
//!            calculate total              ok
//!   Idle ─────────────────────► Totaling ─────► Totaled(total)
//!    ▲  ◄──────────────────────────┘ err          │   ▲    │
//!    │                                            │   │err │ place order
//!    └──────────── cart mutation ─────────────────┘   │    ▼
//!                                                  Placing ──ok──► Completed
//! ```
//!
//! [`CheckoutState`] holds the pure transitions; [`CheckoutFlow`] drives them
//! against a [`CommerceClient`]. Totaling resyncs the remote cart from
//! scratch (clear, then rebuild) so the total always reflects the local cart.

use std::fmt;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use terminal_shop_core::{OrderId, Price, VariantId};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cart::Cart;
use crate::terminal::{CommerceClient, Order, TerminalError};

// =============================================================================
// Errors
// =============================================================================

/// One remote call of the totaling batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    ClearCart,
    Item(VariantId),
    Address,
    Card,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClearCart => f.write_str("clear cart"),
            Self::Item(variant_id) => write!(f, "set item {variant_id}"),
            Self::Address => f.write_str("set address"),
            Self::Card => f.write_str("set card"),
        }
    }
}

/// A failed call within the totaling batch.
#[derive(Debug)]
pub struct SyncFailure {
    pub step: SyncStep,
    pub error: TerminalError,
}

/// The remote cart could not be rebuilt; carries every failed call.
#[derive(Debug, Error)]
#[error("{} of {attempted} cart sync calls failed: {}", .failures.len(), format_failures(.failures))]
pub struct SyncError {
    /// Number of calls issued.
    pub attempted: usize,
    /// Calls that failed, in issue order.
    pub failures: Vec<SyncFailure>,
}

fn format_failures(failures: &[SyncFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.step, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from the checkout flow. All are recoverable.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Rebuilding the remote cart failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The remote cart could not be fetched after syncing.
    #[error("Could not fetch cart total: {0}")]
    Total(#[source] TerminalError),

    /// Converting the cart into an order failed.
    #[error("Could not place order: {0}")]
    Place(#[source] TerminalError),

    /// The request does not apply in the current state.
    #[error("Cannot {action} while checkout is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
}

// =============================================================================
// State machine
// =============================================================================

/// Where a checkout flow instance stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutState {
    /// Cart editable, no total computed.
    #[default]
    Idle,
    /// Remote cart is being rebuilt.
    Totaling,
    /// Server-confirmed total is displayed.
    Totaled { total: String },
    /// Order placement in flight.
    Placing { total: String },
    /// Order placed; terminal for this flow instance.
    Completed { order_id: OrderId },
}

impl CheckoutState {
    /// Short state name for messages and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Totaling => "totaling",
            Self::Totaled { .. } => "totaled",
            Self::Placing { .. } => "placing",
            Self::Completed { .. } => "completed",
        }
    }

    /// Total shown to the user, empty unless one is valid.
    #[must_use]
    pub fn displayed_total(&self) -> &str {
        match self {
            Self::Totaled { total } | Self::Placing { total } => total,
            _ => "",
        }
    }

    /// State after a cart or selection change.
    ///
    /// A computed total no longer matches the cart, and a completed flow
    /// gives way to a fresh one.
    #[must_use]
    pub fn invalidated(self) -> Self {
        match self {
            Self::Totaled { .. } | Self::Completed { .. } => Self::Idle,
            other => other,
        }
    }

    /// Enter `Totaling` from `Idle` or `Totaled`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` while another step is in flight or after
    /// completion.
    pub fn begin_totaling(&self) -> Result<Self, CheckoutError> {
        match self {
            Self::Idle | Self::Totaled { .. } => Ok(Self::Totaling),
            other => Err(CheckoutError::InvalidState {
                action: "calculate total",
                state: other.name(),
            }),
        }
    }

    /// Enter `Placing` from `Totaled`, carrying the displayed total.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a total has been computed.
    pub fn begin_placing(&self) -> Result<Self, CheckoutError> {
        match self {
            Self::Totaled { total } => Ok(Self::Placing {
                total: total.clone(),
            }),
            other => Err(CheckoutError::InvalidState {
                action: "place order",
                state: other.name(),
            }),
        }
    }

    /// Whether this flow instance has finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

// =============================================================================
// Flow controller
// =============================================================================

/// Drives one checkout flow instance against the commerce API.
#[derive(Debug, Clone, Default)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl CheckoutFlow {
    /// Start a new flow in `Idle`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Total shown to the user, empty unless one is valid.
    #[must_use]
    pub fn total(&self) -> &str {
        self.state.displayed_total()
    }

    /// Drop any computed total after the cart changed.
    ///
    /// Returns `true` when a displayed total was blanked.
    pub fn invalidate(&mut self) -> bool {
        let had_total = !self.total().is_empty();
        self.state = std::mem::take(&mut self.state).invalidated();
        had_total
    }

    /// Rebuild the remote cart from `cart` and fetch the server total.
    ///
    /// On success the flow is `Totaled` and the formatted total is returned.
    /// On any failure the flow returns to `Idle` with no total.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when not in `Idle`/`Totaled`, `Sync` when any
    /// call of the rebuild batch failed, or `Total` when the final fetch failed.
    #[instrument(skip_all, fields(lines = cart.lines().len()))]
    pub async fn calculate_total(
        &mut self,
        client: &dyn CommerceClient,
        cart: &Cart,
    ) -> Result<String, CheckoutError> {
        self.state = self.state.begin_totaling()?;

        let result = async {
            sync_remote_cart(client, cart).await?;
            let remote = client.get_cart().await.map_err(CheckoutError::Total)?;
            Ok::<_, CheckoutError>(Price::from_cents(remote.amount.grand_total()).display())
        }
        .await;

        match result {
            Ok(total) => {
                info!(total = %total, "Cart totaled");
                self.state = CheckoutState::Totaled {
                    total: total.clone(),
                };
                Ok(total)
            }
            Err(e) => {
                warn!(error = %e, "Totaling failed");
                self.state = CheckoutState::Idle;
                Err(e)
            }
        }
    }

    /// Convert the totaled remote cart into an order.
    ///
    /// On success the flow is `Completed` and `cart` is reset. On failure the
    /// flow returns to `Totaled` with the same total and `cart` untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless `Totaled`, or `Place` when the convert
    /// call failed.
    #[instrument(skip_all)]
    pub async fn place_order(
        &mut self,
        client: &dyn CommerceClient,
        cart: &mut Cart,
    ) -> Result<Order, CheckoutError> {
        let placing = self.state.begin_placing()?;
        let total = placing.displayed_total().to_string();
        self.state = placing;

        match client.convert_cart().await {
            Ok(order) => {
                info!(order_id = %order.id, total = %total, "Order placed");
                self.state = CheckoutState::Completed {
                    order_id: order.id.clone(),
                };
                cart.reset();
                Ok(order)
            }
            Err(e) => {
                warn!(error = %e, "Order placement failed");
                self.state = CheckoutState::Totaled { total };
                Err(CheckoutError::Place(e))
            }
        }
    }
}

type SyncCall<'a> = BoxFuture<'a, (SyncStep, Result<(), TerminalError>)>;

/// Clear the remote cart, then upsert every line and both selections
/// concurrently, gathering each outcome.
async fn sync_remote_cart(client: &dyn CommerceClient, cart: &Cart) -> Result<(), SyncError> {
    // Clearing must finish before any upsert starts.
    client.clear_cart().await.map_err(|error| SyncError {
        attempted: 1,
        failures: vec![SyncFailure {
            step: SyncStep::ClearCart,
            error,
        }],
    })?;

    let mut calls: Vec<SyncCall<'_>> = Vec::with_capacity(cart.lines().len() + 2);
    for line in cart.lines() {
        calls.push(
            async move {
                let outcome = client
                    .set_cart_item(&line.variant_id, line.quantity)
                    .await
                    .map(drop);
                (SyncStep::Item(line.variant_id.clone()), outcome)
            }
            .boxed(),
        );
    }

    let address_id = cart.address_id();
    calls.push(
        async move {
            let outcome = client.set_cart_address(address_id).await.map(drop);
            (SyncStep::Address, outcome)
        }
        .boxed(),
    );

    let card_id = cart.card_id();
    calls.push(
        async move {
            let outcome = client.set_cart_card(card_id).await.map(drop);
            (SyncStep::Card, outcome)
        }
        .boxed(),
    );

    let attempted = calls.len() + 1;
    let failures: Vec<SyncFailure> = join_all(calls)
        .await
        .into_iter()
        .filter_map(|(step, outcome)| outcome.err().map(|error| SyncFailure { step, error }))
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(SyncError {
            attempted,
            failures,
        })
    }
}
