//! The stateful cart core: optimistic local mutation, remote
//! reconciliation, rollback on failure, and durable write-through of the
//! item list.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::commerce::cart::CartRemote;
use crate::config::ShippingConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CartItem, CartSnapshot, NewCartItem, ShippingMethod};
use crate::persistence::{CartStore, PersistedCart};
use crate::services::pricing::{self, PriceSummary};

/// The aggregate owned by the synchronizer. `applied_coupon` mirrors the
/// remote discount list; it is only ever set from authoritative snapshots,
/// except for the short-lived optimistic clear in [`CartSynchronizer::remove_coupon`].
#[derive(Debug, Clone, Default)]
pub struct CartState {
    pub server_cart_id: Option<String>,
    pub items: Vec<CartItem>,
    pub applied_coupon: Option<String>,
    pub shipping_method: ShippingMethod,
    pub is_loading: bool,
}

/// Read model published to consumers after every state change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub server_cart_id: Option<String>,
    pub items: Vec<CartItem>,
    pub applied_coupon: Option<String>,
    pub shipping_method: ShippingMethod,
    pub total_items: u32,
    pub is_loading: bool,
    #[schema(value_type = String)]
    pub free_shipping_threshold: Decimal,
    #[serde(flatten)]
    pub pricing: PriceSummary,
}

impl CartView {
    fn of(state: &CartState, remote_subtotal: Option<Decimal>, shipping: &ShippingConfig) -> Self {
        let pricing = pricing::summarize(
            &state.items,
            state.shipping_method,
            remote_subtotal,
            shipping,
        );
        Self {
            server_cart_id: state.server_cart_id.clone(),
            items: state.items.clone(),
            applied_coupon: state.applied_coupon.clone(),
            shipping_method: state.shipping_method,
            total_items: state.items.iter().map(|item| item.quantity).sum(),
            is_loading: state.is_loading,
            free_shipping_threshold: shipping.free_shipping_threshold,
            pricing,
        }
    }
}

pub struct CartSynchronizer<R, S> {
    session: String,
    remote: Arc<R>,
    store: Arc<S>,
    shipping: ShippingConfig,
    state: CartState,
    /// Authoritative post-discount subtotal from the latest remote
    /// snapshot; the basis for discount inference.
    remote_subtotal: Option<Decimal>,
    hydrated: bool,
    views: watch::Sender<CartView>,
}

impl<R, S> CartSynchronizer<R, S>
where
    R: CartRemote,
    S: CartStore,
{
    pub fn new(
        session: impl Into<String>,
        remote: Arc<R>,
        store: Arc<S>,
        shipping: ShippingConfig,
    ) -> Self {
        let state = CartState {
            is_loading: true,
            ..CartState::default()
        };
        let (views, _) = watch::channel(CartView::of(&state, None, &shipping));
        Self {
            session: session.into(),
            remote,
            store,
            shipping,
            state,
            remote_subtotal: None,
            hydrated: false,
            views,
        }
    }

    /// Consumers (cart drawer, header badge, pages) observe one shared cart
    /// through this channel instead of holding their own copies.
    pub fn subscribe(&self) -> watch::Receiver<CartView> {
        self.views.subscribe()
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn view(&self) -> CartView {
        CartView::of(&self.state, self.remote_subtotal, &self.shipping)
    }

    fn publish(&self) {
        self.views.send_replace(self.view());
    }

    /// One-time hydration from durable storage. A stored cart id is
    /// resolved against the backend; an id the backend no longer knows
    /// forces a full reset, never a partial cart.
    pub async fn ensure_hydrated(&mut self, cancel: &CancellationToken) -> AppResult<()> {
        if self.hydrated {
            return Ok(());
        }
        self.hydrated = true;

        let persisted = match self.store.load(&self.session).await {
            Ok(persisted) => persisted.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, session = %self.session, "cart store read failed");
                PersistedCart::default()
            }
        };

        match persisted.server_cart_id {
            Some(cart_id) => {
                self.state.server_cart_id = Some(cart_id.clone());
                match self.remote.fetch_cart(&cart_id, cancel).await {
                    Ok(snapshot) => self.apply_snapshot(snapshot).await,
                    Err(AppError::CartNotFound) => {
                        tracing::info!(session = %self.session, "stored cart id expired, resetting");
                        self.reset().await;
                    }
                    Err(err) => {
                        // transient outage: show the cached items and let the
                        // next operation reconcile
                        tracing::warn!(error = %err, "cart hydration failed");
                        self.state.items = persisted.items;
                    }
                }
            }
            None => self.state.items = persisted.items,
        }

        self.state.is_loading = false;
        self.publish();
        Ok(())
    }

    pub async fn add_item(
        &mut self,
        item: NewCartItem,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> AppResult<CartView> {
        if quantity == 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let previous = self.state.items.clone();

        match self
            .state
            .items
            .iter()
            .position(|existing| existing.variant_id == item.variant_id)
        {
            Some(index) => self.state.items[index].quantity += quantity,
            None => self.state.items.push(item.clone().into_item(quantity)),
        }
        self.persist().await;
        self.publish();

        let result = match self.state.server_cart_id.clone() {
            None => self.remote.create_cart(&item.variant_id, quantity, cancel).await,
            Some(cart_id) => {
                self.remote
                    .add_line(&cart_id, &item.variant_id, quantity, cancel)
                    .await
            }
        };

        match result {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot).await;
                Ok(self.view())
            }
            Err(err) => Err(self.recover(err, previous).await),
        }
    }

    /// Quantity below 1 is a removal, not a zero-quantity line.
    pub async fn set_quantity(
        &mut self,
        variant_id: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> AppResult<CartView> {
        if quantity < 1 {
            return self.remove_item(variant_id, cancel).await;
        }

        let previous = self.state.items.clone();

        let line_id = match self
            .state
            .items
            .iter_mut()
            .find(|item| item.variant_id == variant_id)
        {
            Some(item) => {
                item.quantity = quantity;
                item.server_line_id.clone()
            }
            None => return Err(AppError::NotFound),
        };
        self.persist().await;
        self.publish();

        // a line the server has not acknowledged has nothing to update remotely
        let (Some(cart_id), Some(line_id)) = (self.state.server_cart_id.clone(), line_id) else {
            return Ok(self.view());
        };

        match self
            .remote
            .update_line_quantity(&cart_id, &line_id, quantity, cancel)
            .await
        {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot).await;
                Ok(self.view())
            }
            Err(err) => Err(self.recover(err, previous).await),
        }
    }

    pub async fn remove_item(
        &mut self,
        variant_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<CartView> {
        let previous = self.state.items.clone();

        let line_id = match previous.iter().find(|item| item.variant_id == variant_id) {
            Some(item) => item.server_line_id.clone(),
            None => return Err(AppError::NotFound),
        };

        self.state.items.retain(|item| item.variant_id != variant_id);
        self.persist().await;
        self.publish();

        let (Some(cart_id), Some(line_id)) = (self.state.server_cart_id.clone(), line_id) else {
            return Ok(self.view());
        };

        match self
            .remote
            .remove_lines(&cart_id, &[line_id], cancel)
            .await
        {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot).await;
                Ok(self.view())
            }
            Err(err) => Err(self.recover(err, previous).await),
        }
    }

    /// A coupon needs a server cart to attach to. Success is reported only
    /// when the backend lists the submitted code as applicable; the call
    /// itself succeeding is not enough.
    pub async fn apply_coupon(
        &mut self,
        code: &str,
        cancel: &CancellationToken,
    ) -> AppResult<CartView> {
        let Some(cart_id) = self.state.server_cart_id.clone() else {
            return Err(AppError::CartNotInitialized);
        };

        let snapshot = self
            .remote
            .set_discount_codes(&cart_id, &[code.to_string()], cancel)
            .await?;

        let accepted = snapshot
            .discount_codes
            .iter()
            .any(|discount| discount.code.eq_ignore_ascii_case(code) && discount.applicable);
        if !accepted {
            return Err(AppError::CouponNotApplicable(
                "This discount code is not applicable to your cart.".to_string(),
            ));
        }

        self.apply_snapshot(snapshot).await;
        Ok(self.view())
    }

    /// Clears the coupon optimistically with no rollback path; a failed
    /// backend call only logs and the next authoritative snapshot governs.
    pub async fn remove_coupon(&mut self, cancel: &CancellationToken) -> AppResult<CartView> {
        let Some(cart_id) = self.state.server_cart_id.clone() else {
            return Ok(self.view());
        };

        self.state.applied_coupon = None;
        self.remote_subtotal = None;
        self.publish();

        match self.remote.set_discount_codes(&cart_id, &[], cancel).await {
            Ok(snapshot) => self.apply_snapshot(snapshot).await,
            Err(err) => {
                tracing::warn!(error = %err, "coupon removal failed upstream, keeping optimistic clear");
            }
        }
        Ok(self.view())
    }

    pub fn set_shipping_method(&mut self, method: ShippingMethod) -> CartView {
        self.state.shipping_method = method;
        self.publish();
        self.view()
    }

    pub async fn clear(&mut self) -> CartView {
        self.reset().await;
        self.publish();
        self.view()
    }

    /// Replace local state from an authoritative snapshot and persist. The
    /// remote wins on quantity, price, title and image once it holds a line.
    async fn apply_snapshot(&mut self, snapshot: CartSnapshot) {
        self.state.items = snapshot.lines.iter().map(CartItem::from_line).collect();
        self.state.applied_coupon = snapshot
            .discount_codes
            .first()
            .map(|discount| discount.code.clone());
        self.remote_subtotal = Some(snapshot.subtotal_amount);
        self.state.server_cart_id = Some(snapshot.id);
        self.persist().await;
        self.publish();
    }

    /// Rollback on remote failure. A vanished cart instead forces the full
    /// reset: there is no way to know what state the lost cart held.
    async fn recover(&mut self, err: AppError, previous: Vec<CartItem>) -> AppError {
        if matches!(err, AppError::CartNotFound) {
            self.reset().await;
        } else {
            self.state.items = previous;
            self.persist().await;
        }
        self.publish();
        err
    }

    async fn reset(&mut self) {
        self.state = CartState {
            shipping_method: self.state.shipping_method,
            ..CartState::default()
        };
        self.remote_subtotal = None;
        if let Err(err) = self.store.clear(&self.session).await {
            tracing::warn!(error = %err, session = %self.session, "cart store clear failed");
        }
    }

    /// Write-through of the current item list, independent of server sync
    /// success, so a local-only cart survives a reload.
    async fn persist(&self) {
        let record = PersistedCart {
            server_cart_id: self.state.server_cart_id.clone(),
            items: self.state.items.clone(),
        };
        if let Err(err) = self.store.save(&self.session, &record).await {
            tracing::warn!(error = %err, session = %self.session, "cart store write failed");
        }
    }
}
