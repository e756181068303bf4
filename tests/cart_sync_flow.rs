use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use storefront_api::commerce::cart::CartRemote;
use storefront_api::config::ShippingConfig;
use storefront_api::error::{AppError, AppResult};
use storefront_api::models::{CartLine, CartSnapshot, DiscountCode, NewCartItem};
use storefront_api::persistence::{CartStore, MemoryCartStore, PersistedCart};
use storefront_api::services::cart_sync::CartSynchronizer;

/// Scripted stand-in for the commerce backend: holds one server cart,
/// merges lines by variant the way the real backend does, and can be told
/// to fail or to forget the cart entirely.
#[derive(Default)]
struct ScriptedRemote {
    state: Mutex<RemoteState>,
}

#[derive(Default)]
struct RemoteState {
    lines: Vec<ServerLine>,
    codes: Vec<String>,
    cart_exists: bool,
    cart_lost: bool,
    fail_next: Option<FailMode>,
    /// code -> (applicable, amount off the subtotal)
    discounts: HashMap<String, (bool, Decimal)>,
    calls: Vec<&'static str>,
}

#[derive(Clone)]
struct ServerLine {
    id: String,
    variant_id: String,
    unit_price: Decimal,
    quantity: u32,
}

enum FailMode {
    Unavailable,
    CartNotFound,
}

const CART_ID: &str = "cart-1";

impl ScriptedRemote {
    fn with_discount(code: &str, applicable: bool, amount: Decimal) -> Self {
        let remote = Self::default();
        remote
            .state
            .lock()
            .unwrap()
            .discounts
            .insert(code.to_string(), (applicable, amount));
        remote
    }

    fn fail_next(&self, mode: FailMode) {
        self.state.lock().unwrap().fail_next = Some(mode);
    }

    fn lose_cart(&self) {
        self.state.lock().unwrap().cart_lost = true;
    }

    fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    fn check_failures(state: &mut RemoteState) -> AppResult<()> {
        if let Some(mode) = state.fail_next.take() {
            return Err(match mode {
                FailMode::Unavailable => AppError::RemoteUnavailable,
                FailMode::CartNotFound => AppError::CartNotFound,
            });
        }
        if state.cart_lost {
            return Err(AppError::CartNotFound);
        }
        Ok(())
    }

    fn snapshot(state: &RemoteState) -> CartSnapshot {
        let raw_subtotal: Decimal = state
            .lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();
        let discount: Decimal = state
            .codes
            .iter()
            .filter_map(|code| state.discounts.get(code))
            .filter(|(applicable, _)| *applicable)
            .map(|(_, amount)| *amount)
            .sum();

        CartSnapshot {
            id: CART_ID.to_string(),
            checkout_url: "https://checkout.example/c/1".to_string(),
            lines: state
                .lines
                .iter()
                .map(|line| CartLine {
                    id: line.id.clone(),
                    quantity: line.quantity,
                    merchandise_id: line.variant_id.clone(),
                    unit_price: line.unit_price,
                    title: format!("Product {}", line.variant_id),
                    variant_title: "Default".to_string(),
                    image_url: String::new(),
                })
                .collect(),
            subtotal_amount: raw_subtotal - discount,
            total_tax_amount: None,
            total_amount: raw_subtotal - discount,
            discount_codes: state
                .codes
                .iter()
                .map(|code| DiscountCode {
                    code: code.clone(),
                    applicable: state
                        .discounts
                        .get(code)
                        .map(|(applicable, _)| *applicable)
                        .unwrap_or(false),
                })
                .collect(),
        }
    }

    fn upsert_line(state: &mut RemoteState, variant_id: &str, quantity: u32, unit_price: Decimal) {
        match state
            .lines
            .iter()
            .position(|line| line.variant_id == variant_id)
        {
            Some(index) => state.lines[index].quantity += quantity,
            None => {
                let id = format!("line-{}", state.lines.len() + 1);
                state.lines.push(ServerLine {
                    id,
                    variant_id: variant_id.to_string(),
                    unit_price,
                    quantity,
                });
            }
        }
    }
}

/// Unit prices the "backend" knows; tests only add these variants.
fn price_of(variant_id: &str) -> Decimal {
    match variant_id {
        "V1" => Decimal::new(2500, 2),
        "V2" => Decimal::new(1050, 2),
        _ => Decimal::new(100, 2),
    }
}

impl CartRemote for ScriptedRemote {
    async fn create_cart(
        &self,
        variant_id: &str,
        quantity: u32,
        _cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("create_cart");
        Self::check_failures(&mut state)?;
        state.cart_exists = true;
        Self::upsert_line(&mut state, variant_id, quantity, price_of(variant_id));
        Ok(Self::snapshot(&state))
    }

    async fn fetch_cart(
        &self,
        _cart_id: &str,
        _cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("fetch_cart");
        Self::check_failures(&mut state)?;
        if !state.cart_exists {
            return Err(AppError::CartNotFound);
        }
        Ok(Self::snapshot(&state))
    }

    async fn add_line(
        &self,
        _cart_id: &str,
        variant_id: &str,
        quantity: u32,
        _cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("add_line");
        Self::check_failures(&mut state)?;
        Self::upsert_line(&mut state, variant_id, quantity, price_of(variant_id));
        Ok(Self::snapshot(&state))
    }

    async fn update_line_quantity(
        &self,
        _cart_id: &str,
        line_id: &str,
        quantity: u32,
        _cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("update_line_quantity");
        Self::check_failures(&mut state)?;
        match state.lines.iter_mut().find(|line| line.id == line_id) {
            Some(line) => line.quantity = quantity,
            None => return Err(AppError::LineNotFound),
        }
        Ok(Self::snapshot(&state))
    }

    async fn remove_lines(
        &self,
        _cart_id: &str,
        line_ids: &[String],
        _cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("remove_lines");
        Self::check_failures(&mut state)?;
        state.lines.retain(|line| !line_ids.contains(&line.id));
        Ok(Self::snapshot(&state))
    }

    async fn set_discount_codes(
        &self,
        _cart_id: &str,
        codes: &[String],
        _cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("set_discount_codes");
        Self::check_failures(&mut state)?;
        state.codes = codes.to_vec();
        Ok(Self::snapshot(&state))
    }
}

fn shipping_config() -> ShippingConfig {
    ShippingConfig {
        free_shipping_threshold: Decimal::new(99, 0),
        standard_cost: Decimal::new(9, 0),
        express_cost: Decimal::new(1495, 2),
    }
}

fn new_item(variant_id: &str) -> NewCartItem {
    NewCartItem {
        variant_id: variant_id.to_string(),
        title: format!("Product {variant_id}"),
        variant_label: "Default".to_string(),
        unit_price: price_of(variant_id),
        image_url: String::new(),
    }
}

type TestSync = CartSynchronizer<ScriptedRemote, MemoryCartStore>;

fn synchronizer(remote: Arc<ScriptedRemote>, store: Arc<MemoryCartStore>) -> TestSync {
    CartSynchronizer::new("session-1", remote, store, shipping_config())
}

#[tokio::test]
async fn repeated_adds_merge_into_one_entry() {
    let remote = Arc::new(ScriptedRemote::default());
    let store = Arc::new(MemoryCartStore::default());
    let mut cart = synchronizer(remote.clone(), store);
    let cancel = CancellationToken::new();

    cart.ensure_hydrated(&cancel).await.unwrap();
    cart.add_item(new_item("V1"), 1, &cancel).await.unwrap();
    cart.add_item(new_item("V1"), 2, &cancel).await.unwrap();
    let view = cart.add_item(new_item("V1"), 3, &cancel).await.unwrap();

    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].variant_id, "V1");
    assert_eq!(view.items[0].quantity, 6);
    // first add creates the cart, the rest add lines
    assert_eq!(remote.calls(), vec!["create_cart", "add_line", "add_line"]);
}

#[tokio::test]
async fn failed_mutation_rolls_back_to_previous_items() {
    let remote = Arc::new(ScriptedRemote::default());
    let store = Arc::new(MemoryCartStore::default());
    let mut cart = synchronizer(remote.clone(), store.clone());
    let cancel = CancellationToken::new();

    cart.ensure_hydrated(&cancel).await.unwrap();
    cart.add_item(new_item("V1"), 2, &cancel).await.unwrap();
    let before = cart.view().items;

    remote.fail_next(FailMode::Unavailable);
    let err = cart.add_item(new_item("V2"), 1, &cancel).await.unwrap_err();
    assert!(matches!(err, AppError::RemoteUnavailable));
    assert_eq!(cart.view().items, before);

    // the durable fallback copy holds the restored list too
    let persisted = store.load("session-1").await.unwrap().unwrap();
    assert_eq!(persisted.items, before);
}

#[tokio::test]
async fn failed_quantity_update_rolls_back() {
    let remote = Arc::new(ScriptedRemote::default());
    let store = Arc::new(MemoryCartStore::default());
    let mut cart = synchronizer(remote.clone(), store);
    let cancel = CancellationToken::new();

    cart.ensure_hydrated(&cancel).await.unwrap();
    cart.add_item(new_item("V1"), 2, &cancel).await.unwrap();
    let before = cart.view().items;

    remote.fail_next(FailMode::Unavailable);
    let err = cart.set_quantity("V1", 5, &cancel).await.unwrap_err();
    assert!(matches!(err, AppError::RemoteUnavailable));
    assert_eq!(cart.view().items, before);
}

#[tokio::test]
async fn decrementing_a_single_item_removes_it() {
    let cancel = CancellationToken::new();

    let remote_a = Arc::new(ScriptedRemote::default());
    let mut via_decrement = synchronizer(remote_a.clone(), Arc::new(MemoryCartStore::default()));
    via_decrement.ensure_hydrated(&cancel).await.unwrap();
    via_decrement.add_item(new_item("V1"), 1, &cancel).await.unwrap();
    let decremented = via_decrement.set_quantity("V1", 0, &cancel).await.unwrap();

    let remote_b = Arc::new(ScriptedRemote::default());
    let mut via_remove = synchronizer(remote_b.clone(), Arc::new(MemoryCartStore::default()));
    via_remove.ensure_hydrated(&cancel).await.unwrap();
    via_remove.add_item(new_item("V1"), 1, &cancel).await.unwrap();
    let removed = via_remove.remove_item("V1", &cancel).await.unwrap();

    assert!(decremented.items.is_empty());
    assert_eq!(decremented.items, removed.items);
    // both paths issue the same remote operation
    assert_eq!(remote_a.calls().last(), Some(&"remove_lines"));
    assert_eq!(remote_b.calls().last(), Some(&"remove_lines"));
}

#[tokio::test]
async fn quantity_update_without_server_line_is_local_only() {
    let remote = Arc::new(ScriptedRemote::default());
    let store = Arc::new(MemoryCartStore::default());

    // a cart that only ever existed client-side
    store
        .save(
            "session-1",
            &PersistedCart {
                server_cart_id: None,
                items: vec![new_item("V1").into_item(1)],
            },
        )
        .await
        .unwrap();

    let mut cart = synchronizer(remote.clone(), store);
    let cancel = CancellationToken::new();
    cart.ensure_hydrated(&cancel).await.unwrap();

    let view = cart.set_quantity("V1", 3, &cancel).await.unwrap();
    assert_eq!(view.items[0].quantity, 3);
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn coupon_requires_initialized_cart() {
    let remote = Arc::new(ScriptedRemote::default());
    let mut cart = synchronizer(remote, Arc::new(MemoryCartStore::default()));
    let cancel = CancellationToken::new();
    cart.ensure_hydrated(&cancel).await.unwrap();

    let err = cart.apply_coupon("SAVE10", &cancel).await.unwrap_err();
    assert!(matches!(err, AppError::CartNotInitialized));
}

#[tokio::test]
async fn inapplicable_coupon_reports_failure_and_sets_nothing() {
    let remote = Arc::new(ScriptedRemote::with_discount(
        "SAVE10",
        false,
        Decimal::new(1000, 2),
    ));
    let mut cart = synchronizer(remote, Arc::new(MemoryCartStore::default()));
    let cancel = CancellationToken::new();

    cart.ensure_hydrated(&cancel).await.unwrap();
    cart.add_item(new_item("V1"), 2, &cancel).await.unwrap();

    let err = cart.apply_coupon("SAVE10", &cancel).await.unwrap_err();
    assert!(matches!(err, AppError::CouponNotApplicable(_)));

    let view = cart.view();
    assert_eq!(view.applied_coupon, None);
    assert_eq!(view.pricing.discount_amount, Decimal::ZERO);
}

#[tokio::test]
async fn coupon_removal_keeps_optimistic_clear_on_failure() {
    let remote = Arc::new(ScriptedRemote::with_discount(
        "WELCOME20",
        true,
        Decimal::new(1000, 2),
    ));
    let mut cart = synchronizer(remote.clone(), Arc::new(MemoryCartStore::default()));
    let cancel = CancellationToken::new();

    cart.ensure_hydrated(&cancel).await.unwrap();
    cart.add_item(new_item("V1"), 2, &cancel).await.unwrap();
    cart.apply_coupon("WELCOME20", &cancel).await.unwrap();
    assert_eq!(cart.view().applied_coupon.as_deref(), Some("WELCOME20"));

    remote.fail_next(FailMode::Unavailable);
    let view = cart.remove_coupon(&cancel).await.unwrap();

    // deliberately no rollback here
    assert_eq!(view.applied_coupon, None);
    assert_eq!(view.pricing.discount_amount, Decimal::ZERO);
}

#[tokio::test]
async fn stale_cart_id_resets_to_empty_state() {
    let remote = Arc::new(ScriptedRemote::default());
    remote.lose_cart();
    let store = Arc::new(MemoryCartStore::default());

    store
        .save(
            "session-1",
            &PersistedCart {
                server_cart_id: Some("cart-stale".to_string()),
                items: vec![new_item("V1").into_item(2)],
            },
        )
        .await
        .unwrap();

    let mut cart = synchronizer(remote, store.clone());
    let cancel = CancellationToken::new();
    cart.ensure_hydrated(&cancel).await.unwrap();

    let view = cart.view();
    assert_eq!(view.server_cart_id, None);
    assert!(view.items.is_empty());
    // the cached copy is discarded along with the id
    assert!(store.load("session-1").await.unwrap().is_none());
}

#[tokio::test]
async fn mid_session_cart_loss_forces_full_reset() {
    let remote = Arc::new(ScriptedRemote::default());
    let store = Arc::new(MemoryCartStore::default());
    let mut cart = synchronizer(remote.clone(), store.clone());
    let cancel = CancellationToken::new();

    cart.ensure_hydrated(&cancel).await.unwrap();
    cart.add_item(new_item("V1"), 1, &cancel).await.unwrap();

    remote.fail_next(FailMode::CartNotFound);
    let err = cart.add_item(new_item("V2"), 1, &cancel).await.unwrap_err();
    assert!(matches!(err, AppError::CartNotFound));
    assert!(cart.view().items.is_empty());
    assert_eq!(cart.view().server_cart_id, None);
}

#[tokio::test]
async fn end_to_end_pricing_scenario() {
    let remote = Arc::new(ScriptedRemote::with_discount(
        "WELCOME20",
        true,
        Decimal::new(1000, 2),
    ));
    let mut cart = synchronizer(remote, Arc::new(MemoryCartStore::default()));
    let cancel = CancellationToken::new();

    cart.ensure_hydrated(&cancel).await.unwrap();

    let view = cart.add_item(new_item("V1"), 2, &cancel).await.unwrap();
    assert_eq!(view.pricing.subtotal, Decimal::new(5000, 2));
    // below the free-shipping threshold, standard fee applies
    assert_eq!(view.pricing.shipping_cost, Decimal::new(9, 0));
    assert_eq!(view.pricing.discount_amount, Decimal::ZERO);

    let view = cart.apply_coupon("WELCOME20", &cancel).await.unwrap();
    assert_eq!(view.applied_coupon.as_deref(), Some("WELCOME20"));
    assert_eq!(view.pricing.discount_amount, Decimal::new(1000, 2));
    assert_eq!(
        view.pricing.final_total,
        Decimal::new(5000, 2) + Decimal::new(9, 0) - Decimal::new(1000, 2)
    );
}

#[tokio::test]
async fn views_are_published_to_subscribers() {
    let remote = Arc::new(ScriptedRemote::default());
    let mut cart = synchronizer(remote, Arc::new(MemoryCartStore::default()));
    let cancel = CancellationToken::new();
    let views = cart.subscribe();

    cart.ensure_hydrated(&cancel).await.unwrap();
    cart.add_item(new_item("V1"), 2, &cancel).await.unwrap();

    let latest = views.borrow();
    assert_eq!(latest.total_items, 2);
    assert_eq!(latest.pricing.subtotal, Decimal::new(5000, 2));
}
