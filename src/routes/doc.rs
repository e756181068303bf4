use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            LoginRequest, LoginResponse, RecoverRequest, RegisterRequest, RegisterResponse,
            SaveCardRequest, UpdateCustomerRequest,
        },
        cart::{AddItemRequest, ApplyCouponRequest, SetQuantityRequest, SetShippingRequest},
        checkout::{CheckoutRequest, CheckoutResponse, CustomerDetails},
        newsletter::SubscribeRequest,
    },
    marketing::{NewsletterDetails, Review},
    models::{
        Address, CartItem, Customer, OrderSummary, ProductDetail, ProductSummary, ProductVariant,
        SavedCard, SelectedOption, ShippingMethod,
    },
    response::{ApiResponse, Meta},
    routes::{auth, cart, checkout, health, newsletter, products, reviews},
    services::{cart_sync::CartView, pricing::PriceSummary},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::get_cart,
        cart::add_item,
        cart::set_quantity,
        cart::remove_item,
        cart::apply_coupon,
        cart::remove_coupon,
        cart::set_shipping,
        cart::clear_cart,
        checkout::begin_checkout,
        products::list_products,
        products::get_product,
        auth::register,
        auth::login,
        auth::recover,
        auth::google_callback,
        auth::get_customer,
        auth::update_customer,
        auth::save_card,
        auth::delete_card,
        newsletter::subscribe,
        newsletter::details,
        reviews::list_reviews,
    ),
    components(schemas(
        ApiResponse<CartView>,
        Meta,
        CartItem,
        CartView,
        PriceSummary,
        ShippingMethod,
        AddItemRequest,
        SetQuantityRequest,
        ApplyCouponRequest,
        SetShippingRequest,
        CheckoutRequest,
        CheckoutResponse,
        CustomerDetails,
        ProductSummary,
        ProductDetail,
        ProductVariant,
        SelectedOption,
        RegisterRequest,
        RegisterResponse,
        LoginRequest,
        LoginResponse,
        RecoverRequest,
        UpdateCustomerRequest,
        SaveCardRequest,
        Customer,
        Address,
        OrderSummary,
        SavedCard,
        SubscribeRequest,
        NewsletterDetails,
        Review,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Cart", description = "Cart synchronization and pricing"),
        (name = "Checkout", description = "Hosted checkout hand-off"),
        (name = "Products", description = "Catalog lookups"),
        (name = "Auth", description = "Customer accounts"),
        (name = "Newsletter", description = "Marketing list"),
        (name = "Reviews", description = "Product reviews"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
