pub mod auth_service;
pub mod cart_sync;
pub mod checkout_service;
pub mod marketing_service;
pub mod pricing;
pub mod product_service;
