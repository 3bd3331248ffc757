// storefront/src/lib.rs

//! Storefront checkout service.
//!
//! Two sagas carry the order lifecycle. The checkout saga turns an
//! authenticated cart into a `pending_payment` order with a hosted payment
//! session. The webhook saga applies the gateway's verdict to that order.
//! Everything outside the process sits behind the traits in [`services`].

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod pricing;
pub mod services;
pub mod state;
pub mod web;
