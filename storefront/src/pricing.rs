// storefront/src/pricing.rs

//! Server-side order pricing. All amounts are integer minor currency units.

use crate::errors::{AppError, Result};
use crate::models::{CartLine, Product};
use serde::Serialize;
use std::collections::HashMap;

/// Subtotals strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 10_000;
pub const FLAT_SHIPPING_FEE: i64 = 999;
pub const TAX_RATE: f64 = 0.08;

pub fn to_minor_units(price: f64) -> i64 {
  (price * 100.0).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
  pub subtotal: i64,
  pub shipping_fee: i64,
  pub tax: i64,
  pub total: i64,
}

impl PriceBreakdown {
  pub fn for_subtotal(subtotal: i64) -> Self {
    let shipping_fee = if subtotal > FREE_SHIPPING_THRESHOLD { 0 } else { FLAT_SHIPPING_FEE };
    let tax = (subtotal as f64 * TAX_RATE).round() as i64;
    Self {
      subtotal,
      shipping_fee,
      tax,
      total: subtotal + shipping_fee + tax,
    }
  }
}

/// One cart line with its price taken from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
  pub product_id: String,
  pub name: String,
  pub image: Option<String>,
  pub unit_amount: i64,
  pub quantity: i32,
}

impl PricedLine {
  pub fn line_total(&self) -> i64 {
    self.unit_amount * i64::from(self.quantity)
  }
}

/// Prices `lines` against `products`. Client-supplied prices are never consulted.
///
/// Lines for the same product are merged first, so the stock check sees the
/// total quantity asked for. Every line must reference a known product and ask
/// for at least one unit.
pub fn price_cart(lines: &[CartLine], products: &HashMap<String, Product>) -> Result<(Vec<PricedLine>, PriceBreakdown)> {
  let mut merged: Vec<(&Product, i64)> = Vec::with_capacity(lines.len());
  for line in lines {
    let product = products
      .get(&line.product_id)
      .ok_or_else(|| AppError::Validation("Products not found".to_string()))?;
    if line.quantity < 1 {
      return Err(AppError::Validation(format!("Invalid quantity for {}", product.name)));
    }
    match merged.iter_mut().find(|(p, _)| p.id == product.id) {
      Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
      None => merged.push((product, line.quantity)),
    }
  }

  let mut priced = Vec::with_capacity(merged.len());
  for (product, quantity) in merged {
    if quantity > i64::from(product.stock) {
      return Err(AppError::Validation(format!(
        "Only {} of {} left in stock",
        product.stock.max(0),
        product.name
      )));
    }
    priced.push(PricedLine {
      product_id: product.id.clone(),
      name: product.name.clone(),
      image: product.image.clone().filter(|i| !i.is_empty()),
      unit_amount: to_minor_units(product.price),
      // Bounded by stock, which is an i32.
      quantity: quantity as i32,
    });
  }
  let subtotal = priced.iter().map(PricedLine::line_total).sum();
  Ok((priced, PriceBreakdown::for_subtotal(subtotal)))
}
