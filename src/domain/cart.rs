use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DomainError, round2};

/// Orders strictly above this subtotal ship for free.
pub const FREE_DELIVERY_THRESHOLD: f64 = 500.0;
pub const DELIVERY_FEE: f64 = 50.0;
pub const TAX_RATE: f64 = 0.05;
/// Upper bounds on a single line, keeping every cart total finite.
pub const MAX_ITEM_PRICE: f64 = 1_000_000.0;
pub const MAX_QUANTITY: u32 = 1_000;

/// A line in the cart. Items are keyed by `name`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub name: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
}

fn default_quantity() -> u32 {
    1
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Item name is required"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::validation("Item price must be a non-negative number"));
        }
        if self.price > MAX_ITEM_PRICE {
            return Err(DomainError::validation(format!(
                "Item price must not exceed {MAX_ITEM_PRICE}"
            )));
        }
        validate_quantity(self.quantity)
    }
}

fn validate_quantity(quantity: u32) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::validation("Quantity must be at least 1"));
    }
    if quantity > MAX_QUANTITY {
        return Err(DomainError::validation(format!(
            "Quantity must not exceed {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub tax: f64,
    pub total: f64,
}

impl CartTotals {
    pub fn compute(items: &[CartItem]) -> Self {
        if items.is_empty() {
            return Self::default();
        }

        let subtotal = round2(items.iter().map(CartItem::line_total).sum());
        let delivery_fee = if subtotal > FREE_DELIVERY_THRESHOLD {
            0.0
        } else {
            DELIVERY_FEE
        };
        let tax = round2(subtotal * TAX_RATE);

        Self {
            subtotal,
            delivery_fee,
            tax,
            total: round2(subtotal + delivery_fee + tax),
        }
    }
}

/// Adds `item` to the cart, or bumps the quantity of the line with the same name.
pub fn add_item(cart: &mut Vec<CartItem>, mut item: CartItem) -> Result<(), DomainError> {
    item.name = item.name.trim().to_string();
    item.validate()?;

    match cart.iter_mut().find(|existing| existing.name == item.name) {
        Some(existing) => {
            let quantity = existing.quantity.saturating_add(item.quantity);
            validate_quantity(quantity)?;
            existing.quantity = quantity;
            existing.price = item.price;
            if !item.image.is_empty() {
                existing.image = item.image;
            }
        }
        None => cart.push(item),
    }

    Ok(())
}

pub fn update_quantity(
    cart: &mut [CartItem],
    name: &str,
    quantity: u32,
) -> Result<(), DomainError> {
    validate_quantity(quantity)?;

    let item = cart
        .iter_mut()
        .find(|item| item.name == name.trim())
        .ok_or_else(|| DomainError::NotFound(format!("Cart item '{}'", name.trim())))?;
    item.quantity = quantity;

    Ok(())
}

pub fn remove_item(cart: &mut Vec<CartItem>, name: &str) -> Result<CartItem, DomainError> {
    let position = cart
        .iter()
        .position(|item| item.name == name.trim())
        .ok_or_else(|| DomainError::NotFound(format!("Cart item '{}'", name.trim())))?;

    Ok(cart.remove(position))
}

/// Builds a whole cart from client-supplied lines, merging repeated names.
pub fn replace(items: Vec<CartItem>) -> Result<Vec<CartItem>, DomainError> {
    let mut cart = Vec::with_capacity(items.len());
    for item in items {
        add_item(&mut cart, item)?;
    }
    Ok(cart)
}
