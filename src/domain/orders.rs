use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    DomainError,
    addresses::{self, Address},
    cart::{CartItem, CartTotals},
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Online,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Fulfilment status. Orders are stored as `Placed` and never rewritten here.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub items: Vec<CartItem>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub tax: f64,
    pub total: f64,
    pub delivery_address: Address,
    pub payment_method: PaymentMethod,
    pub payment_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Falls back to the default address when omitted.
    pub address_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub payment_id: Option<String>,
}

/// `ORD-YYYYMMDD-XXXXXXXX`
pub fn generate_order_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

/// Turns the cart into an order and empties it.
///
/// The cart is left untouched when the checkout is rejected.
pub fn place_order(
    cart: &mut Vec<CartItem>,
    addresses: &[Address],
    request: CheckoutRequest,
    now: DateTime<Utc>,
) -> Result<Order, DomainError> {
    if cart.is_empty() {
        return Err(DomainError::validation("Cart is empty"));
    }

    let delivery_address = match request.address_id {
        Some(id) => addresses
            .iter()
            .find(|address| address.id == id)
            .ok_or_else(|| DomainError::NotFound("Address".into()))?,
        None => addresses::default_address(addresses)
            .ok_or_else(|| DomainError::validation("A delivery address is required"))?,
    }
    .clone();

    let payment_id = request
        .payment_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    let payment_status = match (request.payment_method, &payment_id) {
        (PaymentMethod::Online, Some(_)) => PaymentStatus::Paid,
        (PaymentMethod::Online, None) => {
            return Err(DomainError::validation(
                "A payment id is required for online payment",
            ));
        }
        (PaymentMethod::Cod, _) => PaymentStatus::Pending,
    };

    let totals = CartTotals::compute(cart);
    if !totals.total.is_finite() {
        return Err(DomainError::validation("Cart total is out of range"));
    }
    let items = std::mem::take(cart);

    Ok(Order {
        order_id: generate_order_id(now),
        items,
        subtotal: totals.subtotal,
        delivery_fee: totals.delivery_fee,
        tax: totals.tax,
        total: totals.total,
        delivery_address,
        payment_method: request.payment_method,
        payment_id,
        payment_status,
        status: OrderStatus::Placed,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn address(is_default: bool) -> Address {
        Address {
            id: Uuid::new_v4(),
            name: "Home".into(),
            phone: "9876543210".into(),
            address: "12 MG Road".into(),
            city: "Pune".into(),
            state: "Maharashtra".into(),
            pincode: "411001".into(),
            is_default,
        }
    }

    fn cart() -> Vec<CartItem> {
        vec![CartItem {
            name: "Chyawanprash".into(),
            price: 300.0,
            quantity: 2,
            image: "/img/chyawanprash.png".into(),
        }]
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    fn cod() -> CheckoutRequest {
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Cod,
            payment_id: None,
        }
    }

    #[test]
    fn test_order_id_format() {
        let id = generate_order_id(now());
        assert!(id.starts_with("ORD-20260314-"));
        let suffix = &id["ORD-20260314-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_place_order_snapshots_and_clears_cart() {
        let mut cart = cart();
        let addresses = vec![address(false), address(true)];

        let order = place_order(&mut cart, &addresses, cod(), now()).unwrap();

        assert!(cart.is_empty());
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.subtotal, 600.0);
        assert_eq!(order.delivery_fee, 0.0);
        assert_eq!(order.tax, 30.0);
        assert_eq!(order.total, 630.0);
        assert_eq!(order.delivery_address, addresses[1]);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.created_at, now());
    }

    #[test]
    fn test_explicit_address_wins_over_default() {
        let mut cart = cart();
        let addresses = vec![address(true), address(false)];
        let request = CheckoutRequest {
            address_id: Some(addresses[1].id),
            ..cod()
        };

        let order = place_order(&mut cart, &addresses, request, now()).unwrap();
        assert_eq!(order.delivery_address.id, addresses[1].id);
    }

    #[test]
    fn test_online_payment_requires_payment_id() {
        let addresses = vec![address(true)];

        let mut cart = cart();
        let request = CheckoutRequest {
            payment_method: PaymentMethod::Online,
            payment_id: Some("  ".into()),
            ..cod()
        };
        assert!(matches!(
            place_order(&mut cart, &addresses, request, now()),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(cart.len(), 1);

        let request = CheckoutRequest {
            payment_method: PaymentMethod::Online,
            payment_id: Some("pay_29QQoUBi66xm2f".into()),
            ..cod()
        };
        let order = place_order(&mut cart, &addresses, request, now()).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.payment_id.as_deref(), Some("pay_29QQoUBi66xm2f"));
    }

    #[test]
    fn test_rejected_checkouts_keep_cart() {
        let mut empty = Vec::new();
        assert_eq!(
            place_order(&mut empty, &[address(true)], cod(), now()).unwrap_err(),
            DomainError::Validation("Cart is empty".into())
        );

        let mut cart = cart();
        assert!(matches!(
            place_order(&mut cart, &[], cod(), now()),
            Err(DomainError::Validation(_))
        ));

        let request = CheckoutRequest {
            address_id: Some(Uuid::new_v4()),
            ..cod()
        };
        assert!(matches!(
            place_order(&mut cart, &[address(true)], request, now()),
            Err(DomainError::NotFound(_))
        ));
        assert_eq!(cart.len(), 1);

        // A cart stored before line bounds existed can still overflow.
        let mut overflowing = vec![CartItem {
            name: "Gold Bhasma".into(),
            price: 1e308,
            quantity: 2,
            image: String::new(),
        }];
        assert!(matches!(
            place_order(&mut overflowing, &[address(true)], cod(), now()),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(overflowing.len(), 1);
    }

    #[test]
    fn test_order_wire_format() {
        let mut cart = cart();
        let order = place_order(&mut cart, &[address(true)], cod(), now()).unwrap();
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["paymentMethod"], "cod");
        assert_eq!(json["paymentStatus"], "pending");
        assert_eq!(json["status"], "placed");
        assert_eq!(json["deliveryFee"], 0.0);
        assert_eq!(json["deliveryAddress"]["isDefault"], true);
    }
}
