//! `CartSession` against an in-process stub of the storefront API.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing,
};
use chrono::Utc;
use serde_json::{Value, json};
use storefront_service::{
    client::{ApiClient, CartSession, ClientError, LocalStore},
    domain::{
        DomainError,
        addresses::{self, Address, AddressInput},
        cart::CartItem,
        orders::{self, CheckoutRequest, Order, PaymentMethod},
    },
    routes::products::ProductQuery,
};
use uuid::Uuid;

const VALID_TOKEN: &str = "valid-token";

#[derive(Clone, Default)]
struct Stub {
    server_cart: Arc<Mutex<Vec<Value>>>,
    replaced_with: Arc<Mutex<Option<Value>>>,
    reject_upload: bool,
    addresses: Arc<Mutex<Vec<Address>>>,
    orders: Arc<Mutex<Vec<Order>>>,
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({ "data": data, "message": "ok" }))
}

fn cart_body(items: &[Value]) -> Value {
    json!({
        "items": items,
        "totals": { "subtotal": 0.0, "deliveryFee": 0.0, "tax": 0.0, "total": 0.0 }
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {VALID_TOKEN}");
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
}

fn auth_body(cart: &[Value]) -> Value {
    json!({
        "token": VALID_TOKEN,
        "user": { "id": Uuid::nil(), "email": "asha@example.com", "name": "Asha" },
        "cart": cart,
        "totals": { "subtotal": 0.0, "deliveryFee": 0.0, "tax": 0.0, "total": 0.0 }
    })
}

async fn login(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    if body["password"] != "secret1" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "data": null, "message": "Invalid credentials" })),
        )
            .into_response();
    }
    let cart = stub.server_cart.lock().unwrap().clone();
    envelope(auth_body(&cart)).into_response()
}

async fn register() -> Json<Value> {
    envelope(auth_body(&[]))
}

async fn replace_cart(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    if stub.reject_upload {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "data": null, "message": "Internal server error" })),
        )
            .into_response();
    }
    let items = body["items"].as_array().cloned().unwrap_or_default();
    *stub.replaced_with.lock().unwrap() = Some(body);
    *stub.server_cart.lock().unwrap() = items.clone();
    envelope(cart_body(&items)).into_response()
}

/// Every cart edit is answered as if the token had expired.
async fn expired() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "data": null, "message": "Invalid or expired token" })),
    )
        .into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "data": null, "message": format!("{what} not found") })),
    )
        .into_response()
}

/// Answers with the address book after applying `edit`, mirroring the real handlers.
fn edit_addresses<F>(stub: &Stub, headers: &HeaderMap, edit: F) -> Response
where
    F: FnOnce(&mut Vec<Address>) -> Result<Value, DomainError>,
{
    if !authorized(headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let mut addresses = stub.addresses.lock().unwrap();
    match edit(&mut addresses) {
        Ok(data) => envelope(data).into_response(),
        Err(_) => not_found("Address"),
    }
}

async fn list_addresses(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    edit_addresses(&stub, &headers, |list| Ok(json!(list)))
}

async fn create_address(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(input): Json<AddressInput>,
) -> Response {
    edit_addresses(&stub, &headers, |list| {
        addresses::add_address(list, input).map(|a| json!(a))
    })
}

async fn update_address(
    State(stub): State<Stub>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<AddressInput>,
) -> Response {
    edit_addresses(&stub, &headers, |list| {
        addresses::update_address(list, id, input).map(|a| json!(a))
    })
}

async fn delete_address(
    State(stub): State<Stub>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    edit_addresses(&stub, &headers, |list| {
        addresses::remove_address(list, id).map(|a| json!(a))
    })
}

async fn set_default_address(
    State(stub): State<Stub>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    edit_addresses(&stub, &headers, |list| {
        addresses::set_default(list, id).map(|a| json!(a))
    })
}

async fn list_orders(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let orders = stub.orders.lock().unwrap().clone();
    envelope(json!(orders)).into_response()
}

async fn get_order(
    State(stub): State<Stub>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let orders = stub.orders.lock().unwrap();
    match orders.iter().find(|order| order.order_id == order_id) {
        Some(order) => envelope(json!(order)).into_response(),
        None => not_found("Order"),
    }
}

async fn list_products(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let neem = json!({
        "id": Uuid::nil(),
        "name": "Neem Tablets",
        "description": "Skin care",
        "price": 120.0,
        "category": "ayurvedic",
        "keywords": ["neem", "skin"],
        "image": "",
        "inStock": true,
        "isActive": true,
        "createdAt": Utc::now(),
        "updatedAt": Utc::now()
    });
    let products = match params.get("category").map(String::as_str) {
        None | Some("ayurvedic") => vec![neem],
        Some(_) => Vec::new(),
    };
    envelope(json!(products))
}

async fn logout() -> Json<Value> {
    Json(json!({ "data": null, "message": "Logged out successfully" }))
}

async fn spawn_stub(stub: Stub) -> String {
    let app = Router::new()
        .route("/auth/login", routing::post(login))
        .route("/auth/register", routing::post(register))
        .route("/auth/logout", routing::post(logout))
        .route("/cart", routing::put(replace_cart))
        .route("/cart/add", routing::post(expired))
        .route("/orders", routing::get(list_orders).post(expired))
        .route("/orders/{order_id}", routing::get(get_order))
        .route("/addresses", routing::get(list_addresses).post(create_address))
        .route(
            "/addresses/{id}",
            routing::put(update_address).delete(delete_address),
        )
        .route("/addresses/{id}/default", routing::patch(set_default_address))
        .route("/products", routing::get(list_products))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn item(name: &str, price: f64, quantity: u32) -> CartItem {
    CartItem {
        name: name.into(),
        price,
        quantity,
        image: String::new(),
    }
}

async fn session(base_url: &str, dir: &tempfile::TempDir) -> CartSession {
    CartSession::open(
        ApiClient::new(base_url),
        LocalStore::new(dir.path().join("session.json")),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn guest_cart_is_kept_locally_and_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    // No server is needed while the user is a guest.
    let mut guest = session("http://127.0.0.1:9", &dir).await;

    guest.add_item(item("Neem Tablets", 120.0, 2)).await.unwrap();
    guest.add_item(item("Neem Tablets", 120.0, 1)).await.unwrap();
    guest.add_item(item("Aloe Gel", 80.0, 1)).await.unwrap();
    guest.update_quantity("Aloe Gel", 2).await.unwrap();
    assert!(!guest.is_authenticated());
    assert_eq!(guest.cart().len(), 2);
    assert_eq!(guest.totals().subtotal, 520.0);
    assert_eq!(guest.totals().delivery_fee, 0.0);

    let restored = session("http://127.0.0.1:9", &dir).await;
    assert_eq!(restored.cart(), guest.cart());

    let mut guest = restored;
    guest.remove_item("Aloe Gel").await.unwrap();
    assert_eq!(guest.cart().len(), 1);
    assert!(matches!(
        guest.update_quantity("Neem Tablets", 0).await,
        Err(ClientError::Domain(_))
    ));

    guest.clear().await.unwrap();
    assert!(guest.cart().is_empty());
    assert_eq!(guest.totals().total, 0.0);
}

#[tokio::test]
async fn login_replaces_local_cart_with_server_cart() {
    let stub = Stub::default();
    stub.server_cart
        .lock()
        .unwrap()
        .push(json!({ "name": "Chyawanprash", "price": 300.0, "quantity": 1, "image": "" }));
    let base_url = spawn_stub(stub).await;
    let dir = tempfile::tempdir().unwrap();

    let mut session = session(&base_url, &dir).await;
    session.add_item(item("Guest Item", 10.0, 5)).await.unwrap();

    let user = session.login("asha@example.com", "secret1").await.unwrap();
    assert_eq!(user.name, "Asha");
    assert!(session.is_authenticated());
    assert_eq!(session.cart(), &[item("Chyawanprash", 300.0, 1)]);

    let stored: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("session.json")).unwrap()).unwrap();
    assert_eq!(stored["token"], VALID_TOKEN);
    assert_eq!(stored["cart"][0]["name"], "Chyawanprash");
}

#[tokio::test]
async fn failed_login_keeps_guest_state() {
    let base_url = spawn_stub(Stub::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let mut session = session(&base_url, &dir).await;
    session.add_item(item("Guest Item", 10.0, 1)).await.unwrap();

    let err = session.login("asha@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(!session.is_authenticated());
    assert_eq!(session.cart().len(), 1);
}

#[tokio::test]
async fn register_uploads_guest_cart() {
    let stub = Stub::default();
    let base_url = spawn_stub(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let mut session = session(&base_url, &dir).await;
    session.add_item(item("Tulsi Drops", 150.0, 2)).await.unwrap();
    session
        .register("Asha", "asha@example.com", "secret1")
        .await
        .unwrap();

    let uploaded = stub.replaced_with.lock().unwrap().clone().unwrap();
    assert_eq!(uploaded["items"][0]["name"], "Tulsi Drops");
    assert_eq!(uploaded["items"][0]["quantity"], 2);
    assert_eq!(session.cart(), &[item("Tulsi Drops", 150.0, 2)]);
}

#[tokio::test]
async fn failed_cart_upload_on_register_keeps_guest_cart() {
    let stub = Stub {
        reject_upload: true,
        ..Stub::default()
    };
    let base_url = spawn_stub(stub).await;
    let dir = tempfile::tempdir().unwrap();

    let mut session = session(&base_url, &dir).await;
    session.add_item(item("Tulsi Drops", 150.0, 2)).await.unwrap();

    let err = session
        .register("Asha", "asha@example.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 500, .. }));
    assert!(!session.is_authenticated());
    assert_eq!(session.cart(), &[item("Tulsi Drops", 150.0, 2)]);

    let restored = self::session(&base_url, &dir).await;
    assert!(!restored.is_authenticated());
    assert_eq!(restored.cart(), &[item("Tulsi Drops", 150.0, 2)]);
}

fn address_input(name: &str, is_default: bool) -> AddressInput {
    AddressInput {
        name: name.into(),
        phone: "9876543210".into(),
        address: "12 MG Road".into(),
        city: "Pune".into(),
        state: "Maharashtra".into(),
        pincode: "411001".into(),
        is_default,
    }
}

#[tokio::test]
async fn address_book_round_trips_through_the_server() {
    let base_url = spawn_stub(Stub::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let mut session = session(&base_url, &dir).await;
    assert!(matches!(
        session.addresses().await,
        Err(ClientError::NotLoggedIn)
    ));
    session.login("asha@example.com", "secret1").await.unwrap();

    let home = session.add_address(&address_input("Home", false)).await.unwrap();
    assert!(home.is_default);
    let office = session
        .add_address(&address_input("Office", false))
        .await
        .unwrap();
    assert!(!office.is_default);

    let office = session.set_default_address(office.id).await.unwrap();
    assert!(office.is_default);

    let renamed = session
        .update_address(home.id, &address_input("Parents", false))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Parents");

    session.remove_address(office.id).await.unwrap();
    let book = session.addresses().await.unwrap();
    assert_eq!(book.len(), 1);
    assert_eq!(book[0].id, home.id);
    assert!(book[0].is_default);

    assert!(matches!(
        session.remove_address(office.id).await,
        Err(ClientError::Api { status: 404, .. })
    ));
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn order_history_is_read_from_the_server() {
    let stub = Stub::default();
    let mut cart = vec![item("Chyawanprash", 300.0, 2)];
    let mut book = Vec::new();
    addresses::add_address(&mut book, address_input("Home", true)).unwrap();
    let placed = orders::place_order(
        &mut cart,
        &book,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Cod,
            payment_id: None,
        },
        Utc::now(),
    )
    .unwrap();
    stub.orders.lock().unwrap().push(placed.clone());

    let base_url = spawn_stub(stub).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(&base_url, &dir).await;
    assert!(matches!(session.orders().await, Err(ClientError::NotLoggedIn)));

    session.login("asha@example.com", "secret1").await.unwrap();
    assert_eq!(session.orders().await.unwrap(), vec![placed.clone()]);
    assert_eq!(session.order(&placed.order_id).await.unwrap(), placed);
    assert!(matches!(
        session.order("ORD-20260101-00000000").await,
        Err(ClientError::Api { status: 404, .. })
    ));
}

#[tokio::test]
async fn products_are_listed_without_a_session() {
    let base_url = spawn_stub(Stub::default()).await;
    let api = ApiClient::new(base_url);

    let all = api.products(&ProductQuery::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Neem Tablets");

    let query: ProductQuery = serde_json::from_value(json!({ "category": "generic" })).unwrap();
    assert!(api.products(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_token_forces_logout() {
    let base_url = spawn_stub(Stub::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let mut session = session(&base_url, &dir).await;
    session.login("asha@example.com", "secret1").await.unwrap();

    let err = session
        .add_item(item("Balm", 45.0, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!session.is_authenticated());
    assert!(session.user().is_none());
    assert!(session.cart().is_empty());

    let restored = self::session(&base_url, &dir).await;
    assert!(!restored.is_authenticated());
}

#[tokio::test]
async fn checkout_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    let mut guest = session("http://127.0.0.1:9", &dir).await;

    let request = CheckoutRequest {
        address_id: None,
        payment_method: PaymentMethod::Cod,
        payment_id: None,
    };
    assert!(matches!(
        guest.checkout(&request).await,
        Err(ClientError::NotLoggedIn)
    ));
}

#[tokio::test]
async fn logout_clears_local_state() {
    let base_url = spawn_stub(Stub::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let mut session = session(&base_url, &dir).await;
    session.login("asha@example.com", "secret1").await.unwrap();
    session.logout().await.unwrap();

    assert!(!session.is_authenticated());
    assert!(session.cart().is_empty());
}
