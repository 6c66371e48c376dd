use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::ClientError;
use crate::{
    app_error::StdResponse,
    domain::{
        addresses::{Address, AddressInput},
        cart::CartItem,
        orders::{CheckoutRequest, Order},
    },
    models::ProductEntity,
    routes::{
        auth::{AuthRes, LoginReq, RegisterReq},
        cart::{CartRes, RemoveCartItemReq, ReplaceCartReq, UpdateCartItemReq},
        products::ProductQuery,
    },
};

/// Typed HTTP client for the storefront REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and unwraps the `data` field of the response envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let message = response
                .json::<StdResponse<serde_json::Value, String>>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: StdResponse<T, String> = response.json().await?;
        body.data.ok_or_else(|| ClientError::Api {
            status: status.as_u16(),
            message: body.message.unwrap_or_else(|| "Response carried no data".into()),
        })
    }

    // Auth

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthRes, ClientError> {
        let body = RegisterReq {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        self.send(self.http.post(self.url("/auth/register")).json(&body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthRes, ClientError> {
        let body = LoginReq {
            email: email.into(),
            password: password.into(),
        };
        // A 401 here means a bad email or password, not an expired session.
        self.send(self.http.post(self.url("/auth/login")).json(&body))
            .await
            .map_err(|err| match err {
                ClientError::Unauthorized => ClientError::InvalidCredentials,
                other => other,
            })
    }

    pub async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
            status => Err(ClientError::Api {
                status: status.as_u16(),
                message: "Logout failed".into(),
            }),
        }
    }

    // Products

    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<ProductEntity>, ClientError> {
        self.send(self.http.get(self.url("/products")).query(query))
            .await
    }

    pub async fn product(&self, id: Uuid) -> Result<ProductEntity, ClientError> {
        self.send(self.http.get(self.url(&format!("/products/{id}"))))
            .await
    }

    // Cart

    pub async fn cart(&self, token: &str) -> Result<CartRes, ClientError> {
        self.send(self.http.get(self.url("/cart")).bearer_auth(token))
            .await
    }

    pub async fn replace_cart(
        &self,
        token: &str,
        items: Vec<CartItem>,
    ) -> Result<CartRes, ClientError> {
        self.send(
            self.http
                .put(self.url("/cart"))
                .bearer_auth(token)
                .json(&ReplaceCartReq { items }),
        )
        .await
    }

    pub async fn add_to_cart(&self, token: &str, item: &CartItem) -> Result<CartRes, ClientError> {
        self.send(
            self.http
                .post(self.url("/cart/add"))
                .bearer_auth(token)
                .json(item),
        )
        .await
    }

    pub async fn update_cart_item(
        &self,
        token: &str,
        name: &str,
        quantity: u32,
    ) -> Result<CartRes, ClientError> {
        let body = UpdateCartItemReq {
            name: name.into(),
            quantity,
        };
        self.send(
            self.http
                .put(self.url("/cart/update"))
                .bearer_auth(token)
                .json(&body),
        )
        .await
    }

    pub async fn remove_from_cart(&self, token: &str, name: &str) -> Result<CartRes, ClientError> {
        let body = RemoveCartItemReq { name: name.into() };
        self.send(
            self.http
                .delete(self.url("/cart/remove"))
                .bearer_auth(token)
                .json(&body),
        )
        .await
    }

    pub async fn clear_cart(&self, token: &str) -> Result<CartRes, ClientError> {
        self.send(self.http.delete(self.url("/cart/clear")).bearer_auth(token))
            .await
    }

    // Addresses

    pub async fn addresses(&self, token: &str) -> Result<Vec<Address>, ClientError> {
        self.send(self.http.get(self.url("/addresses")).bearer_auth(token))
            .await
    }

    pub async fn add_address(
        &self,
        token: &str,
        input: &AddressInput,
    ) -> Result<Address, ClientError> {
        self.send(
            self.http
                .post(self.url("/addresses"))
                .bearer_auth(token)
                .json(input),
        )
        .await
    }

    pub async fn update_address(
        &self,
        token: &str,
        id: Uuid,
        input: &AddressInput,
    ) -> Result<Address, ClientError> {
        self.send(
            self.http
                .put(self.url(&format!("/addresses/{id}")))
                .bearer_auth(token)
                .json(input),
        )
        .await
    }

    pub async fn delete_address(&self, token: &str, id: Uuid) -> Result<Address, ClientError> {
        self.send(
            self.http
                .delete(self.url(&format!("/addresses/{id}")))
                .bearer_auth(token),
        )
        .await
    }

    pub async fn set_default_address(&self, token: &str, id: Uuid) -> Result<Address, ClientError> {
        self.send(
            self.http
                .patch(self.url(&format!("/addresses/{id}/default")))
                .bearer_auth(token),
        )
        .await
    }

    // Orders

    pub async fn orders(&self, token: &str) -> Result<Vec<Order>, ClientError> {
        self.send(self.http.get(self.url("/orders")).bearer_auth(token))
            .await
    }

    pub async fn order(&self, token: &str, order_id: &str) -> Result<Order, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("/orders/{order_id}")))
                .bearer_auth(token),
        )
        .await
    }

    pub async fn place_order(
        &self,
        token: &str,
        request: &CheckoutRequest,
    ) -> Result<Order, ClientError> {
        self.send(
            self.http
                .post(self.url("/orders"))
                .bearer_auth(token)
                .json(request),
        )
        .await
    }
}
