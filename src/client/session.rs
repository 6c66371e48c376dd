use uuid::Uuid;

use super::{ApiClient, ClientError, LocalState, LocalStore};
use crate::{
    domain::{
        addresses::{Address, AddressInput},
        cart::{self, CartItem, CartTotals},
        orders::{CheckoutRequest, Order},
    },
    routes::{auth::AuthRes, cart::CartRes},
    store::UserProfile,
};

/// In-memory cart mirrored to local storage, switching between guest mode
/// (local edits only) and authenticated mode (every edit goes to the server).
pub struct CartSession {
    api: ApiClient,
    store: LocalStore,
    state: LocalState,
}

impl CartSession {
    /// Restores whatever the previous run left in `store`.
    pub async fn open(api: ApiClient, store: LocalStore) -> Result<Self, ClientError> {
        let state = store.load().await?;
        Ok(Self { api, store, state })
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.state.cart
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::compute(&self.state.cart)
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.state.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.token.is_some()
    }

    fn token(&self) -> Result<String, ClientError> {
        self.state.token.clone().ok_or(ClientError::NotLoggedIn)
    }

    async fn persist(&self) -> Result<(), ClientError> {
        self.store.save(&self.state).await
    }

    /// Drops the token, profile and cart after the server refused the token.
    async fn force_logout(&mut self) -> Result<(), ClientError> {
        tracing::info!("Server rejected the session token, logging out");
        self.state = LocalState::default();
        self.persist().await
    }

    /// Passes `result` through, forcing a logout first when it is a 401/403.
    async fn guard<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(ClientError::Unauthorized) = &result {
            self.force_logout().await?;
        }
        result
    }

    async fn adopt_server_cart(&mut self, cart: CartRes) -> Result<(), ClientError> {
        self.state.cart = cart.items;
        self.persist().await
    }

    async fn start_session(&mut self, auth: AuthRes) -> Result<UserProfile, ClientError> {
        self.state.token = Some(auth.token);
        self.state.user = Some(auth.user.clone());
        self.state.cart = auth.cart;
        self.persist().await?;
        Ok(auth.user)
    }

    /// Logs in. The server cart replaces the local cart, with no merge.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let auth = self.api.login(email, password).await?;
        self.start_session(auth).await
    }

    /// Registers and logs in. A new account has no server cart, so the guest
    /// cart is uploaded instead of being discarded.
    ///
    /// The session only starts once the upload succeeded. On failure the
    /// local guest state is left as it was.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ClientError> {
        let mut auth = self.api.register(name, email, password).await?;

        if !self.state.cart.is_empty() {
            let uploaded = self
                .api
                .replace_cart(&auth.token, self.state.cart.clone())
                .await?;
            auth.cart = uploaded.items;
        }

        self.start_session(auth).await
    }

    /// Ends the session locally. Revoking the token server-side is best effort.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        if let Some(token) = self.state.token.take() {
            if let Err(err) = self.api.logout(&token).await {
                tracing::warn!("Failed to revoke session on the server: {}", err);
            }
        }
        self.state = LocalState::default();
        self.persist().await
    }

    /// Reloads the server cart. Does nothing for guests.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let Ok(token) = self.token() else {
            return Ok(());
        };
        let result = self.api.cart(&token).await;
        let cart = self.guard(result).await?;
        self.adopt_server_cart(cart).await
    }

    pub async fn add_item(&mut self, item: CartItem) -> Result<(), ClientError> {
        match self.state.token.clone() {
            Some(token) => {
                let result = self.api.add_to_cart(&token, &item).await;
                let cart = self.guard(result).await?;
                self.adopt_server_cart(cart).await
            }
            None => {
                cart::add_item(&mut self.state.cart, item)?;
                self.persist().await
            }
        }
    }

    pub async fn update_quantity(&mut self, name: &str, quantity: u32) -> Result<(), ClientError> {
        match self.state.token.clone() {
            Some(token) => {
                let result = self.api.update_cart_item(&token, name, quantity).await;
                let cart = self.guard(result).await?;
                self.adopt_server_cart(cart).await
            }
            None => {
                cart::update_quantity(&mut self.state.cart, name, quantity)?;
                self.persist().await
            }
        }
    }

    pub async fn remove_item(&mut self, name: &str) -> Result<(), ClientError> {
        match self.state.token.clone() {
            Some(token) => {
                let result = self.api.remove_from_cart(&token, name).await;
                let cart = self.guard(result).await?;
                self.adopt_server_cart(cart).await
            }
            None => {
                cart::remove_item(&mut self.state.cart, name)?;
                self.persist().await
            }
        }
    }

    pub async fn clear(&mut self) -> Result<(), ClientError> {
        match self.state.token.clone() {
            Some(token) => {
                let result = self.api.clear_cart(&token).await;
                let cart = self.guard(result).await?;
                self.adopt_server_cart(cart).await
            }
            None => {
                self.state.cart.clear();
                self.persist().await
            }
        }
    }

    pub async fn addresses(&mut self) -> Result<Vec<Address>, ClientError> {
        let token = self.token()?;
        let result = self.api.addresses(&token).await;
        self.guard(result).await
    }

    pub async fn add_address(&mut self, input: &AddressInput) -> Result<Address, ClientError> {
        let token = self.token()?;
        let result = self.api.add_address(&token, input).await;
        self.guard(result).await
    }

    pub async fn update_address(
        &mut self,
        id: Uuid,
        input: &AddressInput,
    ) -> Result<Address, ClientError> {
        let token = self.token()?;
        let result = self.api.update_address(&token, id, input).await;
        self.guard(result).await
    }

    pub async fn remove_address(&mut self, id: Uuid) -> Result<Address, ClientError> {
        let token = self.token()?;
        let result = self.api.delete_address(&token, id).await;
        self.guard(result).await
    }

    pub async fn set_default_address(&mut self, id: Uuid) -> Result<Address, ClientError> {
        let token = self.token()?;
        let result = self.api.set_default_address(&token, id).await;
        self.guard(result).await
    }

    /// Order history, newest first.
    pub async fn orders(&mut self) -> Result<Vec<Order>, ClientError> {
        let token = self.token()?;
        let result = self.api.orders(&token).await;
        self.guard(result).await
    }

    pub async fn order(&mut self, order_id: &str) -> Result<Order, ClientError> {
        let token = self.token()?;
        let result = self.api.order(&token, order_id).await;
        self.guard(result).await
    }

    /// Places an order from the server cart. Requires a logged-in user.
    pub async fn checkout(&mut self, request: &CheckoutRequest) -> Result<Order, ClientError> {
        let token = self.token()?;
        let result = self.api.place_order(&token, request).await;
        let order = self.guard(result).await?;

        self.state.cart.clear();
        self.persist().await?;
        Ok(order)
    }
}
