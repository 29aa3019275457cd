//! Common test utilities for client integration tests.
//!
//! [`FakeStoreApi`] is an in-memory stand-in for the remote commerce
//! service. It issues bearer tokens, tracks a server-side cart whose total is
//! always recomputed on its side (never by the client), and counts every
//! call so tests can assert that anonymous operations stay local.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use shopcart_client::api::{
    AuthSuccess, Cart, CartItem, HealthStatus, NewOrder, Order, OrderItem, OrderProductRef,
    Product, ProductPage, ProductQuery, ProfilePatch, User,
};
use shopcart_client::{ApiError, Credential, StoreApi};
use shopcart_core::{OrderId, OrderStatus, PaymentStatus, Price, ProductId};

pub struct Account {
    pub email: String,
    pub password: String,
    pub user: User,
}

#[derive(Default)]
struct FakeState {
    accounts: Vec<Account>,
    valid_tokens: HashSet<String>,
    issued: u32,
    cart: Vec<CartItem>,
    products: HashMap<ProductId, Product>,
    orders: Vec<Order>,
    /// When set, the next call fails with this domain error.
    fail_next: Option<(u16, String)>,
    /// Total number of calls that reached the "server".
    calls: u32,
}

#[derive(Default)]
pub struct FakeStoreApi {
    state: Mutex<FakeState>,
}

pub fn product(id: &str, name: &str, cents: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: String::new(),
        price: Price::from_cents(cents),
        images: vec![],
        brand: "Acme".to_string(),
        category: Some("gadgets".to_string()),
        rating: None,
        stock,
    }
}

pub fn user(id: &str, name: &str, email: &str) -> User {
    User {
        id: id.into(),
        name: name.to_string(),
        email: email.to_string(),
        role: "customer".to_string(),
        address: None,
    }
}

impl FakeStoreApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the default test account and catalog.
    pub fn seeded() -> Self {
        let fake = Self::new();
        fake.add_account("alice@example.com", "hunter2", user("u1", "Alice", "alice@example.com"));
        fake.add_product(product("p1", "Mechanical Keyboard", 8999, 10));
        fake.add_product(product("p2", "Trackball", 4950, 3));
        fake
    }

    pub fn add_account(&self, email: &str, password: &str, user: User) {
        self.lock().accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            user,
        });
    }

    pub fn add_product(&self, product: Product) {
        self.lock().products.insert(product.id.clone(), product);
    }

    /// Issue a token directly, as if a previous process had logged in.
    pub fn issue_token(&self, token: &str) {
        self.lock().valid_tokens.insert(token.to_string());
    }

    /// Revoke every issued token; subsequent authorized calls return 401.
    pub fn revoke_all_tokens(&self) {
        self.lock().valid_tokens.clear();
    }

    /// Make the next call fail with a server-reported domain error.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.lock().fail_next = Some((status, message.to_string()));
    }

    /// Number of calls that reached the fake server.
    pub fn calls(&self) -> u32 {
        self.lock().calls
    }

    pub fn server_cart_len(&self) -> usize {
        self.lock().cart.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Count the call and pop any injected failure.
    fn enter(&self) -> Result<std::sync::MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.lock();
        state.calls += 1;
        if let Some((status, message)) = state.fail_next.take() {
            return Err(ApiError::Api { status, message });
        }
        Ok(state)
    }
}

fn authorize(state: &FakeState, credential: &Credential) -> Result<User, ApiError> {
    if !state.valid_tokens.contains(credential.expose()) {
        return Err(ApiError::Unauthorized);
    }
    // Single-user fakes: the token always belongs to the first account.
    state
        .accounts
        .first()
        .map(|a| a.user.clone())
        .ok_or(ApiError::Unauthorized)
}

fn cart_snapshot(items: &[CartItem]) -> Cart {
    Cart {
        items: items.to_vec(),
        // The server, not the client, computes the total.
        total_amount: items.iter().map(CartItem::line_total).sum(),
    }
}

#[async_trait]
impl StoreApi for FakeStoreApi {
    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.enter()?;
        Ok(HealthStatus {
            status: "ok".to_string(),
            message: None,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ApiError> {
        let mut state = self.enter()?;
        let account = state
            .accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .map(|a| a.user.clone());

        account.map_or(
            Err(ApiError::Api {
                status: 400,
                message: "Invalid credentials".to_string(),
            }),
            |user| {
                state.issued += 1;
                let token = format!("tok-{}", state.issued);
                state.valid_tokens.insert(token.clone());
                Ok(AuthSuccess {
                    user,
                    credential: Credential::new(token),
                })
            },
        )
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSuccess, ApiError> {
        let mut state = self.enter()?;
        if state.accounts.iter().any(|a| a.email == email) {
            return Err(ApiError::Api {
                status: 400,
                message: "User already exists".to_string(),
            });
        }

        let new_user = user(&format!("u{}", state.accounts.len() + 1), name, email);
        state.accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            user: new_user.clone(),
        });
        state.issued += 1;
        let token = format!("tok-{}", state.issued);
        state.valid_tokens.insert(token.clone());
        Ok(AuthSuccess {
            user: new_user,
            credential: Credential::new(token),
        })
    }

    async fn me(&self, credential: &Credential) -> Result<User, ApiError> {
        let state = self.enter()?;
        authorize(&state, credential)
    }

    async fn update_profile(
        &self,
        credential: &Credential,
        patch: &ProfilePatch,
    ) -> Result<User, ApiError> {
        let mut state = self.enter()?;
        authorize(&state, credential)?;
        let account = state.accounts.first_mut().ok_or(ApiError::Unauthorized)?;
        account.user.name = patch.name.clone();
        account.user.address = patch.address.clone();
        Ok(account.user.clone())
    }

    async fn cart(&self, credential: &Credential) -> Result<Cart, ApiError> {
        let state = self.enter()?;
        authorize(&state, credential)?;
        Ok(cart_snapshot(&state.cart))
    }

    async fn add_to_cart(
        &self,
        credential: &Credential,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let mut state = self.enter()?;
        authorize(&state, credential)?;

        let product = state
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: "Product not found".to_string(),
            })?;

        if let Some(item) = state.cart.iter_mut().find(|i| &i.product.id == product_id) {
            item.quantity += quantity;
        } else {
            state.cart.push(CartItem {
                id: format!("ci-{product_id}").into(),
                price: product.price,
                product,
                quantity,
            });
        }
        Ok(cart_snapshot(&state.cart))
    }

    async fn update_cart_item(
        &self,
        credential: &Credential,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let mut state = self.enter()?;
        authorize(&state, credential)?;

        let item = state
            .cart
            .iter_mut()
            .find(|i| &i.product.id == product_id)
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: "Item not in cart".to_string(),
            })?;
        item.quantity = quantity;
        Ok(cart_snapshot(&state.cart))
    }

    async fn remove_from_cart(
        &self,
        credential: &Credential,
        product_id: &ProductId,
    ) -> Result<Cart, ApiError> {
        let mut state = self.enter()?;
        authorize(&state, credential)?;
        state.cart.retain(|i| &i.product.id != product_id);
        Ok(cart_snapshot(&state.cart))
    }

    async fn clear_cart(&self, credential: &Credential) -> Result<(), ApiError> {
        let mut state = self.enter()?;
        authorize(&state, credential)?;
        state.cart.clear();
        Ok(())
    }

    async fn place_order(
        &self,
        credential: &Credential,
        order: &NewOrder,
    ) -> Result<Order, ApiError> {
        let mut state = self.enter()?;
        authorize(&state, credential)?;

        if state.cart.is_empty() {
            return Err(ApiError::Api {
                status: 400,
                message: "Cart is empty".to_string(),
            });
        }

        let items: Vec<OrderItem> = state
            .cart
            .iter()
            .map(|i| OrderItem {
                id: i.id.clone(),
                product: OrderProductRef {
                    id: i.product.id.clone(),
                    name: i.product.name.clone(),
                    images: i.product.images.clone(),
                },
                name: i.product.name.clone(),
                price: i.price,
                quantity: i.quantity,
            })
            .collect();

        let placed = Order {
            id: OrderId::new(format!("o{}", state.orders.len() + 1)),
            order_number: format!("ORD-{:04}", state.orders.len() + 1),
            total_amount: state.cart.iter().map(CartItem::line_total).sum(),
            items,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: order.payment_method,
            shipping_address: order.shipping_address.clone(),
            created_at: Utc::now(),
        };
        state.orders.push(placed.clone());
        Ok(placed)
    }

    async fn my_orders(&self, credential: &Credential) -> Result<Vec<Order>, ApiError> {
        let state = self.enter()?;
        authorize(&state, credential)?;
        Ok(state.orders.clone())
    }

    async fn order(&self, credential: &Credential, id: &OrderId) -> Result<Order, ApiError> {
        let state = self.enter()?;
        authorize(&state, credential)?;
        state
            .orders
            .iter()
            .find(|o| &o.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: "Order not found".to_string(),
            })
    }

    async fn products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let state = self.enter()?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| {
                query
                    .category
                    .as_ref()
                    .is_none_or(|c| p.category.as_deref() == Some(c))
            })
            .filter(|p| query.brand.as_ref().is_none_or(|b| &p.brand == b))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(ProductPage {
            products,
            pagination: None,
        })
    }

    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let state = self.enter()?;
        state.products.get(id).cloned().ok_or_else(|| ApiError::Api {
            status: 404,
            message: "Product not found".to_string(),
        })
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let state = self.enter()?;
        let mut categories: Vec<String> = state
            .products
            .values()
            .filter_map(|p| p.category.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        categories.sort();
        Ok(categories)
    }

    async fn brands(&self) -> Result<Vec<String>, ApiError> {
        let state = self.enter()?;
        let mut brands: Vec<String> = state
            .products
            .values()
            .map(|p| p.brand.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        brands.sort();
        Ok(brands)
    }
}
