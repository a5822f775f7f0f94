//! In-process cart backend for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use heirloom_core::{CartId, CartItemId, CartSessionId, Money, ProductId, Quantity};

use crate::api::{ApiError, Cart, CartGateway, CartItem, CartProduct};

/// Gateway operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Add,
    Update,
    Remove,
    Clear,
}

struct State {
    cart: Cart,
    next_item: u32,
    failing: HashSet<Op>,
    calls: Vec<Op>,
    /// Scripted `get_cart` answers: delay, then either this cart or the live one.
    get_script: VecDeque<(Duration, Option<Cart>)>,
    catalog: HashMap<ProductId, (Money, Option<u32>)>,
}

/// A cart backend that behaves like the REST API: adding an existing product
/// increments its line, clearing empties the cart.
pub struct FakeGateway {
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                cart: empty_cart(),
                next_item: 1,
                failing: HashSet::new(),
                calls: Vec::new(),
                get_script: VecDeque::new(),
                catalog: HashMap::new(),
            }),
        }
    }

    /// Register a product the backend knows about.
    pub fn with_product(self, id: &str, price: Money, stock: Option<u32>) -> Self {
        self.state
            .lock()
            .unwrap()
            .catalog
            .insert(ProductId::new(id), (price, stock));
        self
    }

    /// Seed a line directly into the backend cart.
    pub fn with_line(self, id: &str, price: Money, quantity: u32, stock: Option<u32>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.catalog.insert(ProductId::new(id), (price, stock));
            let item = make_item(&mut state, &ProductId::new(id), Quantity::new(quantity).unwrap());
            state.cart.items.push(item);
        }
        self
    }

    pub fn fail(&self, op: Op) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub fn heal(&self, op: Op) {
        self.state.lock().unwrap().failing.remove(&op);
    }

    /// Queue a delayed `get_cart` answer. `None` answers with the live cart.
    pub fn script_get(&self, delay: Duration, cart: Option<Cart>) {
        self.state
            .lock()
            .unwrap()
            .get_script
            .push_back((delay, cart));
    }

    pub fn calls(&self) -> Vec<Op> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().into_iter().filter(|c| *c == op).count()
    }

    pub fn cart(&self) -> Cart {
        self.state.lock().unwrap().cart.clone()
    }

    fn enter(&self, op: Op) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        if state.failing.contains(&op) {
            return Err(ApiError::Api {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

pub fn empty_cart() -> Cart {
    Cart {
        id: CartId::new("cart-1"),
        session_id: CartSessionId::new("session-1"),
        total: None,
        items: Vec::new(),
    }
}

fn make_item(state: &mut State, product_id: &ProductId, quantity: Quantity) -> CartItem {
    let (price, stock) = state
        .catalog
        .get(product_id)
        .copied()
        .unwrap_or((Money::from_major(1), None));
    let id = CartItemId::new(format!("item-{}", state.next_item));
    state.next_item += 1;
    CartItem {
        id,
        cart_id: state.cart.id.clone(),
        product_id: product_id.clone(),
        quantity,
        price,
        product: CartProduct {
            id: product_id.clone(),
            name: format!("Product {product_id}"),
            description: None,
            price,
            image_url: None,
            inventory: stock,
        },
    }
}

impl CartGateway for FakeGateway {
    async fn get_cart(&self, _session_id: &CartSessionId) -> Result<Cart, ApiError> {
        self.enter(Op::Get)?;
        let (delay, cart) = {
            let mut state = self.state.lock().unwrap();
            let (delay, scripted) = state.get_script.pop_front().unwrap_or_default();
            (delay, scripted.unwrap_or_else(|| state.cart.clone()))
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(cart)
    }

    async fn add_to_cart(
        &self,
        _cart_id: &CartId,
        product_id: &ProductId,
        quantity: Quantity,
        price: Option<Money>,
    ) -> Result<CartItem, ApiError> {
        self.enter(Op::Add)?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .cart
            .items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        {
            existing.quantity = Quantity::new(existing.quantity.get() + quantity.get()).unwrap();
            return Ok(existing.clone());
        }
        let mut item = make_item(&mut state, product_id, quantity);
        if let Some(price) = price {
            item.price = price;
        }
        state.cart.items.push(item.clone());
        Ok(item)
    }

    async fn update_cart_item_quantity(
        &self,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, ApiError> {
        self.enter(Op::Update)?;
        let mut state = self.state.lock().unwrap();
        let item = state
            .cart
            .items
            .iter_mut()
            .find(|item| &item.id == item_id)
            .ok_or_else(|| ApiError::NotFound("Cart item not found".to_string()))?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    async fn remove_from_cart(&self, item_id: &CartItemId) -> Result<(), ApiError> {
        self.enter(Op::Remove)?;
        self.state
            .lock()
            .unwrap()
            .cart
            .items
            .retain(|item| &item.id != item_id);
        Ok(())
    }

    async fn clear_cart(&self, _cart_id: &CartId) -> Result<(), ApiError> {
        self.enter(Op::Clear)?;
        self.state.lock().unwrap().cart.items.clear();
        Ok(())
    }
}
