//! Cart-submission boundary.
//!
//! The online-grocery integration is an external collaborator; this module
//! only fixes the request/response contract and ships one offline mock so
//! the CLI flow works end to end. Mapping names to a real catalog is the
//! collaborator's problem, and the pipeline never interprets a receipt
//! beyond success or failure.

use async_trait::async_trait;
use platter_store::ShoppingListItem;
use thiserror::Error;

/// One line added to the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// Shopping-list name that was matched.
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    /// Catalog product that was added.
    pub product_name: String,
    pub price: f64,
}

/// Result of a cart submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CartReceipt {
    pub added: Vec<CartLine>,
    /// Shopping-list names the catalog could not match.
    pub missing: Vec<String>,
    pub total_price: f64,
    pub cart_url: String,
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart service unavailable: {0}")]
    Unavailable(String),
}

/// Cart-submission collaborator contract.
#[async_trait]
pub trait CartClient: Send + Sync {
    fn name(&self) -> &str;

    /// Submit a shopping list, returning what was added and at what price.
    async fn submit(&self, items: &[ShoppingListItem]) -> Result<CartReceipt, CartError>;
}

// ---------------------------------------------------------------------------
// Mock implementation
// ---------------------------------------------------------------------------

/// Fixed catalog: (name substring, product name, unit price).
const MOCK_CATALOG: &[(&str, &str, f64)] = &[
    ("chicken", "British Chicken Breast Fillets 650G", 4.50),
    ("beef", "Beef Mince 5% Fat 500G", 3.25),
    ("pasta", "Italian Spaghetti 500G", 0.95),
    ("rice", "Easy Cook Long Grain Rice 1Kg", 1.75),
    ("onion", "Brown Onions 1Kg", 0.85),
    ("garlic", "Garlic 4 Pack", 0.79),
    ("tomato", "Salad Tomatoes 6 Pack", 0.90),
    ("cheese", "Mature Cheddar 460G", 2.65),
    ("broccoli", "Broccoli Head", 0.65),
    ("carrot", "Carrots 1Kg", 0.45),
    ("salmon", "Salmon Fillets 2 Pack", 4.00),
    ("bread", "White Bloomer 800G", 1.10),
    ("pepper", "Mixed Peppers 3 Pack", 1.55),
];

/// Offline cart client with a fixed catalog and deterministic prices.
#[derive(Debug, Clone, Default)]
pub struct MockCartClient;

impl MockCartClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CartClient for MockCartClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, items: &[ShoppingListItem]) -> Result<CartReceipt, CartError> {
        let mut added = Vec::new();
        let mut missing = Vec::new();

        for item in items {
            let lower = item.name.to_lowercase();
            match MOCK_CATALOG.iter().find(|(key, _, _)| lower.contains(key)) {
                Some((_, product, price)) => added.push(CartLine {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit: item.unit.clone(),
                    product_name: (*product).to_owned(),
                    price: *price,
                }),
                None => missing.push(item.name.clone()),
            }
        }

        let total_price = added.iter().map(|line| line.price).sum();
        Ok(CartReceipt {
            added,
            missing,
            total_price,
            cart_url: "https://groceries.example.com/trolley".to_owned(),
        })
    }
}
