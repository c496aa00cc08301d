use serde::{Deserialize, Serialize};

/// Stock counters for one product.
///
/// `available_qty` is what is physically on hand; `reserved_qty` is the part
/// of it held by in-flight checkouts. The sellable quantity is the difference
/// and must never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(alias = "avail_qty", alias = "availQty")]
    pub available_qty: i64,
    #[serde(alias = "reserve_qty", alias = "reserveQty")]
    pub reserved_qty: i64,
}

impl Product {
    pub fn new(id: impl Into<String>, available_qty: i64) -> Self {
        Self {
            id: id.into(),
            available_qty,
            reserved_qty: 0,
        }
    }

    /// Quantity that may still be promised to new checkouts.
    pub fn sellable(&self) -> i64 {
        self.available_qty - self.reserved_qty
    }

    pub fn can_reserve(&self, quantity: u32) -> bool {
        self.sellable() >= i64::from(quantity)
    }
}

/// The single cart line the checkout works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub product_id: String,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sellable_quantity() {
        let mut product = Product::new("p-1", 5);
        assert_eq!(product.sellable(), 5);

        product.reserved_qty = 3;
        assert_eq!(product.sellable(), 2);
        assert!(product.can_reserve(2));
        assert!(!product.can_reserve(3));
    }

    #[test]
    fn test_product_accepts_legacy_field_names() {
        let json = r#"{"id": "p-1", "avail_qty": 7, "reserve_qty": 2}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.available_qty, 7);
        assert_eq!(product.reserved_qty, 2);
    }
}
