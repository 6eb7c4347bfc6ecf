//! Shopping cart reducer.
//!
//! A [`Cart`] is a plain value: the storefront loads it from the visitor's
//! session, applies one of the methods below, and stores it back. Lines are
//! keyed by `(product_id, size)` and a cart never holds two lines with the
//! same key.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Snapshot of a product taken when it is added to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub sizes: Vec<String>,
}

/// One (product, size) entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price captured when the line was first added.
    pub unit_price: Price,
    pub size: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    /// Sizes the product offered at add time.
    #[serde(default)]
    pub available_sizes: Vec<String>,
}

impl CartLine {
    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// The product offers sizes but none was chosen for this line.
    #[must_use]
    pub fn needs_size(&self) -> bool {
        self.size.is_none() && !self.available_sizes.is_empty()
    }

    fn matches(&self, product_id: ProductId, size: Option<&str>) -> bool {
        self.product_id == product_id && self.size.as_deref() == size
    }
}

/// Line sent to `POST /api/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: u32,
}

/// The visitor's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` of `product` in `size`.
    ///
    /// An existing line for the same `(product, size)` has its quantity
    /// increased; otherwise a new line is appended with the product's current
    /// price. A quantity of zero is treated as one.
    pub fn add(&mut self, product: &CartProduct, size: Option<&str>, quantity: u32) {
        let size = normalize_size(size);
        let quantity = quantity.max(1);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.matches(product.id, size.as_deref()))
        {
            line.quantity = line.quantity.saturating_add(quantity);
            return;
        }

        self.lines.push(CartLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            size,
            quantity,
            image: product.image.clone(),
            available_sizes: product.sizes.clone(),
        });
    }

    /// Overwrite the quantity of the matching line.
    ///
    /// A zero or negative quantity removes the line. No-op if nothing matches.
    pub fn update_quantity(&mut self, product_id: ProductId, size: Option<&str>, quantity: i64) {
        let size = normalize_size(size);
        if quantity <= 0 {
            self.remove(product_id, size.as_deref());
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.find_mut(product_id, size.as_deref()) {
            line.quantity = quantity;
        }
    }

    /// Move a line to another size, merging into an existing line for the
    /// target size if there is one.
    pub fn change_size(&mut self, product_id: ProductId, from: Option<&str>, to: Option<&str>) {
        let from = normalize_size(from);
        let to = normalize_size(to);
        if from == to {
            return;
        }

        let Some(index) = self
            .lines
            .iter()
            .position(|line| line.matches(product_id, from.as_deref()))
        else {
            return;
        };

        if let Some(target) = self
            .lines
            .iter()
            .position(|line| line.matches(product_id, to.as_deref()))
        {
            let moved = self.lines.remove(index);
            let target = if target > index { target - 1 } else { target };
            if let Some(line) = self.lines.get_mut(target) {
                line.quantity = line.quantity.saturating_add(moved.quantity);
            }
        } else if let Some(line) = self.lines.get_mut(index) {
            line.size = to;
        }
    }

    /// Delete the matching line. No-op if nothing matches.
    pub fn remove(&mut self, product_id: ProductId, size: Option<&str>) {
        let size = normalize_size(size);
        self.lines
            .retain(|line| !line.matches(product_id, size.as_deref()));
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Whether any line still needs a size before checkout.
    #[must_use]
    pub fn has_missing_size(&self) -> bool {
        self.lines.iter().any(CartLine::needs_size)
    }

    /// Items for the checkout request.
    #[must_use]
    pub fn checkout_items(&self) -> Vec<CheckoutItem> {
        self.lines
            .iter()
            .map(|line| CheckoutItem {
                product_id: line.product_id,
                size: line.size.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    fn find_mut(&mut self, product_id: ProductId, size: Option<&str>) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.matches(product_id, size))
    }
}

/// Coerce a quantity typed into a form: anything non-numeric or below one
/// becomes one.
#[must_use]
pub fn coerce_quantity(input: Option<&str>) -> u32 {
    input
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value >= 1)
        .unwrap_or(1)
}

/// Treat blank sizes as "no size".
#[must_use]
pub fn normalize_size(size: Option<&str>) -> Option<String> {
    size.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i64, price: &str, sizes: &[&str]) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::parse(price).unwrap(),
            image: None,
            sizes: sizes.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_add_same_pair_merges() {
        let tee = product(1, "19.99", &["S", "M", "L"]);
        let mut cart = Cart::new();

        cart.add(&tee, Some("M"), 2);
        cart.add(&tee, Some("M"), 1);

        assert_eq!(cart.lines().len(), 1);
        let line = &cart.lines()[0];
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Price::from_cents(1999));
        assert_eq!(line.size.as_deref(), Some("M"));
    }

    #[test]
    fn test_add_different_sizes_are_separate_lines() {
        let tee = product(1, "10", &["S", "M"]);
        let mut cart = Cart::new();

        cart.add(&tee, Some("S"), 1);
        cart.add(&tee, Some("M"), 1);

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_without_sizes_has_no_size() {
        let bottle = product(2, "5", &[]);
        let mut cart = Cart::new();

        cart.add(&bottle, None, 1);
        cart.add(&bottle, Some("  "), 1);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].size, None);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert!(!cart.has_missing_size());
    }

    #[test]
    fn test_add_zero_quantity_counts_as_one() {
        let bottle = product(2, "5", &[]);
        let mut cart = Cart::new();
        cart.add(&bottle, None, 0);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_price_is_snapshotted_at_add_time() {
        let mut cart = Cart::new();
        cart.add(&product(3, "10", &[]), None, 1);
        cart.add(&product(3, "99", &[]), None, 1);

        assert_eq!(cart.lines()[0].unit_price, Price::from_cents(1000));
        assert_eq!(cart.subtotal(), Price::from_cents(2000));
    }

    #[test]
    fn test_update_quantity_overwrites() {
        let tee = product(1, "19.99", &["M"]);
        let mut cart = Cart::new();
        cart.add(&tee, Some("M"), 2);

        cart.update_quantity(tee.id, Some("M"), 5);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_update_quantity_zero_or_negative_removes() {
        let tee = product(1, "19.99", &["M", "L"]);
        let mut cart = Cart::new();
        cart.add(&tee, Some("M"), 2);
        cart.add(&tee, Some("L"), 1);

        cart.update_quantity(tee.id, Some("M"), 0);
        assert_eq!(cart.lines().len(), 1);

        cart.update_quantity(tee.id, Some("L"), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_without_match_is_noop() {
        let tee = product(1, "19.99", &["M"]);
        let mut cart = Cart::new();
        cart.add(&tee, Some("M"), 2);
        let before = cart.clone();

        cart.update_quantity(tee.id, Some("XL"), 4);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_exact_line_only() {
        let tee = product(1, "19.99", &["M", "L"]);
        let mut cart = Cart::new();
        cart.add(&tee, Some("M"), 1);
        cart.add(&tee, Some("L"), 1);

        cart.remove(tee.id, Some("M"));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].size.as_deref(), Some("L"));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let tee = product(1, "19.99", &["M"]);
        let mut cart = Cart::new();
        cart.add(&tee, Some("M"), 1);
        let before = cart.clone();

        cart.remove(ProductId::new(42), Some("M"));
        cart.remove(tee.id, None);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = Cart::new();
        cart.add(&product(1, "1", &[]), None, 3);

        cart.clear();
        assert!(cart.is_empty());
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Price::ZERO);
    }

    #[test]
    fn test_change_size_moves_line() {
        let tee = product(1, "10", &["S", "M"]);
        let mut cart = Cart::new();
        cart.add(&tee, None, 2);
        assert!(cart.has_missing_size());

        cart.change_size(tee.id, None, Some("S"));
        assert_eq!(cart.lines()[0].size.as_deref(), Some("S"));
        assert!(!cart.has_missing_size());
    }

    #[test]
    fn test_change_size_merges_into_existing_line() {
        let tee = product(1, "10", &["S", "M"]);
        let mut cart = Cart::new();
        cart.add(&tee, Some("M"), 1);
        cart.add(&tee, Some("S"), 2);

        cart.change_size(tee.id, Some("S"), Some("M"));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].size.as_deref(), Some("M"));
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_totals_and_checkout_items() {
        let tee = product(1, "19.99", &["M"]);
        let cap = product(2, "5.50", &[]);
        let mut cart = Cart::new();
        cart.add(&tee, Some("M"), 2);
        cart.add(&cap, None, 1);

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal().display(), "$45.48");
        assert_eq!(
            cart.checkout_items(),
            vec![
                CheckoutItem {
                    product_id: tee.id,
                    size: Some("M".to_string()),
                    quantity: 2,
                },
                CheckoutItem {
                    product_id: cap.id,
                    size: None,
                    quantity: 1,
                },
            ]
        );
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(Some("3")), 3);
        assert_eq!(coerce_quantity(Some(" 2 ")), 2);
        assert_eq!(coerce_quantity(Some("0")), 1);
        assert_eq!(coerce_quantity(Some("-4")), 1);
        assert_eq!(coerce_quantity(Some("abc")), 1);
        assert_eq!(coerce_quantity(None), 1);
    }

    #[test]
    fn test_cart_survives_serialization() {
        let mut cart = Cart::new();
        cart.add(&product(1, "19.99", &["M"]), Some("M"), 2);

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }
}
