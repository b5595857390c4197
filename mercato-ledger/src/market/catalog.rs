use mercato_common::{Product, ProductId, Role, UserId, ValidationError};
use tracing::{debug, info};

use super::Marketplace;
use crate::core::ids::next_id;
use crate::error::Result;

impl Marketplace {
    pub fn browse_products(&self) -> &[Product] {
        &self.products
    }

    /// Case-insensitive substring match on name or category.
    pub fn search_products(&self, query: &str) -> Vec<&Product> {
        let needle = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Lists a new product owned by `seller_id`.
    pub fn add_product(
        &mut self,
        seller_id: UserId,
        name: &str,
        price: f64,
        category: &str,
        stock: u32,
    ) -> Result<ProductId> {
        self.require_role(seller_id, Role::Seller, "list products")?;
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidProduct("name cannot be empty".to_string()).into());
        }
        if category.trim().is_empty() {
            return Err(ValidationError::InvalidProduct("category cannot be empty".to_string()).into());
        }
        if !price.is_finite() || price < 0.0 {
            return Err(ValidationError::InvalidPrice(price).into());
        }
        if stock == 0 {
            return Err(ValidationError::InvalidQuantity(stock).into());
        }

        let id = next_id(&self.products);
        let mut products = self.products.clone();
        products.push(Product::new(id, name, price, category, stock, seller_id));
        self.persist(vec![self.store.stage(&products)?])?;
        self.products = products;

        info!("Seller {} listed product {} '{}'", seller_id, id, name);
        Ok(id)
    }

    /// Adds stock to one of the seller's own products.
    pub fn restock(&mut self, seller_id: UserId, product_id: ProductId, quantity: u32) -> Result<()> {
        self.require_role(seller_id, Role::Seller, "restock products")?;
        let index = self
            .products
            .iter()
            .position(|p| p.id == product_id)
            .ok_or(ValidationError::ProductNotFound(product_id))?;
        if self.products[index].seller_id != seller_id {
            return Err(ValidationError::NotOwner(product_id).into());
        }

        let mut products = self.products.clone();
        products[index].restock(quantity)?;
        self.persist(vec![self.store.stage(&products)?])?;
        self.products = products;

        info!("Product {} restocked by {}", product_id, quantity);
        Ok(())
    }

    /// Adds units to the session cart. The merged quantity may not exceed
    /// current stock.
    pub fn add_to_cart(&mut self, product_id: ProductId, quantity: u32) -> Result<()> {
        let session = self.customer_session("fill a cart")?;
        let product = self
            .product(product_id)
            .ok_or(ValidationError::ProductNotFound(product_id))?;

        let mut cart = session.cart.clone();
        cart.add(product, quantity)?;
        self.store.save_cart(session.user_id, &cart)?;

        debug!("Added {} x product {} to cart", quantity, product_id);
        self.replace_cart(cart);
        Ok(())
    }

    pub fn remove_from_cart(&mut self, product_id: ProductId) -> Result<()> {
        let session = self.session()?;
        let mut cart = session.cart.clone();
        cart.remove(product_id)?;
        self.store.save_cart(session.user_id, &cart)?;
        self.replace_cart(cart);
        Ok(())
    }

    pub fn clear_cart(&mut self) -> Result<()> {
        let session = self.session()?;
        let mut cart = session.cart.clone();
        cart.clear();
        self.store.save_cart(session.user_id, &cart)?;
        self.replace_cart(cart);
        Ok(())
    }

    /// Cart value at current prices.
    pub fn cart_total(&self) -> Result<f64> {
        Ok(self.session()?.cart.total(&self.products))
    }
}
