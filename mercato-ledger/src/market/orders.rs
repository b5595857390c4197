use std::collections::BTreeMap;

use mercato_common::types::order_tag;
use mercato_common::{
    Cart, Order, OrderId, Role, Transaction, TransactionId, User, UserId, ValidationError,
};
use tracing::info;

use super::Marketplace;
use crate::core::ids::next_id;
use crate::error::Result;

/// Prefix of the seller-side sale entries of an order.
fn seller_sale_prefix(order_id: OrderId) -> String {
    format!("{} Sale:", order_tag(order_id))
}

impl Marketplace {
    /// Turns the session cart into an order.
    ///
    /// Every line produces a purchase entry for the customer and a sale entry
    /// for the product's seller. Stock, orders, transactions, users and the
    /// (now empty) cart are all staged before anything is committed.
    pub fn place_order(&mut self) -> Result<OrderId> {
        let session = self.customer_session("place orders")?;
        let customer_id = session.user_id;
        let cart = &session.cart;
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        cart.validate_stock(&self.products)?;

        let now = self.clock.now();
        let order_id = next_id(&self.orders);
        let tag = order_tag(order_id);
        let total = cart.total(&self.products);
        let mut next_tx: TransactionId = next_id(&self.transactions);

        let mut products = self.products.clone();
        let mut transactions = self.transactions.clone();
        for line in cart.lines() {
            let product = products
                .iter_mut()
                .find(|p| p.id == line.product_id)
                .ok_or(ValidationError::ProductNotFound(line.product_id))?;
            let amount = product.price() * f64::from(line.quantity);

            transactions.push(Transaction::sale(
                next_tx,
                customer_id,
                product.id,
                amount,
                format!("{} Purchase: {}", tag, product.name),
                now.as_str(),
            ));
            next_tx += 1;

            if self.user(product.seller_id).is_some_and(User::is_seller) {
                transactions.push(Transaction::sale(
                    next_tx,
                    product.seller_id,
                    product.id,
                    amount,
                    format!("{} Sale: {} x{}", tag, product.name, line.quantity),
                    now.as_str(),
                ));
                next_tx += 1;
            }

            product.reduce_stock(line.quantity)?;
        }

        let mut orders = self.orders.clone();
        orders.push(Order::new(order_id, customer_id, now.as_str(), cart.lines().to_vec(), total));

        let mut users = self.users.clone();
        users
            .iter_mut()
            .find(|u| u.id == customer_id)
            .ok_or(ValidationError::UserNotFound(customer_id))?
            .add_order(order_id);

        let emptied = Cart::for_user(customer_id);
        let stages = vec![
            self.store.stage(&products)?,
            self.store.stage(&orders)?,
            self.store.stage(&transactions)?,
            self.store.stage(&users)?,
            self.store.stage_cart(customer_id, &emptied)?,
        ];
        self.persist(stages)?;

        self.products = products;
        self.orders = orders;
        self.transactions = transactions;
        self.users = users;
        self.replace_cart(emptied);

        info!("Order #{} placed by user {} for {:.2}", order_id, customer_id, total);
        Ok(order_id)
    }

    /// Books a business expense against a seller. Stored negative.
    pub fn record_expense(
        &mut self,
        seller_id: UserId,
        amount: f64,
        description: &str,
    ) -> Result<TransactionId> {
        self.require_role(seller_id, Role::Seller, "record expenses")?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::InvalidAmount(amount).into());
        }

        let id = next_id(&self.transactions);
        let mut transactions = self.transactions.clone();
        transactions.push(Transaction::expense(id, seller_id, amount, description, self.clock.now()));
        self.persist(vec![self.store.stage(&transactions)?])?;
        self.transactions = transactions;

        info!("Seller {} recorded expense {:.2}", seller_id, amount);
        Ok(id)
    }

    /// Refunds a pending order in full.
    ///
    /// The customer gets back the frozen order total. Each seller involved
    /// gets a negative refund equal to what they booked for the order.
    pub fn process_refund(&mut self, admin_id: UserId, order_id: OrderId) -> Result<()> {
        self.require_role(admin_id, Role::Admin, "process refunds")?;
        let index = self
            .orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(ValidationError::OrderNotFound(order_id))?;

        let mut orders = self.orders.clone();
        orders[index].mark_refunded()?;
        let order = &orders[index];

        let prefix = seller_sale_prefix(order_id);
        let mut per_seller: BTreeMap<UserId, f64> = BTreeMap::new();
        for tx in self
            .transactions
            .iter()
            .filter(|tx| tx.is_sale() && tx.description.starts_with(&prefix))
        {
            *per_seller.entry(tx.user_id).or_insert(0.0) += tx.amount;
        }

        let now = self.clock.now();
        let description = format!("Refund for Order #{}", order_id);
        let mut next_tx = next_id(&self.transactions);
        let mut transactions = self.transactions.clone();

        transactions.push(Transaction::refund(
            next_tx,
            order.user_id,
            order.total(),
            description.as_str(),
            now.as_str(),
        ));
        for (seller_id, booked) in per_seller {
            next_tx += 1;
            transactions.push(Transaction::refund(
                next_tx,
                seller_id,
                -booked.abs(),
                description.as_str(),
                now.as_str(),
            ));
        }

        let total = order.total();
        self.persist(vec![
            self.store.stage(&orders)?,
            self.store.stage(&transactions)?,
        ])?;
        self.orders = orders;
        self.transactions = transactions;

        info!("Order #{} refunded ({:.2})", order_id, total);
        Ok(())
    }
}
