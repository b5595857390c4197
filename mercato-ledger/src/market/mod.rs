//! The marketplace service: owns every collection plus the acting user's
//! cart, and is the only thing that writes to the store.
//!
//! Mutations follow one pattern. Validate, build the changed collections on
//! the side, stage and commit them to disk, and only then swap them into
//! memory. A failure at any step leaves the in-memory state as it was.

mod accounts;
mod catalog;
mod orders;

use mercato_common::auth::{Argon2Scheme, CredentialScheme};
use mercato_common::utils::time::{Clock, SystemClock};
use mercato_common::{Cart, Order, OrderId, Product, ProductId, Role, Transaction, User, UserId, ValidationError};
use tracing::info;

use crate::config::LedgerConfig;
use crate::core::codec::Corruption;
use crate::core::reports::{CustomerView, SellerView};
use crate::core::store::{commit_all, EntityStore, StagedWrite};
use crate::error::Result;

/// The logged-in user and their working cart.
#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    cart: Cart,
}

pub struct Marketplace {
    store: EntityStore,
    clock: Box<dyn Clock>,
    scheme: Box<dyn CredentialScheme>,
    products: Vec<Product>,
    users: Vec<User>,
    orders: Vec<Order>,
    transactions: Vec<Transaction>,
    warnings: Vec<Corruption>,
    session: Option<Session>,
}

impl Marketplace {
    /// Opens a data directory with the system clock and default Argon2
    /// parameters.
    pub fn open(config: LedgerConfig) -> Result<Self> {
        Self::open_with(config, Box::new(SystemClock), Box::new(Argon2Scheme::default()))
    }

    pub fn open_with(
        config: LedgerConfig,
        clock: Box<dyn Clock>,
        scheme: Box<dyn CredentialScheme>,
    ) -> Result<Self> {
        let store = EntityStore::open(config)?;
        let snapshot = store.load_state(scheme.as_ref())?;

        if snapshot.bootstrapped_admin {
            store.replace_all(&snapshot.users)?;
        }

        info!(
            "Marketplace ready at {}: {} products, {} users, {} orders, {} transactions",
            store.config().data_dir.display(),
            snapshot.products.len(),
            snapshot.users.len(),
            snapshot.orders.len(),
            snapshot.transactions.len()
        );

        Ok(Self {
            store,
            clock,
            scheme,
            products: snapshot.products,
            users: snapshot.users,
            orders: snapshot.orders,
            transactions: snapshot.transactions,
            warnings: snapshot.warnings,
            session: None,
        })
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Corruption found while loading. The affected files were truncated
    /// in memory at the first bad record.
    pub fn load_warnings(&self) -> &[Corruption] {
        &self.warnings
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn orders_for(&self, user_id: UserId) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.user_id == user_id).collect()
    }

    /// Financial view of a seller account.
    pub fn seller_view(&self, seller_id: UserId) -> Result<SellerView<'_>> {
        self.require_role(seller_id, Role::Seller, "view seller reports")?;
        Ok(SellerView::new(seller_id, &self.transactions))
    }

    /// Spending view of a customer account.
    pub fn customer_view(&self, customer_id: UserId) -> Result<CustomerView<'_>> {
        self.require_role(customer_id, Role::Customer, "view spending reports")?;
        Ok(CustomerView::new(customer_id, &self.transactions))
    }

    fn require_user(&self, user_id: UserId) -> Result<&User> {
        Ok(self
            .user(user_id)
            .ok_or(ValidationError::UserNotFound(user_id))?)
    }

    fn require_role(&self, user_id: UserId, required: Role, action: &'static str) -> Result<&User> {
        let user = self.require_user(user_id)?;
        if user.role() != required {
            return Err(ValidationError::PermissionDenied { required, action }.into());
        }
        Ok(user)
    }

    fn session(&self) -> Result<&Session> {
        Ok(self.session.as_ref().ok_or(ValidationError::NotLoggedIn)?)
    }

    /// The session, provided its user is a customer.
    fn customer_session(&self, action: &'static str) -> Result<&Session> {
        let session = self.session()?;
        if !self.require_user(session.user_id)?.is_customer() {
            return Err(ValidationError::PermissionDenied { required: Role::Customer, action }.into());
        }
        Ok(session)
    }

    fn replace_cart(&mut self, cart: Cart) {
        if let Some(session) = self.session.as_mut() {
            session.cart = cart;
        }
    }

    fn persist(&self, stages: Vec<StagedWrite>) -> Result<()> {
        commit_all(stages)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use mercato_common::utils::time::FixedClock;
    use tempfile::{tempdir, TempDir};

    pub const NOW: &str = "2024-01-05 10:15:00";

    pub fn open_at(dir: &std::path::Path, now: &str) -> Marketplace {
        Marketplace::open_with(
            LedgerConfig::with_data_dir(dir),
            Box::new(FixedClock::new(now)),
            Box::new(Argon2Scheme::fast()),
        )
        .unwrap()
    }

    pub fn market() -> (TempDir, Marketplace) {
        let dir = tempdir().unwrap();
        let market = open_at(dir.path(), NOW);
        (dir, market)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::core::codec::EntityKind;
    use crate::core::store::BOOTSTRAP_ADMIN_USERNAME;

    #[test]
    fn test_fresh_directory_persists_admin() {
        let (dir, market) = market();

        assert_eq!(market.users().len(), 1);
        assert_eq!(market.users()[0].username, BOOTSTRAP_ADMIN_USERNAME);
        assert!(market.store().path_for(EntityKind::User).exists());

        // Reopening reads the stored admin instead of minting a new one.
        let credential = market.users()[0].credential().to_string();
        drop(market);
        let reopened = open_at(dir.path(), NOW);
        assert_eq!(reopened.users()[0].credential(), credential);
    }

    #[test]
    fn test_views_check_roles() {
        let (_dir, mut market) = market();
        let seller = market.register_user("sam", "pw", Role::Seller).unwrap();
        let customer = market.register_user("cleo", "pw", Role::Customer).unwrap();

        assert!(market.seller_view(seller).is_ok());
        assert!(market.customer_view(customer).is_ok());
        assert!(matches!(
            market.seller_view(customer),
            Err(crate::error::LedgerError::Validation(ValidationError::PermissionDenied { .. }))
        ));
        assert!(matches!(
            market.customer_view(99),
            Err(crate::error::LedgerError::Validation(ValidationError::UserNotFound(99)))
        ));
    }
}
