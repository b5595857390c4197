use mercato_common::{Cart, Role, User, UserId, ValidationError};
use tracing::{info, warn};

use super::{Marketplace, Session};
use crate::core::ids::next_id;
use crate::error::Result;

impl Marketplace {
    /// Creates an account. Usernames are unique and case sensitive.
    pub fn register_user(&mut self, username: &str, password: &str, role: Role) -> Result<UserId> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::EmptyCredentials.into());
        }
        if self.users.iter().any(|u| u.username == username) {
            return Err(ValidationError::DuplicateUsername(username.to_string()).into());
        }

        let id = next_id(&self.users);
        let user = User::register(id, username, password, role, self.scheme.as_ref())?;

        let mut users = self.users.clone();
        users.push(user);
        self.persist(vec![self.store.stage(&users)?])?;
        self.users = users;

        info!("Registered {} '{}' as user {}", role, username, id);
        Ok(id)
    }

    /// Starts a session and restores the user's saved cart. Any previous
    /// session is closed first.
    pub fn login(&mut self, username: &str, password: &str) -> Result<UserId> {
        let user_id = self
            .users
            .iter()
            .find(|u| u.username == username && u.authenticate(password))
            .map(|u| u.id)
            .ok_or(ValidationError::InvalidLogin)?;

        self.logout()?;

        let loaded = self.store.load_cart(user_id)?;
        if loaded.corruption.is_some() {
            warn!("Cart of user {} was partially recovered", user_id);
        }
        self.session = Some(Session {
            user_id,
            cart: loaded.cart,
        });

        info!("User '{}' logged in", username);
        Ok(user_id)
    }

    /// Saves the cart snapshot and ends the session. A no-op when nobody is
    /// logged in.
    pub fn logout(&mut self) -> Result<()> {
        if let Some(session) = &self.session {
            self.store.save_cart(session.user_id, &session.cart)?;
            info!("User {} logged out", session.user_id);
        }
        self.session = None;
        Ok(())
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().and_then(|s| self.user(s.user_id))
    }

    pub fn cart(&self) -> Result<&Cart> {
        Ok(&self.session()?.cart)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::core::store::{BOOTSTRAP_ADMIN_PASSWORD, BOOTSTRAP_ADMIN_USERNAME};
    use crate::error::LedgerError;

    #[test]
    fn test_register_assigns_next_id() {
        let (_dir, mut market) = market();

        assert_eq!(market.register_user("sam", "pw", Role::Seller).unwrap(), 2);
        assert_eq!(market.register_user("cleo", "pw", Role::Customer).unwrap(), 3);
        assert_eq!(market.user(3).unwrap().role(), Role::Customer);
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let (_dir, mut market) = market();
        market.register_user("sam", "pw", Role::Seller).unwrap();

        assert!(matches!(
            market.register_user("sam", "other", Role::Customer),
            Err(LedgerError::Validation(ValidationError::DuplicateUsername(_)))
        ));
        assert!(matches!(
            market.register_user("", "pw", Role::Customer),
            Err(LedgerError::Validation(ValidationError::EmptyCredentials))
        ));
        assert!(matches!(
            market.register_user("kim", "", Role::Customer),
            Err(LedgerError::Validation(ValidationError::EmptyCredentials))
        ));
        assert_eq!(market.users().len(), 2);
    }

    #[test]
    fn test_login_and_logout() {
        let (_dir, mut market) = market();
        market.register_user("cleo", "secret", Role::Customer).unwrap();

        assert!(matches!(
            market.login("cleo", "wrong"),
            Err(LedgerError::Validation(ValidationError::InvalidLogin))
        ));
        assert!(market.current_user().is_none());

        let id = market.login("cleo", "secret").unwrap();
        assert_eq!(market.current_user().map(|u| u.id), Some(id));
        assert!(market.cart().unwrap().is_empty());

        market.logout().unwrap();
        assert!(market.current_user().is_none());
        assert!(matches!(
            market.cart(),
            Err(LedgerError::Validation(ValidationError::NotLoggedIn))
        ));
    }

    #[test]
    fn test_bootstrap_admin_can_log_in() {
        let (_dir, mut market) = market();
        let id = market
            .login(BOOTSTRAP_ADMIN_USERNAME, BOOTSTRAP_ADMIN_PASSWORD)
            .unwrap();
        assert!(market.user(id).unwrap().is_admin());
    }
}
