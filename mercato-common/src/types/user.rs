use serde::Serialize;
use std::fmt;

use super::{OrderId, UserId};
use crate::auth::credential::{self, CredentialError, CredentialScheme};

/// Account role. Fixed at creation; there is no path that changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    /// On-disk tag.
    pub fn tag(self) -> i32 {
        match self {
            Role::Customer => 0,
            Role::Seller => 1,
            Role::Admin => 2,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Role::Customer),
            1 => Some(Role::Seller),
            2 => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Seller => write!(f, "seller"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    credential: String,
    role: Role,
    order_history: Vec<OrderId>,
}

impl User {
    /// Creates a new account, deriving the stored credential from `password`.
    pub fn register(
        id: UserId,
        username: impl Into<String>,
        password: &str,
        role: Role,
        scheme: &dyn CredentialScheme,
    ) -> Result<Self, CredentialError> {
        Ok(Self {
            id,
            username: username.into(),
            credential: scheme.derive(password)?,
            role,
            order_history: Vec::new(),
        })
    }

    /// Rebuilds a user from already-derived parts (used when decoding).
    pub fn from_parts(
        id: UserId,
        username: String,
        credential: String,
        role: Role,
        order_history: Vec<OrderId>,
    ) -> Self {
        Self {
            id,
            username,
            credential,
            role,
            order_history,
        }
    }

    /// Checks a candidate password against the stored credential.
    pub fn authenticate(&self, candidate: &str) -> bool {
        credential::verify(&self.credential, candidate)
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }

    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn order_history(&self) -> &[OrderId] {
        &self.order_history
    }

    pub fn add_order(&mut self, order_id: OrderId) {
        self.order_history.push(order_id);
    }
}
