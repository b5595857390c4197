//! On-disk shapes of each entity kind and the checks that guard them.
//!
//! Field order here *is* the file format. Do not reorder.

use mercato_common::types::{
    CartLine, Order, OrderStatus, Product, Role, Transaction, TransactionKind, User,
    MAX_CART_LINES,
};
use serde::{Deserialize, Serialize};

use super::{read_value, write_value, EntityKind, Record};
use crate::error::CodecError;

/// Strings must be strictly shorter than this.
pub const MAX_TEXT_LEN: usize = 1000;
/// Transaction descriptions get a larger budget.
pub const MAX_DESCRIPTION_LEN: usize = 10_000;
/// Upper bound on a user's order history.
pub const MAX_ORDER_HISTORY: usize = 10_000;
/// Line items per order; same cap as the cart.
pub const MAX_ORDER_ITEMS: usize = MAX_CART_LINES;
/// Fixed width of the transaction timestamp buffer (19 chars + NUL).
pub const TIMESTAMP_BUF_LEN: usize = 20;

/// `product_id` sentinel for transactions that are not about a product.
const NO_PRODUCT: i32 = -1;

#[derive(Serialize, Deserialize)]
struct ProductWire {
    id: i32,
    name: String,
    price: f64,
    category: String,
    stock: i32,
    seller_id: i32,
}

#[derive(Serialize, Deserialize)]
struct UserWire {
    id: i32,
    username: String,
    credential: String,
    role: i32,
    order_history: Vec<i32>,
}

#[derive(Serialize, Deserialize)]
struct OrderWire {
    id: i32,
    user_id: i32,
    timestamp: String,
    status: String,
    total: f64,
    items: Vec<(i32, i32)>,
}

#[derive(Serialize, Deserialize)]
struct TransactionWire {
    id: i32,
    user_id: i32,
    product_id: i32,
    amount: f64,
    kind: i32,
    description: String,
    timestamp: [u8; TIMESTAMP_BUF_LEN],
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), CodecError> {
    if value.len() >= max {
        return Err(CodecError::LengthOutOfBounds {
            field,
            len: value.len() as u64,
            max: max as u64 - 1,
        });
    }
    Ok(())
}

fn check_count(field: &'static str, count: usize, max: usize) -> Result<(), CodecError> {
    if count > max {
        return Err(CodecError::LengthOutOfBounds {
            field,
            len: count as u64,
            max: max as u64,
        });
    }
    Ok(())
}

fn check_amount(field: &'static str, value: f64) -> Result<(), CodecError> {
    if !value.is_finite() {
        return Err(CodecError::invalid(field, format!("{} is not finite", value)));
    }
    Ok(())
}

fn to_wire(field: &'static str, value: u32) -> Result<i32, CodecError> {
    i32::try_from(value).map_err(|_| CodecError::invalid(field, format!("{} does not fit in i32", value)))
}

fn from_wire(field: &'static str, value: i32) -> Result<u32, CodecError> {
    u32::try_from(value).map_err(|_| CodecError::invalid(field, format!("{} is negative", value)))
}

fn line_to_wire(line: &CartLine) -> Result<(i32, i32), CodecError> {
    if line.quantity == 0 {
        return Err(CodecError::invalid("quantity", "0"));
    }
    Ok((to_wire("product_id", line.product_id)?, to_wire("quantity", line.quantity)?))
}

fn line_from_wire((product_id, quantity): (i32, i32)) -> Result<CartLine, CodecError> {
    let quantity = from_wire("quantity", quantity)?;
    if quantity == 0 {
        return Err(CodecError::invalid("quantity", "0"));
    }
    Ok(CartLine::new(from_wire("product_id", product_id)?, quantity))
}

/// Encodes one cart line as `(productId, quantity)`.
pub(crate) fn write_line(line: &CartLine, out: &mut Vec<u8>) -> Result<(), CodecError> {
    write_value(&line_to_wire(line)?, out)
}

pub(crate) fn read_line(input: &mut &[u8]) -> Result<CartLine, CodecError> {
    line_from_wire(read_value(input)?)
}

impl Record for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        check_text("name", &self.name, MAX_TEXT_LEN)?;
        check_text("category", &self.category, MAX_TEXT_LEN)?;
        check_amount("price", self.price())?;

        let wire = ProductWire {
            id: to_wire("id", self.id)?,
            name: self.name.clone(),
            price: self.price(),
            category: self.category.clone(),
            stock: to_wire("stock", self.stock())?,
            seller_id: to_wire("seller_id", self.seller_id)?,
        };
        write_value(&wire, out)
    }

    fn decode_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let wire: ProductWire = read_value(input)?;
        check_text("name", &wire.name, MAX_TEXT_LEN)?;
        check_text("category", &wire.category, MAX_TEXT_LEN)?;
        check_amount("price", wire.price)?;
        if wire.price < 0.0 {
            return Err(CodecError::invalid("price", format!("{} is negative", wire.price)));
        }

        Ok(Product::new(
            from_wire("id", wire.id)?,
            wire.name,
            wire.price,
            wire.category,
            from_wire("stock", wire.stock)?,
            from_wire("seller_id", wire.seller_id)?,
        ))
    }
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        check_text("username", &self.username, MAX_TEXT_LEN)?;
        check_text("credential", self.credential(), MAX_TEXT_LEN)?;
        check_count("order_history", self.order_history().len(), MAX_ORDER_HISTORY)?;

        let wire = UserWire {
            id: to_wire("id", self.id)?,
            username: self.username.clone(),
            credential: self.credential().to_string(),
            role: self.role().tag(),
            order_history: self
                .order_history()
                .iter()
                .map(|id| to_wire("order_history", *id))
                .collect::<Result<_, _>>()?,
        };
        write_value(&wire, out)
    }

    fn decode_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let wire: UserWire = read_value(input)?;
        check_text("username", &wire.username, MAX_TEXT_LEN)?;
        check_text("credential", &wire.credential, MAX_TEXT_LEN)?;
        check_count("order_history", wire.order_history.len(), MAX_ORDER_HISTORY)?;
        let role = Role::from_tag(wire.role)
            .ok_or_else(|| CodecError::invalid("role", wire.role.to_string()))?;
        let order_history = wire
            .order_history
            .into_iter()
            .map(|id| from_wire("order_history", id))
            .collect::<Result<_, _>>()?;

        Ok(User::from_parts(
            from_wire("id", wire.id)?,
            wire.username,
            wire.credential,
            role,
            order_history,
        ))
    }
}

impl Record for Order {
    const KIND: EntityKind = EntityKind::Order;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        check_text("timestamp", &self.timestamp, MAX_TEXT_LEN)?;
        check_count("items", self.items.len(), MAX_ORDER_ITEMS)?;
        check_amount("total", self.total())?;

        let wire = OrderWire {
            id: to_wire("id", self.id)?,
            user_id: to_wire("user_id", self.user_id)?,
            timestamp: self.timestamp.clone(),
            status: self.status().as_str().to_string(),
            total: self.total(),
            items: self.items.iter().map(line_to_wire).collect::<Result<_, _>>()?,
        };
        write_value(&wire, out)
    }

    fn decode_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let wire: OrderWire = read_value(input)?;
        check_text("timestamp", &wire.timestamp, MAX_TEXT_LEN)?;
        check_text("status", &wire.status, MAX_TEXT_LEN)?;
        check_count("items", wire.items.len(), MAX_ORDER_ITEMS)?;
        check_amount("total", wire.total)?;
        let status = OrderStatus::parse(&wire.status)
            .ok_or_else(|| CodecError::invalid("status", wire.status.clone()))?;
        let items = wire
            .items
            .into_iter()
            .map(line_from_wire)
            .collect::<Result<_, _>>()?;

        Ok(Order::from_parts(
            from_wire("id", wire.id)?,
            from_wire("user_id", wire.user_id)?,
            wire.timestamp,
            items,
            wire.total,
            status,
        ))
    }
}

impl Record for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        check_text("description", &self.description, MAX_DESCRIPTION_LEN)?;
        check_text("timestamp", &self.timestamp, TIMESTAMP_BUF_LEN)?;
        check_amount("amount", self.amount)?;
        if self.timestamp.contains('\0') {
            return Err(CodecError::invalid("timestamp", "contains NUL"));
        }

        let mut timestamp = [0u8; TIMESTAMP_BUF_LEN];
        timestamp[..self.timestamp.len()].copy_from_slice(self.timestamp.as_bytes());

        let wire = TransactionWire {
            id: to_wire("id", self.id)?,
            user_id: to_wire("user_id", self.user_id)?,
            product_id: match self.product_id {
                Some(id) => to_wire("product_id", id)?,
                None => NO_PRODUCT,
            },
            amount: self.amount,
            kind: self.kind.tag(),
            description: self.description.clone(),
            timestamp,
        };
        write_value(&wire, out)
    }

    fn decode_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let wire: TransactionWire = read_value(input)?;
        check_text("description", &wire.description, MAX_DESCRIPTION_LEN)?;
        check_amount("amount", wire.amount)?;
        let kind = TransactionKind::from_tag(wire.kind)
            .ok_or_else(|| CodecError::invalid("kind", wire.kind.to_string()))?;
        let product_id = match wire.product_id {
            NO_PRODUCT => None,
            id => Some(from_wire("product_id", id)?),
        };

        let end = wire
            .timestamp
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(TIMESTAMP_BUF_LEN);
        let timestamp = std::str::from_utf8(&wire.timestamp[..end])
            .map_err(|e| CodecError::invalid("timestamp", e.to_string()))?
            .to_string();

        Ok(Transaction::new(
            from_wire("id", wire.id)?,
            from_wire("user_id", wire.user_id)?,
            product_id,
            wire.amount,
            kind,
            wire.description,
            timestamp,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::{decode, decode_stream, encode, encode_all};
    use mercato_common::auth::{Argon2Scheme, CredentialScheme};

    fn product() -> Product {
        Product::new(3, "Desk Lamp", 24.99, "Home", 12, 2)
    }

    fn user() -> User {
        let credential = Argon2Scheme::fast().derive("pw").unwrap();
        User::from_parts(5, "carol".into(), credential, Role::Seller, vec![1, 4, 9])
    }

    fn order() -> Order {
        Order::new(
            8,
            5,
            "2024-01-05 10:15:00",
            vec![CartLine::new(3, 2), CartLine::new(4, 1)],
            61.5,
        )
    }

    fn transaction() -> Transaction {
        Transaction::sale(11, 5, 3, 49.98, "Order #8: Purchase: Desk Lamp", "2024-01-05 10:15:00")
    }

    #[test]
    fn test_roundtrip_representative_records() {
        let p = product();
        assert_eq!(decode::<Product>(&encode(&p).unwrap()).unwrap(), p);

        let u = user();
        assert_eq!(decode::<User>(&encode(&u).unwrap()).unwrap(), u);

        let o = order();
        assert_eq!(decode::<Order>(&encode(&o).unwrap()).unwrap(), o);

        let t = transaction();
        assert_eq!(decode::<Transaction>(&encode(&t).unwrap()).unwrap(), t);
    }

    #[test]
    fn test_roundtrip_edge_records() {
        let empty_strings = Product::new(0, "", 0.0, "", 0, 0);
        assert_eq!(decode::<Product>(&encode(&empty_strings).unwrap()).unwrap(), empty_strings);

        let max_len = "x".repeat(MAX_TEXT_LEN - 1);
        let long = Product::new(1, max_len.clone(), 1.0, max_len, 1, 1);
        assert_eq!(decode::<Product>(&encode(&long).unwrap()).unwrap(), long);

        let no_items = Order::new(1, 1, "", Vec::new(), 0.0);
        assert_eq!(decode::<Order>(&encode(&no_items).unwrap()).unwrap(), no_items);

        let full = Order::new(
            2,
            1,
            "2024-01-05 10:15:00",
            (1..=MAX_ORDER_ITEMS as u32).map(|id| CartLine::new(id, 1)).collect(),
            1.0,
        );
        assert_eq!(decode::<Order>(&encode(&full).unwrap()).unwrap(), full);

        let no_history = User::from_parts(1, "admin".into(), String::new(), Role::Admin, Vec::new());
        assert_eq!(decode::<User>(&encode(&no_history).unwrap()).unwrap(), no_history);

        let expense = Transaction::expense(1, 2, 30.0, "", "1970-01-01 00:00:00");
        assert_eq!(decode::<Transaction>(&encode(&expense).unwrap()).unwrap(), expense);

        let deposit = Transaction::new(2, 2, None, 5.0, TransactionKind::Deposit, "top-up", "");
        assert_eq!(decode::<Transaction>(&encode(&deposit).unwrap()).unwrap(), deposit);
    }

    #[test]
    fn test_product_layout_matches_field_order() {
        let bytes = encode(&Product::new(1, "ab", 2.5, "c", 4, 9)).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(b"ab");
        expected.extend_from_slice(&2.5f64.to_le_bytes());
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(b"c");
        expected.extend_from_slice(&4i32.to_le_bytes());
        expected.extend_from_slice(&9i32.to_le_bytes());

        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_transaction_layout_uses_sentinel_and_fixed_timestamp() {
        let tx = Transaction::expense(7, 2, 30.0, "rent", "2024-01-05 09:00:00");
        let bytes = encode(&tx).unwrap();

        // id, user, product, amount, kind, desc len, desc, timestamp buffer
        assert_eq!(bytes.len(), 4 + 4 + 4 + 8 + 4 + 8 + 4 + TIMESTAMP_BUF_LEN);
        assert_eq!(&bytes[8..12], &(-1i32).to_le_bytes());
        assert_eq!(&bytes[20..24], &2i32.to_le_bytes());
        assert_eq!(bytes[bytes.len() - 1], 0);
    }

    #[test]
    fn test_embedded_delimiters_survive() {
        let p = Product::new(1, "a\0b\nc", 1.0, "\0\0", 1, 1);
        assert_eq!(decode::<Product>(&encode(&p).unwrap()).unwrap(), p);
    }

    #[test]
    fn test_oversized_string_prefix_is_corrupt() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        bytes.extend_from_slice(b"abc");

        let err = decode::<Product>(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::LengthOutOfBounds { .. }), "got {err:?}");
    }

    #[test]
    fn test_string_at_bound_is_rejected() {
        let too_long = Product::new(1, "x".repeat(MAX_TEXT_LEN), 1.0, "c", 1, 1);
        assert!(matches!(
            encode(&too_long),
            Err(CodecError::LengthOutOfBounds { field: "name", .. })
        ));
    }

    #[test]
    fn test_item_count_over_cap_is_corrupt() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&7u64.to_le_bytes());
        bytes.extend_from_slice(b"Pending");
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        let count = MAX_ORDER_ITEMS as u64 + 1;
        bytes.extend_from_slice(&count.to_le_bytes());
        for _ in 0..count {
            bytes.extend_from_slice(&1i32.to_le_bytes());
            bytes.extend_from_slice(&1i32.to_le_bytes());
        }

        assert!(matches!(
            decode::<Order>(&bytes),
            Err(CodecError::LengthOutOfBounds { field: "items", .. })
        ));
    }

    #[test]
    fn test_truncated_record_is_corrupt() {
        let bytes = encode(&transaction()).unwrap();
        for cut in [0, 3, 12, bytes.len() - 1] {
            assert_eq!(decode::<Transaction>(&bytes[..cut]), Err(CodecError::Truncated), "cut at {cut}");
        }
    }

    #[test]
    fn test_invalid_values_are_corrupt() {
        let u = user();
        let mut bytes = encode(&u).unwrap();
        // role tag sits after id + two length-prefixed strings
        let role_at = 4 + 8 + u.username.len() + 8 + u.credential().len();
        bytes[role_at..role_at + 4].copy_from_slice(&7i32.to_le_bytes());
        assert!(matches!(decode::<User>(&bytes), Err(CodecError::InvalidValue { field: "role", .. })));

        let mut bytes = encode(&product()).unwrap();
        bytes[..4].copy_from_slice(&(-5i32).to_le_bytes());
        assert!(matches!(decode::<Product>(&bytes), Err(CodecError::InvalidValue { field: "id", .. })));
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let o = order();
        let mut bytes = encode(&o).unwrap();
        let status_at = 4 + 4 + 8 + o.timestamp.len() + 8;
        bytes[status_at..status_at + 7].copy_from_slice(b"Shipped");
        assert!(matches!(decode::<Order>(&bytes), Err(CodecError::InvalidValue { field: "status", .. })));
    }

    #[test]
    fn test_trailing_bytes_rejected_by_single_decode() {
        let mut bytes = encode(&product()).unwrap();
        bytes.push(0);
        assert_eq!(decode::<Product>(&bytes), Err(CodecError::TrailingBytes(1)));
    }

    #[test]
    fn test_stream_stops_at_corruption() {
        let records = vec![product(), Product::new(4, "Chair", 40.0, "Home", 1, 2), product()];
        let mut bytes = encode_all(&records).unwrap();
        let fourth = encode(&Product::new(9, "Sofa", 300.0, "Home", 1, 2)).unwrap();
        bytes.extend_from_slice(&fourth[..fourth.len() - 3]);

        let (decoded, corruption) = decode_stream::<Product>(&bytes);
        assert_eq!(decoded, records);

        let corruption = corruption.expect("truncated tail must be reported");
        assert_eq!(corruption.index, 3);
        assert_eq!(corruption.offset, encode_all(&records).unwrap().len());
        assert_eq!(corruption.error, CodecError::Truncated);
    }

    #[test]
    fn test_cart_line_rejects_zero_quantity() {
        let mut out = Vec::new();
        write_value(&(3i32, 0i32), &mut out).unwrap();
        assert!(read_line(&mut out.as_slice()).is_err());
    }
}
