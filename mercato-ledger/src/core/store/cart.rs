//! Per-user cart snapshots: `u64` line count, then `(productId, quantity)` pairs.

use std::fs;
use std::io;

use mercato_common::types::{Cart, CartLine, MAX_CART_LINES};
use mercato_common::UserId;
use tracing::{debug, warn};

use super::{EntityStore, StagedWrite};
use crate::core::codec::wire::{read_line, write_line};
use crate::core::codec::{read_value, write_value};
use crate::error::{CodecError, Result};

/// A cart read back from disk, plus whatever went wrong reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLoad {
    pub cart: Cart,
    pub corruption: Option<CodecError>,
}

pub fn encode_cart(lines: &[CartLine]) -> std::result::Result<Vec<u8>, CodecError> {
    if lines.len() > MAX_CART_LINES {
        return Err(CodecError::LengthOutOfBounds {
            field: "cart",
            len: lines.len() as u64,
            max: MAX_CART_LINES as u64,
        });
    }

    let mut out = Vec::new();
    write_value(&(lines.len() as u64), &mut out)?;
    for line in lines {
        write_line(line, &mut out)?;
    }
    Ok(out)
}

/// Decodes as many lines as possible. Lines before the first bad one are kept.
pub fn decode_cart(bytes: &[u8]) -> (Vec<CartLine>, Option<CodecError>) {
    let mut input = bytes;
    let count: u64 = match read_value(&mut input) {
        Ok(count) => count,
        Err(e) => return (Vec::new(), Some(e)),
    };
    if count > MAX_CART_LINES as u64 {
        let err = CodecError::LengthOutOfBounds {
            field: "cart",
            len: count,
            max: MAX_CART_LINES as u64,
        };
        return (Vec::new(), Some(err));
    }

    let mut lines = Vec::with_capacity(count as usize);
    for _ in 0..count {
        match read_line(&mut input) {
            Ok(line) => lines.push(line),
            Err(e) => return (lines, Some(e)),
        }
    }

    if !input.is_empty() {
        return (lines, Some(CodecError::TrailingBytes(input.len())));
    }
    (lines, None)
}

impl EntityStore {
    /// Loads a user's saved cart. Never fails on bad data, only on I/O.
    pub fn load_cart(&self, user_id: UserId) -> Result<CartLoad> {
        let path = self.config().cart_path(user_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(CartLoad {
                    cart: Cart::for_user(user_id),
                    corruption: None,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let (lines, corruption) = decode_cart(&bytes);
        if let Some(e) = &corruption {
            warn!(
                "Cart file {} is damaged ({}). Recovered {} lines",
                path.display(),
                e,
                lines.len()
            );
        }
        debug!("Loaded cart for user {} ({} lines)", user_id, lines.len());

        Ok(CartLoad {
            cart: Cart::with_lines(user_id, lines),
            corruption,
        })
    }

    pub fn stage_cart(&self, user_id: UserId, cart: &Cart) -> Result<StagedWrite> {
        let bytes = encode_cart(cart.lines())?;
        Ok(StagedWrite::stage(self.config().cart_path(user_id), &bytes)?)
    }

    pub fn save_cart(&self, user_id: UserId, cart: &Cart) -> Result<()> {
        self.stage_cart(user_id, cart)?.commit()?;
        debug!("Saved cart for user {} ({} lines)", user_id, cart.len());
        Ok(())
    }
}
