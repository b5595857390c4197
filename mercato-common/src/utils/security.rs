use rand::{rngs::OsRng, RngCore};

/// Bytes of salt mixed into every derived credential.
pub const SALT_LEN: usize = 16;

/// Fresh random salt for credential derivation.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salts_differ() {
        let first = generate_salt();
        let second = generate_salt();
        assert_ne!(first, second, "two salts in a row collided");
        assert_ne!(first, [0u8; SALT_LEN]);
    }
}
