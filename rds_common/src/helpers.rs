use rand::{distributions::Alphanumeric, Rng};

/// Generates a random lowercase hex token of `2 * bytes` characters. Used for access tokens and invitation codes.
pub fn random_hex_token(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..bytes).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

/// Generates a random alphanumeric identifier of the given length.
pub fn random_id(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect::<String>().to_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_token_has_expected_length() {
        assert_eq!(random_hex_token(32).len(), 64);
        assert!(random_hex_token(8).chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn random_ids_are_distinct() {
        assert_ne!(random_id(26), random_id(26));
    }
}
