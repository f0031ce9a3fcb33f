use rand::Rng;

/// Generate a fresh 128-bit trace id as 32 lowercase hex characters.
pub fn new_trace_id() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

/// Generate a fresh 64-bit span id as 16 lowercase hex characters.
pub fn new_span_id() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_ids_are_fixed_width_hex() {
        let id = new_trace_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn span_ids_are_fixed_width_hex() {
        let id = new_span_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn consecutive_ids_differ() {
        assert_ne!(new_trace_id(), new_trace_id());
        assert_ne!(new_span_id(), new_span_id());
    }
}
