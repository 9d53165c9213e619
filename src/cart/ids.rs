use crate::uuid_id;

uuid_id!(CartId);

#[cfg(test)]
mod tests {
    use super::CartId;
    use std::str::FromStr;

    #[test]
    fn cart_id_round_trips_through_display_and_from_str() {
        let id = CartId::new();
        let parsed = CartId::from_str(&id.to_string()).expect("valid uuid");
        assert_eq!(id, parsed);
    }
}
