pub mod auth;
pub mod books;
pub mod buyers;
pub mod detail_orders;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod users;
pub mod vouchers;

use serde::{Deserialize, Deserializer};

/// Treats an empty or whitespace-only string the same as an absent one.
pub(crate) fn filled(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// For `#[serde(default, deserialize_with = "nullable")]`: an absent field stays
/// `None`, an explicit `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{filled, orders::UpdateOrderRequest};

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(filled(None), None);
        assert_eq!(filled(Some("  ".into())), None);
        assert_eq!(filled(Some("P1".into())), Some("P1".into()));
    }

    #[test]
    fn explicit_null_differs_from_absent() {
        let absent: UpdateOrderRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.user_id, None);

        let cleared: UpdateOrderRequest =
            serde_json::from_str(r#"{"user_id": null, "buyer_id": 9}"#).unwrap();
        assert_eq!(cleared.user_id, Some(None));
        assert_eq!(cleared.buyer_id, Some(Some(9)));
    }
}
