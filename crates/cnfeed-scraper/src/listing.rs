//! Locates the vehicle collection inside the parsed page payload.

use serde_json::Value;

use crate::types::whole_number;

/// Vehicles found in one page payload, plus the total the marketplace reports
/// for the dealer (which may exceed `items.len()` when the page is paginated).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleListing {
    pub items: Vec<Value>,
    pub total_results: u64,
}

/// Pulls `vehiclesList` out of the payload.
///
/// Accepted shapes:
/// - `{"vehiclesList": {"items": [...], "totalResults": N}}`
/// - `{"vehiclesList": [...]}`
///
/// Anything else yields an empty listing. `totalResults` falls back to the
/// item count unless it is a non-negative whole number (`57` or `57.0`).
#[must_use]
pub fn extract_vehicles_list(payload: &Value) -> VehicleListing {
    let list = payload.get("vehiclesList");

    let items = match list {
        Some(Value::Object(map)) => match map.get("items") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let total_results = list
        .and_then(|l| l.get("totalResults"))
        .and_then(Value::as_number)
        .and_then(whole_number)
        .and_then(|n| n.as_u64())
        .unwrap_or(items.len() as u64);

    if list.is_none() {
        tracing::debug!("payload has no vehiclesList; treating as zero vehicles");
    }

    VehicleListing {
        items,
        total_results,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn object_with_items_and_total() {
        let payload = json!({"vehiclesList": {"items": [{"id": 1}, {"id": 2}], "totalResults": 57}});
        let listing = extract_vehicles_list(&payload);
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.total_results, 57);
    }

    #[test]
    fn total_defaults_to_item_count() {
        let payload = json!({"vehiclesList": {"items": [{"id": 1}, {"id": 2}]}});
        assert_eq!(extract_vehicles_list(&payload).total_results, 2);
    }

    #[test]
    fn non_numeric_total_defaults_to_item_count() {
        let payload = json!({"vehiclesList": {"items": [{"id": 1}], "totalResults": "57"}});
        assert_eq!(extract_vehicles_list(&payload).total_results, 1);
    }

    #[test]
    fn whole_float_total_is_kept() {
        let payload = json!({"vehiclesList": {"items": [{"id": 1}], "totalResults": 57.0}});
        assert_eq!(extract_vehicles_list(&payload).total_results, 57);
    }

    #[test]
    fn fractional_or_negative_total_defaults_to_item_count() {
        for total in [json!(57.5), json!(-3)] {
            let payload = json!({"vehiclesList": {"items": [{"id": 1}], "totalResults": total}});
            assert_eq!(extract_vehicles_list(&payload).total_results, 1, "{total}");
        }
    }

    #[test]
    fn direct_array() {
        let payload = json!({"vehiclesList": [{"id": 1}, {"id": 2}, {"id": 3}]});
        let listing = extract_vehicles_list(&payload);
        assert_eq!(listing.items.len(), 3);
        assert_eq!(listing.total_results, 3);
    }

    #[test]
    fn missing_list_is_empty() {
        let listing = extract_vehicles_list(&json!({"dealer": {"name": "x"}}));
        assert_eq!(listing, VehicleListing::default());
    }

    #[test]
    fn items_not_an_array_is_empty() {
        let payload = json!({"vehiclesList": {"items": {"id": 1}, "totalResults": 4}});
        let listing = extract_vehicles_list(&payload);
        assert!(listing.items.is_empty());
        assert_eq!(listing.total_results, 4);
    }

    #[test]
    fn non_object_payload_is_empty() {
        assert!(extract_vehicles_list(&json!([1, 2, 3])).items.is_empty());
        assert!(extract_vehicles_list(&Value::Null).items.is_empty());
    }

    #[test]
    fn item_order_is_preserved() {
        let payload = json!({"vehiclesList": {"items": [{"id": "b"}, {"id": "a"}]}});
        let listing = extract_vehicles_list(&payload);
        assert_eq!(listing.items[0]["id"], json!("b"));
        assert_eq!(listing.items[1]["id"], json!("a"));
    }
}
