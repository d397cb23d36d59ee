use serde_json::Value;

/// Returns the value of the first candidate key present in `item` with a
/// non-null value. Candidate order decides ties, not the order keys appear in
/// the item. Non-object items resolve to nothing.
pub fn resolve<'a>(item: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    let map = item.as_object()?;
    candidates
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NUMBER_KEYS, PERIOD_KEYS};
    use serde_json::json;

    #[test]
    fn first_candidate_wins_regardless_of_item_order() {
        let item = json!({ "period": "2", "issue": "1" });
        assert_eq!(resolve(&item, PERIOD_KEYS), Some(&json!("1")));
    }

    #[test]
    fn null_values_are_skipped() {
        let item = json!({ "issueNumber": null, "planNo": 42 });
        assert_eq!(resolve(&item, PERIOD_KEYS), Some(&json!(42)));
    }

    #[test]
    fn absent_when_no_candidate_present() {
        let item = json!({ "id": 1, "value": 7 });
        assert_eq!(resolve(&item, NUMBER_KEYS), None);
    }

    #[test]
    fn renamed_number_field_is_found() {
        let item = json!({ "issueNo": "20240101001", "openNumber": "7" });
        assert_eq!(resolve(&item, NUMBER_KEYS), Some(&json!("7")));
    }

    #[test]
    fn non_object_items_resolve_to_none() {
        assert_eq!(resolve(&json!([1, 2]), PERIOD_KEYS), None);
        assert_eq!(resolve(&json!("issueNumber"), PERIOD_KEYS), None);
        assert_eq!(resolve(&json!(null), PERIOD_KEYS), None);
    }
}
