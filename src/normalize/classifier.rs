use serde_json::Value;

use crate::normalize::coerce_int;
use crate::types::{DrawColor, DrawSize};

/// Color for a winning number. 0 and 5 are Violet even though 0 is even and
/// 5 is odd, so that check runs before parity.
pub fn color_for(number: i64) -> DrawColor {
    if number == 0 || number == 5 {
        DrawColor::Violet
    } else if number.rem_euclid(2) == 1 {
        DrawColor::Green
    } else {
        DrawColor::Red
    }
}

pub fn size_for(number: i64) -> DrawSize {
    if number >= 5 {
        DrawSize::Big
    } else {
        DrawSize::Small
    }
}

/// Color for any JSON value. Values that do not coerce to an integer are Unknown.
pub fn classify_color(value: &Value) -> DrawColor {
    coerce_int(value).map_or(DrawColor::Unknown, color_for)
}

/// Size for any JSON value. Values that do not coerce to an integer are Unknown.
pub fn classify_size(value: &Value) -> DrawSize {
    coerce_int(value).map_or(DrawSize::Unknown, size_for)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_and_five_are_violet() {
        assert_eq!(color_for(0), DrawColor::Violet);
        assert_eq!(color_for(5), DrawColor::Violet);
    }

    #[test]
    fn other_digits_follow_parity() {
        for n in [1, 3, 7, 9] {
            assert_eq!(color_for(n), DrawColor::Green, "n={n}");
        }
        for n in [2, 4, 6, 8] {
            assert_eq!(color_for(n), DrawColor::Red, "n={n}");
        }
    }

    #[test]
    fn parity_holds_outside_observed_range() {
        assert_eq!(color_for(11), DrawColor::Green);
        assert_eq!(color_for(10), DrawColor::Red);
        assert_eq!(color_for(-3), DrawColor::Green);
        assert_eq!(color_for(-4), DrawColor::Red);
    }

    #[test]
    fn size_splits_at_five() {
        for n in 0..5 {
            assert_eq!(size_for(n), DrawSize::Small, "n={n}");
        }
        for n in 5..10 {
            assert_eq!(size_for(n), DrawSize::Big, "n={n}");
        }
        assert_eq!(size_for(-1), DrawSize::Small);
    }

    #[test]
    fn numeric_strings_are_classified() {
        assert_eq!(classify_color(&json!("5")), DrawColor::Violet);
        assert_eq!(classify_size(&json!("5")), DrawSize::Big);
        assert_eq!(classify_color(&json!(" 8 ")), DrawColor::Red);
        assert_eq!(classify_size(&json!(3)), DrawSize::Small);
    }

    #[test]
    fn unparseable_values_are_unknown() {
        for v in [json!("seven"), json!(null), json!(true), json!(2.5), json!([1]), json!({"n": 1})] {
            assert_eq!(classify_color(&v), DrawColor::Unknown, "v={v}");
            assert_eq!(classify_size(&v), DrawSize::Unknown, "v={v}");
        }
    }
}
