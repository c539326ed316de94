use serde::Deserialize;
use serde_json::json;

use super::*;

#[derive(Debug, Deserialize, PartialEq)]
struct Counter {
    count: i64,
}

#[test]
fn serde_validator_accepts_matching_shape() {
    let validator = Validator::<Counter>::serde();
    assert_eq!(validator.validate(json!({"count": 2})), Ok(Counter { count: 2 }));
}

#[test]
fn serde_validator_rejects_wrong_shape() {
    let validator = Validator::<Counter>::serde();
    let err = validator.validate(json!({"count": "two"})).expect_err("string count");
    assert!(err.message().contains("invalid type"));
}

#[test]
fn check_validator_applies_predicate_after_deserializing() {
    let validator = Validator::<Counter>::check(|c| {
        if c.count >= 0 { Ok(()) } else { Err("count must be non-negative".to_owned()) }
    });
    assert_eq!(validator.validate(json!({"count": 0})), Ok(Counter { count: 0 }));
    assert_eq!(
        validator.validate(json!({"count": -1})),
        Err(ValidationError::new("count must be non-negative"))
    );
}

#[test]
fn custom_validator_can_normalize_input() {
    let validator = Validator::new(|value: Value| {
        value
            .get("count")
            .and_then(Value::as_i64)
            .map(|count| Counter { count: count.clamp(0, 10) })
            .ok_or_else(|| ValidationError::new("missing count"))
    });
    assert_eq!(validator.validate(json!({"count": 99})), Ok(Counter { count: 10 }));
    assert!(validator.validate(json!([])).is_err());
}

#[test]
fn cloned_validator_shares_the_check() {
    let validator = Validator::<Counter>::serde();
    let cloned = validator.clone();
    assert_eq!(cloned.validate(json!({"count": 5})), Ok(Counter { count: 5 }));
}
