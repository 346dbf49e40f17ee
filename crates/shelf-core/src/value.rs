use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What counts as "no value" when deciding whether an optional section has
/// content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptinessRule {
    /// `null`, `""`, `[]` and `{}` are empty. `0` and `false` are values.
    #[default]
    Strict,
    /// Also treats `0` and `false` as empty. Kept for layouts migrated from
    /// the old editor; it hides sections holding a legitimate `false`/`0`.
    LegacyFalsy,
}

impl EmptinessRule {
    pub fn is_present(self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Bool(b)) => *b || self == EmptinessRule::Strict,
            Some(Value::Number(n)) => {
                self == EmptinessRule::Strict || n.as_f64().is_some_and(|f| f != 0.0)
            }
        }
    }

    /// True when the two rules disagree about `value`.
    pub fn differs_from_strict(self, value: Option<&Value>) -> bool {
        self.is_present(value) != EmptinessRule::Strict.is_present(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_keeps_falsy_scalars() {
        let r = EmptinessRule::Strict;
        assert!(r.is_present(Some(&json!(0))));
        assert!(r.is_present(Some(&json!(false))));
        assert!(!r.is_present(Some(&json!(""))));
        assert!(!r.is_present(Some(&json!([]))));
        assert!(!r.is_present(Some(&json!({}))));
        assert!(!r.is_present(Some(&Value::Null)));
        assert!(!r.is_present(None));
    }

    #[test]
    fn legacy_drops_zero_and_false() {
        let r = EmptinessRule::LegacyFalsy;
        assert!(!r.is_present(Some(&json!(0))));
        assert!(!r.is_present(Some(&json!(0.0))));
        assert!(!r.is_present(Some(&json!(false))));
        assert!(r.is_present(Some(&json!(3))));
        assert!(r.differs_from_strict(Some(&json!(false))));
        assert!(!r.differs_from_strict(Some(&json!("x"))));
    }
}
