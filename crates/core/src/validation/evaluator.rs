//! Rule evaluator: pure logic, no database access.

use validator::ValidateEmail;

use super::rules::{unique_key, FieldViolation, RuleKind, UniqueKeys, ValidationRule};
use crate::record::{FieldValue, Record};

/// Evaluate `rules` in order against one record.
///
/// Stops at the first failing rule and returns its violation. An empty rule
/// set accepts every record.
pub fn validate_record<R: Record>(
    record: &R,
    rules: &[ValidationRule],
    keys: &UniqueKeys,
) -> Result<(), FieldViolation> {
    for rule in rules {
        if !rule_passes(rule, record.field(rule.field), keys) {
            return Err(FieldViolation::from_rule(rule));
        }
    }
    Ok(())
}

fn rule_passes(rule: &ValidationRule, value: Option<FieldValue<'_>>, keys: &UniqueKeys) -> bool {
    use FieldValue as V;

    let value = match (&rule.kind, value) {
        (RuleKind::Required, None) => return false,
        (RuleKind::Required, Some(V::Text(s))) => return !s.trim().is_empty(),
        (RuleKind::Required, Some(_)) => return true,
        // Only `Required` enforces presence.
        (_, None) => return true,
        (_, Some(v)) => v,
    };

    match (&rule.kind, value) {
        (RuleKind::MinLength(min), V::Text(s)) => s.chars().count() >= *min,
        (RuleKind::MaxLength(max), V::Text(s)) => s.chars().count() <= *max,
        (RuleKind::Email, V::Text(s)) => s.validate_email(),
        (RuleKind::Pattern(re), V::Text(s)) => re.is_match(s),
        (RuleKind::MinValue(min), V::Integer(n)) => n >= *min,
        (RuleKind::MaxValue(max), V::Integer(n)) => n <= *max,
        (RuleKind::MinMoney(min), V::Money(m)) => m >= *min,
        (RuleKind::NonEmptyList, V::Ids(ids)) => !ids.is_empty(),
        (RuleKind::Unique, v) => {
            unique_key(&v).map_or(true, |key| !keys.is_taken(rule.field, &key))
        }
        // A rule aimed at a different value kind does not apply.
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::record::{Fields, StructureError};
    use regex::Regex;

    /// A single-field record that can hold any value kind.
    struct Probe(Option<ProbeValue>);

    enum ProbeValue {
        Text(String),
        Integer(i64),
        Money(Money),
        Ids(Vec<i64>),
    }

    impl Record for Probe {
        const ENTITY: &'static str = "probe";

        fn from_fields(_: &Fields) -> Result<Self, StructureError> {
            Ok(Probe(None))
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            if name != "test_field" {
                return None;
            }
            self.0.as_ref().map(|v| match v {
                ProbeValue::Text(s) => FieldValue::Text(s),
                ProbeValue::Integer(n) => FieldValue::Integer(*n),
                ProbeValue::Money(m) => FieldValue::Money(*m),
                ProbeValue::Ids(ids) => FieldValue::Ids(ids),
            })
        }
    }

    fn text(s: &str) -> Probe {
        Probe(Some(ProbeValue::Text(s.to_string())))
    }

    fn rule(kind: RuleKind) -> ValidationRule {
        let message = format!("{} failed", kind.name());
        ValidationRule::new("test_field", kind, message)
    }

    fn check(kind: RuleKind, record: &Probe) -> Result<(), FieldViolation> {
        validate_record(record, &[rule(kind)], &UniqueKeys::new())
    }

    #[test]
    fn empty_rule_set_accepts_everything() {
        assert!(validate_record(&Probe(None), &[], &UniqueKeys::new()).is_ok());
    }

    #[test]
    fn required_fails_missing_and_blank() {
        assert!(check(RuleKind::Required, &text("hello")).is_ok());
        assert!(check(RuleKind::Required, &Probe(None)).is_err());
        assert!(check(RuleKind::Required, &text("")).is_err());
        assert!(check(RuleKind::Required, &text("   ")).is_err());
        assert!(check(RuleKind::Required, &Probe(Some(ProbeValue::Integer(0)))).is_ok());
    }

    #[test]
    fn non_required_rules_skip_absent_fields() {
        assert!(check(RuleKind::MaxLength(1), &Probe(None)).is_ok());
        assert!(check(RuleKind::Email, &Probe(None)).is_ok());
        assert!(check(RuleKind::NonEmptyList, &Probe(None)).is_ok());
    }

    #[test]
    fn length_counts_characters() {
        assert!(check(RuleKind::MaxLength(5), &text("héllo")).is_ok());
        assert!(check(RuleKind::MaxLength(4), &text("héllo")).is_err());
        assert!(check(RuleKind::MinLength(2), &text("a")).is_err());
    }

    #[test]
    fn email_requires_at_and_domain() {
        assert!(check(RuleKind::Email, &text("a@x.com")).is_ok());
        assert!(check(RuleKind::Email, &text("not-an-email")).is_err());
        assert!(check(RuleKind::Email, &text("a@")).is_err());
    }

    #[test]
    fn pattern_must_match() {
        let re = Regex::new(r"^\d{3}$").unwrap();
        assert!(check(RuleKind::Pattern(re.clone()), &text("123")).is_ok());
        assert!(check(RuleKind::Pattern(re), &text("12a")).is_err());
    }

    #[test]
    fn numeric_bounds() {
        let n = |v| Probe(Some(ProbeValue::Integer(v)));
        assert!(check(RuleKind::MinValue(0), &n(0)).is_ok());
        assert!(check(RuleKind::MinValue(0), &n(-1)).is_err());
        assert!(check(RuleKind::MaxValue(10), &n(11)).is_err());

        let m = |c| Probe(Some(ProbeValue::Money(Money::from_cents(c))));
        assert!(check(RuleKind::MinMoney(Money::from_cents(1)), &m(1)).is_ok());
        assert!(check(RuleKind::MinMoney(Money::from_cents(1)), &m(0)).is_err());
    }

    #[test]
    fn non_empty_list() {
        let ids = |v: Vec<i64>| Probe(Some(ProbeValue::Ids(v)));
        assert!(check(RuleKind::NonEmptyList, &ids(vec![1])).is_ok());
        assert!(check(RuleKind::NonEmptyList, &ids(vec![])).is_err());
    }

    #[test]
    fn rule_for_other_value_kind_does_not_apply() {
        let record = Probe(Some(ProbeValue::Integer(42)));
        assert!(check(RuleKind::MaxLength(1), &record).is_ok());
        assert!(check(RuleKind::Email, &record).is_ok());
    }

    #[test]
    fn unique_consults_taken_keys() {
        let keys = UniqueKeys::new().with_existing("test_field", ["Taken"]);
        let rules = [rule(RuleKind::Unique)];
        assert!(validate_record(&text("taken"), &rules, &keys).is_err());
        assert!(validate_record(&text("free"), &rules, &keys).is_ok());
    }

    #[test]
    fn stops_at_first_failing_rule() {
        let rules = [
            rule(RuleKind::Required),
            rule(RuleKind::MaxLength(2)),
            rule(RuleKind::Email),
        ];
        let violation = validate_record(&text("hello"), &rules, &UniqueKeys::new()).unwrap_err();
        assert_eq!(violation.rule_type, "max_length");
        assert_eq!(violation.message, "max_length failed");
    }
}
