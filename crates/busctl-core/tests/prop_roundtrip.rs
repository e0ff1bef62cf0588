/// Property-based round trips through the busctl text format.
///
/// Random values are wrapped in data objects, marshalled, then decoded with
/// `unmarshal_response`; the decoded `Value` must match the input.
///
/// Strategies generate:
/// - Arbitrary strings (quotes, backslashes, whitespace and unicode included)
/// - Every integer kind across its full range, and finite doubles
/// - Valid object paths
/// - Non-empty arrays and dictionaries of scalars
/// - Dictionaries of variants
use busctl_core::factory::{a, b, d, e, i, n, o, q, s, t, u, v, x, y};
use busctl_core::{marshal, tokenize, unmarshal_response, unquote, DataObject, Value};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn round_trip(object: &DataObject) -> Value {
    let text = marshal(object)
        .expect("marshal should succeed")
        .expect("payload should render");
    unmarshal_response(&text).expect("unmarshal should succeed")
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_object_path() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/".to_string()),
        prop::string::string_regex("(/[A-Za-z0-9_]{1,8}){1,5}").unwrap(),
    ]
}

fn arb_finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |f| f.is_finite())
}

// ============================================================================
// Scalars
// ============================================================================

proptest! {
    #[test]
    fn string_round_trips(value in any::<String>()) {
        prop_assert_eq!(round_trip(&s(value.as_str())), Value::String(value));
    }

    #[test]
    fn quoted_token_unquotes_to_original(value in any::<String>()) {
        let rendered = s(value.as_str()).value(false).unwrap();
        let tokens = tokenize(&rendered);
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(unquote(&tokens[0]), value);
    }

    #[test]
    fn object_path_round_trips(path in arb_object_path()) {
        let object = o(path.as_str()).unwrap();
        prop_assert_eq!(round_trip(&object), Value::String(path));
    }

    #[test]
    fn boolean_round_trips(value in any::<bool>()) {
        prop_assert_eq!(round_trip(&b(value)), Value::Bool(value));
    }

    #[test]
    fn small_integers_round_trip(
        byte in any::<u8>(),
        int16 in any::<i16>(),
        uint16 in any::<u16>(),
        int32 in any::<i32>(),
        uint32 in any::<u32>(),
    ) {
        prop_assert_eq!(round_trip(&y(byte)), Value::Int(byte.into()));
        prop_assert_eq!(round_trip(&n(int16)), Value::Int(int16.into()));
        prop_assert_eq!(round_trip(&q(uint16)), Value::Int(uint16.into()));
        prop_assert_eq!(round_trip(&i(int32)), Value::Int(int32.into()));
        prop_assert_eq!(round_trip(&u(uint32)), Value::Int(uint32.into()));
    }

    #[test]
    fn int64_round_trips(value in any::<i64>()) {
        prop_assert_eq!(round_trip(&x(value)), Value::Int(value));
    }

    #[test]
    fn uint64_round_trips(value in any::<u64>()) {
        prop_assert_eq!(round_trip(&t(value)).as_u64(), Some(value));
    }

    #[test]
    fn double_round_trips(value in arb_finite_f64()) {
        prop_assert_eq!(round_trip(&d(value)), Value::Double(value));
    }
}

// ============================================================================
// Containers
// ============================================================================

proptest! {
    #[test]
    fn uint32_array_round_trips(values in prop::collection::vec(any::<u32>(), 1..16)) {
        let object = a(values.iter().map(|&value| u(value))).unwrap();
        let expected = Value::Array(values.into_iter().map(|value| Value::Int(value.into())).collect());
        prop_assert_eq!(round_trip(&object), expected);
    }

    #[test]
    fn string_array_round_trips(values in prop::collection::vec(any::<String>(), 1..8)) {
        let object = a(values.iter().map(|value| s(value.as_str()))).unwrap();
        let expected = Value::Array(values.into_iter().map(Value::String).collect());
        prop_assert_eq!(round_trip(&object), expected);
    }

    #[test]
    fn string_dict_round_trips(
        entries in prop::collection::btree_map("[a-zA-Z0-9 _.-]{0,12}", any::<String>(), 1..8)
    ) {
        let object = e(entries.iter().map(|(key, value)| (s(key.as_str()), s(value.as_str())))).unwrap();
        let expected = Value::Dict(
            entries
                .into_iter()
                .map(|(key, value)| (Value::String(key), Value::String(value)))
                .collect(),
        );
        prop_assert_eq!(round_trip(&object), expected);
    }

    #[test]
    fn variant_dict_round_trips(entries in prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 1..8)) {
        let object = e(entries.iter().map(|(key, &value)| (s(key.as_str()), v(i(value)).unwrap()))).unwrap();
        let decoded = round_trip(&object);
        let decoded: BTreeMap<String, i64> = decoded
            .as_dict()
            .unwrap()
            .iter()
            .map(|(key, value)| (key.as_str().unwrap().to_string(), value.as_i64().unwrap()))
            .collect();
        let expected: BTreeMap<String, i64> =
            entries.into_iter().map(|(key, value)| (key, value.into())).collect();
        prop_assert_eq!(decoded, expected);
    }
}
