use busctl_core::decoder::MAX_VARIANT_DEPTH;
use busctl_core::{tokenize, unmarshal, unmarshal_response, unmarshal_tokens};
use busctl_core::{BusctlError, TokenCursor, Value};

fn strings(items: &[&str]) -> Value {
    Value::Array(items.iter().map(|item| Value::from(*item)).collect())
}

fn dict(entries: Vec<(&str, Value)>) -> Value {
    Value::Dict(
        entries
            .into_iter()
            .map(|(key, value)| (Value::from(key), value))
            .collect(),
    )
}

// ============================================================================
// Basic types
// ============================================================================

#[test]
fn empty_input_is_null() {
    assert_eq!(unmarshal_response("").unwrap(), Value::Null);
    assert_eq!(unmarshal_response("   ").unwrap(), Value::Null);
}

#[test]
fn missing_value_is_null() {
    assert_eq!(unmarshal_response("s").unwrap(), Value::Null);
}

#[test]
fn string() {
    assert_eq!(
        unmarshal_response(r#"s "hello world""#).unwrap(),
        Value::from("hello world")
    );
}

#[test]
fn string_with_escaped_quotes() {
    assert_eq!(
        unmarshal_response(r#"s "say \"hi\"""#).unwrap(),
        Value::from(r#"say "hi""#)
    );
}

#[test]
fn object_path() {
    assert_eq!(
        unmarshal_response("o /org/freedesktop/NetworkManager/Devices/1").unwrap(),
        Value::from("/org/freedesktop/NetworkManager/Devices/1")
    );
}

#[test]
fn booleans() {
    assert_eq!(unmarshal_response("b true").unwrap(), Value::Bool(true));
    assert_eq!(unmarshal_response("b false").unwrap(), Value::Bool(false));
}

#[test]
fn integers() {
    assert_eq!(unmarshal_response("y 255").unwrap(), Value::Int(255));
    assert_eq!(unmarshal_response("x -5").unwrap(), Value::Int(-5));
    assert_eq!(
        unmarshal_response("t 18446744073709551615").unwrap(),
        Value::UInt(u64::MAX)
    );
}

#[test]
fn double() {
    assert_eq!(unmarshal_response("d 12.5").unwrap(), Value::Double(12.5));
    assert_eq!(unmarshal_response("d 3").unwrap(), Value::Double(3.0));
}

#[test]
fn variant_of_string() {
    assert_eq!(
        unmarshal_response(r#"v s "variant""#).unwrap(),
        Value::from("variant")
    );
}

#[test]
fn variant_of_array() {
    assert_eq!(
        unmarshal_response(r#"v as 2 "hello" "world""#).unwrap(),
        strings(&["hello", "world"])
    );
}

// ============================================================================
// Multiple top-level types
// ============================================================================

#[test]
fn string_and_integer() {
    assert_eq!(
        unmarshal_response(r#"su "hello world" 123"#).unwrap(),
        Value::Array(vec![Value::from("hello world"), Value::Int(123)])
    );
}

#[test]
fn sibling_structs() {
    assert_eq!(
        unmarshal_response("(i)(i) 1 2").unwrap(),
        Value::Array(vec![Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn struct_followed_by_scalar() {
    assert_eq!(
        unmarshal_response(r#"(si)u "a" 1 7"#).unwrap(),
        Value::Array(vec![
            Value::Array(vec![Value::from("a"), Value::Int(1)]),
            Value::Int(7),
        ])
    );
}

#[test]
fn scalars_around_dict() {
    assert_eq!(
        unmarshal_response(r#"sa{sv}y "x" 1 "k" b true 9"#).unwrap(),
        Value::Array(vec![
            Value::from("x"),
            dict(vec![("k", Value::Bool(true))]),
            Value::Int(9),
        ])
    );
}

// ============================================================================
// Structs
// ============================================================================

#[test]
fn struct_spanning_signature_collapses() {
    assert_eq!(
        unmarshal_response(r#"(sy) "hello world" 123"#).unwrap(),
        Value::Array(vec![Value::from("hello world"), Value::Int(123)])
    );
}

#[test]
fn single_field_struct_collapses_to_field() {
    assert_eq!(unmarshal_response(r#"(s) "only""#).unwrap(), Value::from("only"));
}

#[test]
fn nested_struct() {
    assert_eq!(
        unmarshal_response(r#"((ybs)) 1 true "string""#).unwrap(),
        Value::Array(vec![
            Value::Int(1),
            Value::Bool(true),
            Value::from("string"),
        ])
    );
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn byte_array() {
    assert_eq!(
        unmarshal_response("ay 3 1 2 3").unwrap(),
        Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn empty_array() {
    assert_eq!(unmarshal_response("as 0").unwrap(), Value::Array(vec![]));
}

#[test]
fn array_without_count_is_empty() {
    assert_eq!(unmarshal_response("as").unwrap(), Value::Array(vec![]));
}

#[test]
fn array_of_arrays() {
    assert_eq!(
        unmarshal_response(r#"aas 2 1 "hello" 2 "old" "new""#).unwrap(),
        Value::Array(vec![strings(&["hello"]), strings(&["old", "new"])])
    );
}

#[test]
fn array_of_structs() {
    assert_eq!(
        unmarshal_response(r#"a(sy) 2 "a" 1 "b" 2"#).unwrap(),
        Value::Array(vec![
            Value::Array(vec![Value::from("a"), Value::Int(1)]),
            Value::Array(vec![Value::from("b"), Value::Int(2)]),
        ])
    );
}

#[test]
fn array_of_object_paths() {
    assert_eq!(
        unmarshal_response("ao 2 /org/a /org/b").unwrap(),
        strings(&["/org/a", "/org/b"])
    );
}

#[test]
fn struct_with_array_field() {
    assert_eq!(
        unmarshal_response(r#"(asy) 2 "hello" "world" 123"#).unwrap(),
        Value::Array(vec![strings(&["hello", "world"]), Value::Int(123)])
    );
}

// ============================================================================
// Dictionaries
// ============================================================================

#[test]
fn dict_of_variants() {
    let value = unmarshal_response(r#"a{sv} 2 "Id" s "eth0" "Mtu" u 1500"#).unwrap();
    assert_eq!(
        value,
        dict(vec![("Id", Value::from("eth0")), ("Mtu", Value::Int(1500))])
    );
    assert_eq!(value.get("Mtu").and_then(Value::as_u64), Some(1500));
}

#[test]
fn nested_dict() {
    assert_eq!(
        unmarshal_response(r#"a{sa{sv}} 1 "key" 1 "item" y 123"#).unwrap(),
        dict(vec![("key", dict(vec![("item", Value::Int(123))]))])
    );
}

#[test]
fn dict_with_array_values() {
    assert_eq!(
        unmarshal_response(r#"a{sas} 1 "hello" 2 "old world" "new world""#).unwrap(),
        dict(vec![("hello", strings(&["old world", "new world"]))])
    );
}

#[test]
fn dict_with_integer_keys() {
    assert_eq!(
        unmarshal_response(r#"a{us} 2 1 "one" 2 "two""#).unwrap(),
        Value::Dict(vec![
            (Value::Int(1), Value::from("one")),
            (Value::Int(2), Value::from("two")),
        ])
    );
}

#[test]
fn duplicate_dict_key_keeps_last_value() {
    assert_eq!(
        unmarshal_response(r#"a{si} 2 "k" 1 "k" 2"#).unwrap(),
        dict(vec![("k", Value::Int(2))])
    );
}

#[test]
fn empty_dict() {
    assert_eq!(unmarshal_response("a{sv} 0").unwrap(), Value::Dict(vec![]));
}

#[test]
fn array_of_dicts() {
    assert_eq!(
        unmarshal_response(r#"aa{sv} 2 1 "a" b true 0"#).unwrap(),
        Value::Array(vec![dict(vec![("a", Value::Bool(true))]), Value::Dict(vec![])])
    );
}

// ============================================================================
// Token-level entry points
// ============================================================================

#[test]
fn unmarshal_tokens_without_signature_token() {
    let tokens = tokenize(r#"1 "key" 1 "item" y 123"#);
    assert_eq!(
        unmarshal_tokens("a{sa{sv}}", &tokens).unwrap(),
        dict(vec![("key", dict(vec![("item", Value::Int(123))]))])
    );
}

#[test]
fn cursor_stops_after_value() {
    let tokens = tokenize(r#""first" "second""#);
    let mut cursor = TokenCursor::new(&tokens);

    assert_eq!(unmarshal("s", &mut cursor).unwrap(), Value::from("first"));
    assert_eq!(cursor.position(), 1);
    assert_eq!(cursor.remaining(), &tokens[1..]);
    assert!(!cursor.is_exhausted());

    assert_eq!(unmarshal("s", &mut cursor).unwrap(), Value::from("second"));
    assert!(cursor.is_exhausted());
    assert_eq!(cursor.next_token(), None);
}

#[test]
fn leftover_tokens_are_ignored() {
    assert_eq!(unmarshal_response("y 1 2 3").unwrap(), Value::Int(1));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn unknown_signature_character() {
    match unmarshal_response(r#"sp "hello world" 123"#) {
        Err(BusctlError::UnknownSignature('p')) => {}
        other => panic!("expected UnknownSignature('p'), got {other:?}"),
    }
}

#[test]
fn unknown_signature_inside_variant() {
    assert!(matches!(
        unmarshal_response("v z 1"),
        Err(BusctlError::UnknownSignature('z'))
    ));
}

#[test]
fn unbalanced_struct() {
    assert!(matches!(
        unmarshal_response(r#"(si "a" 1"#),
        Err(BusctlError::InvalidSignature { .. })
    ));
}

#[test]
fn malformed_integer_token() {
    match unmarshal_response("y abc") {
        Err(BusctlError::InvalidToken { position, message }) => {
            assert_eq!(position, 0);
            assert!(message.contains("abc"), "unexpected message: {message}");
        }
        other => panic!("expected InvalidToken, got {other:?}"),
    }
}

#[test]
fn malformed_count_token() {
    assert!(matches!(
        unmarshal_response(r#"as many "a""#),
        Err(BusctlError::InvalidToken { position: 0, .. })
    ));
}

#[test]
fn truncated_array() {
    match unmarshal_response("ay 3 1") {
        Err(BusctlError::InvalidToken { position, .. }) => assert_eq!(position, 2),
        other => panic!("expected InvalidToken, got {other:?}"),
    }
}

#[test]
fn stray_closer_is_invalid_signature() {
    assert!(matches!(
        unmarshal_response(r#"s) "a""#),
        Err(BusctlError::InvalidSignature { .. })
    ));
    assert!(matches!(
        unmarshal_response(r#"s} "a""#),
        Err(BusctlError::InvalidSignature { .. })
    ));
}

// ============================================================================
// Hostile input
// ============================================================================

#[test]
fn empty_struct_element_is_rejected() {
    assert!(matches!(
        unmarshal_response("a() 5 x"),
        Err(BusctlError::InvalidSignature { .. })
    ));
    assert!(matches!(
        unmarshal_response(&format!("a() {} x", usize::MAX)),
        Err(BusctlError::InvalidSignature { .. })
    ));
}

#[test]
fn empty_struct_inside_variant_is_rejected() {
    assert!(matches!(
        unmarshal_response("av 1 a() 5 x"),
        Err(BusctlError::InvalidSignature { .. })
    ));
}

#[test]
fn deeply_nested_array_signature_is_an_error() {
    let raw = format!("{}y 0", "a".repeat(200_000));
    assert!(matches!(
        unmarshal_response(&raw),
        Err(BusctlError::InvalidSignature { .. })
    ));
}

#[test]
fn deepest_allowed_array_decodes() {
    let raw = format!("{}y 1 1 1", "a".repeat(3));
    assert_eq!(
        unmarshal_response(&raw).unwrap(),
        Value::Array(vec![Value::Array(vec![Value::Array(vec![Value::Int(1)])])])
    );

    let raw = format!("{}y 0", "a".repeat(32));
    assert_eq!(unmarshal_response(&raw).unwrap(), Value::Array(vec![]));
}

#[test]
fn deeply_nested_struct_signature_is_an_error() {
    let raw = format!("{}y{} 1", "(".repeat(10_000), ")".repeat(10_000));
    assert!(matches!(
        unmarshal_response(&raw),
        Err(BusctlError::InvalidSignature { .. })
    ));
}

#[test]
fn variant_nesting_limit() {
    let deepest = format!("v {}y 7", "v ".repeat(MAX_VARIANT_DEPTH - 1));
    assert_eq!(unmarshal_response(&deepest).unwrap(), Value::Int(7));

    let too_deep = format!("v {}y 7", "v ".repeat(MAX_VARIANT_DEPTH));
    assert!(matches!(
        unmarshal_response(&too_deep),
        Err(BusctlError::InvalidToken { .. })
    ));

    let hostile = format!("v {}y 7", "v ".repeat(200_000));
    assert!(matches!(
        unmarshal_response(&hostile),
        Err(BusctlError::InvalidToken { .. })
    ));
}

#[test]
fn variant_depth_resets_between_siblings() {
    let nested = format!("{}y 1", "v ".repeat(MAX_VARIANT_DEPTH - 1));
    let raw = format!("vv {nested} {nested}");
    assert_eq!(
        unmarshal_response(&raw).unwrap(),
        Value::Array(vec![Value::Int(1), Value::Int(1)])
    );
}

#[test]
fn large_dict_with_repeated_keys() {
    let count = 50_000;
    let mut raw = format!("a{{is}} {}", count * 2);
    for n in 0..count {
        raw.push_str(&format!(" {n} \"first\""));
    }
    for n in 0..count {
        raw.push_str(&format!(" {n} \"second\""));
    }

    let decoded = unmarshal_response(&raw).unwrap();
    let entries = decoded.as_dict().unwrap();
    assert_eq!(entries.len(), count);
    assert_eq!(entries[0], (Value::Int(0), Value::from("second")));
    assert_eq!(
        entries[count - 1],
        (Value::Int(count as i64 - 1), Value::from("second"))
    );
}

#[test]
fn double_keys_treat_signed_zero_as_equal() {
    assert_eq!(
        unmarshal_response(r#"a{ds} 3 0.0 "a" 1.5 "b" -0.0 "c""#).unwrap(),
        Value::Dict(vec![
            (Value::Double(0.0), Value::from("c")),
            (Value::Double(1.5), Value::from("b")),
        ])
    );
}
