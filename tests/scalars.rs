use indoc::indoc;
use saphyr_json::{DuplicateKeyPolicy, Error, Options, Value, from_str, from_str_with_options, to_string};

#[test]
fn plain_scalars_resolve_to_json_types() {
    let yaml = indoc! {"
        null_value: ~
        empty:
        yes_is_text: yes
        bool: true
        hex: 0x1F
        octal: 0o17
        negative: -42
        big: 18446744073709551615
        float: 1.5
        exp: 1e3
        quoted_number: '42'
        text: hello
    "};
    let value = from_str(yaml).unwrap();
    assert_eq!(
        to_string(&value).unwrap(),
        r#"{"null_value":null,"empty":null,"yes_is_text":"yes","bool":true,"hex":31,"octal":15,"negative":-42,"big":18446744073709551615,"float":1.5,"exp":1000.0,"quoted_number":"42","text":"hello"}"#
    );
}

#[test]
fn yaml_11_booleans_on_request() {
    let options = saphyr_json::options! { strict_booleans: false };
    let value = from_str_with_options("a: yes\nb: off\n", options).unwrap();
    assert_eq!(value.get("a"), Some(&Value::Bool(true)));
    assert_eq!(value.get("b"), Some(&Value::Bool(false)));
}

#[test]
fn zero_prefixed_integers_are_decimal_unless_legacy() {
    let value = from_str("mode: 0755\n").unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"mode":755}"#);

    let options = saphyr_json::options! { legacy_octal_numbers: true };
    let value = from_str_with_options("mode: 0755\n", options).unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"mode":493}"#);
}

#[test]
fn explicit_tags_are_honored() {
    let yaml = indoc! {"
        s: !!str 123
        i: !!int '7'
        f: !!float 2
        n: !!null ''
        b: !!binary aGVsbG8=
        when: 2001-12-14t21:59:43.10-05:00
    "};
    let value = from_str(yaml).unwrap();
    assert_eq!(value.get("s"), Some(&Value::from("123")));
    assert_eq!(value.get("i"), Some(&Value::from(7i64)));
    assert_eq!(value.get("f").and_then(Value::as_f64), Some(2.0));
    assert_eq!(value.get("n"), Some(&Value::Null));
    assert_eq!(value.get("b"), Some(&Value::from("hello")));
    assert_eq!(value.get("when"), Some(&Value::from("2001-12-14t21:59:43.10-05:00")));
}

#[test]
fn bad_tagged_scalar_is_a_decode_error() {
    let err = from_str("port: !!int eighty\n").unwrap_err();
    assert!(matches!(err.inner(), Error::ScalarDecode { .. }), "{err:?}");
    assert!(err.to_string().contains("scalar decode error"), "{err}");
}

#[test]
fn non_finite_floats_need_sentinels() {
    let yaml = "a: .nan\nb: .inf\nc: -.Inf\n";
    let value = from_str(yaml).unwrap();
    assert!(value.get("a").and_then(Value::as_f64).unwrap().is_nan());
    assert!(to_string(&value).is_err());

    let options = Options {
        nan: Some(Value::from("NaN")),
        pos_inf: Some(Value::from("Infinity")),
        neg_inf: Some(Value::Null),
        ..Options::default()
    };
    let value = from_str_with_options(yaml, options).unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"a":"NaN","b":"Infinity","c":null}"#);
}

#[test]
fn json_float_sentinels() {
    let options = Options::default().with_json_float_sentinels();
    let value = from_str_with_options("[.nan, .inf, -.inf, 1.0]", options).unwrap();
    assert_eq!(
        value,
        Value::from(vec![
            Value::Null,
            Value::from(f64::MAX),
            Value::from(-f64::MAX),
            Value::from(1.0),
        ])
    );
}

#[test]
fn non_string_keys_are_marshaled_as_json() {
    let yaml = indoc! {"
        1: one
        true: yes
        ~: nothing
        1.5: float
        ? [a, 2]
        : seq
    "};
    let value = from_str(yaml).unwrap();
    let keys: Vec<&str> = value.as_mapping().unwrap().keys().collect();
    assert_eq!(keys, ["1", "true", "null", "1.5", r#"["a",2]"#]);
}

#[test]
fn custom_key_marshal_errors_are_reported() {
    let options = Options::default().with_key_marshal(|key: &Value| match key {
        Value::Number(n) => Ok(format!("#{}", n.as_f64())),
        _ => Err("only numbers allowed".to_owned()),
    });
    let value = from_str_with_options("7: a\n", options.clone()).unwrap();
    assert!(value.get("#7").is_some());

    let err = from_str_with_options("true: a\n", options).unwrap_err();
    match err.inner() {
        Error::KeyMarshal { msg, .. } => assert_eq!(msg, "only numbers allowed"),
        other => panic!("expected key marshal error, got {other:?}"),
    }
}

#[test]
fn nan_key_cannot_be_marshaled() {
    let err = from_str(".nan: x\n").unwrap_err();
    assert!(matches!(err.inner(), Error::KeyMarshal { .. }), "{err:?}");
}

#[test]
fn duplicate_keys_follow_the_policy() {
    let yaml = "a: 1\nb: 2\na: 3\n";

    // Later value wins in the first position unless asked otherwise.
    let default = from_str(yaml).unwrap();
    assert_eq!(to_string(&default).unwrap(), r#"{"a":3,"b":2}"#);

    let err = from_str_with_options(yaml, saphyr_json::options! { duplicate_keys: DuplicateKeyPolicy::Error }).unwrap_err();
    match err.inner() {
        Error::DuplicateKey { key, .. } => assert_eq!(key, "a"),
        other => panic!("expected duplicate key, got {other:?}"),
    }
    assert!(err.to_string().contains("duplicate mapping key: a"), "{err}");

    let first = from_str_with_options(yaml, saphyr_json::options! { duplicate_keys: DuplicateKeyPolicy::FirstWins }).unwrap();
    assert_eq!(to_string(&first).unwrap(), r#"{"a":1,"b":2}"#);

    let last = from_str_with_options(yaml, saphyr_json::options! { duplicate_keys: DuplicateKeyPolicy::LastWins }).unwrap();
    assert_eq!(to_string(&last).unwrap(), r#"{"a":3,"b":2}"#);
}

#[test]
fn repeated_key_is_accepted_by_default() {
    let value = from_str("a: 1\na: 2\n").unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"a":2}"#);
}

#[test]
fn keys_that_collide_after_marshaling_are_duplicates() {
    let strict = saphyr_json::options! { duplicate_keys: DuplicateKeyPolicy::Error };
    let err = from_str_with_options("1: a\n\"1\": b\n", strict).unwrap_err();
    assert!(matches!(err.inner(), Error::DuplicateKey { .. }), "{err:?}");

    let value = from_str("1: a\n\"1\": b\n").unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"1":"b"}"#);
}

#[test]
fn merged_key_is_not_a_duplicate() {
    let value = from_str("d: &d {a: 1}\nm:\n  <<: *d\n  a: 2\n").unwrap();
    assert_eq!(value.get("m").and_then(|m| m.get("a")), Some(&Value::from(2i64)));
}
