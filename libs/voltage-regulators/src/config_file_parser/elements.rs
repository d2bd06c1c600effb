//! Element kind checks and scalar parsers

use serde_json::{Map, Value};

use super::{At, ElementError, ElementResult};

pub fn verify_is_object(element: &Value) -> ElementResult<&Map<String, Value>> {
    element
        .as_object()
        .ok_or_else(|| ElementError::new("Element is not an object"))
}

pub fn verify_is_array(element: &Value) -> ElementResult<&Vec<Value>> {
    element
        .as_array()
        .ok_or_else(|| ElementError::new("Element is not an array"))
}

/// Check that `object` only has `allowed` properties and has every
/// `required` one. Unknown properties are reported before missing ones.
pub fn verify_properties(
    object: &Map<String, Value>,
    allowed: &[&str],
    required: &[&str],
) -> ElementResult<()> {
    if object.keys().any(|key| !allowed.contains(&key.as_str())) {
        return Err(ElementError::new("Element contains an invalid property"));
    }
    for name in required {
        get_required_property(object, name)?;
    }
    Ok(())
}

pub fn get_required_property<'v>(
    object: &'v Map<String, Value>,
    name: &str,
) -> ElementResult<&'v Value> {
    object
        .get(name)
        .ok_or_else(|| ElementError::new(format!("Required property missing: {}", name)))
}

pub(crate) fn parse_required<T>(
    object: &Map<String, Value>,
    name: &str,
    parse: impl FnOnce(&Value) -> ElementResult<T>,
) -> ElementResult<T> {
    parse(get_required_property(object, name)?).at(name)
}

pub(crate) fn parse_optional<T>(
    object: &Map<String, Value>,
    name: &str,
    parse: impl FnOnce(&Value) -> ElementResult<T>,
) -> ElementResult<Option<T>> {
    object.get(name).map(|value| parse(value).at(name)).transpose()
}

/// Parse each item of an array, locating errors by index
pub(crate) fn parse_array<T>(
    element: &Value,
    parse_item: impl Fn(&Value) -> ElementResult<T>,
) -> ElementResult<Vec<T>> {
    verify_is_array(element)?
        .iter()
        .enumerate()
        .map(|(index, item)| parse_item(item).at(index))
        .collect()
}

/// Like [`parse_array`] but rejects an empty array
pub(crate) fn parse_non_empty_array<T>(
    element: &Value,
    parse_item: impl Fn(&Value) -> ElementResult<T>,
) -> ElementResult<Vec<T>> {
    if verify_is_array(element)?.is_empty() {
        return Err(ElementError::new("Element contains an empty array"));
    }
    parse_array(element, parse_item)
}

pub fn parse_string(element: &Value, is_empty_valid: bool) -> ElementResult<String> {
    let value = element
        .as_str()
        .ok_or_else(|| ElementError::new("Element is not a string"))?;
    if value.is_empty() && !is_empty_valid {
        return Err(ElementError::new("Element contains an empty string"));
    }
    Ok(value.to_string())
}

pub fn parse_boolean(element: &Value) -> ElementResult<bool> {
    element
        .as_bool()
        .ok_or_else(|| ElementError::new("Element is not a boolean"))
}

pub fn parse_double(element: &Value) -> ElementResult<f64> {
    element
        .as_f64()
        .ok_or_else(|| ElementError::new("Element is not a number"))
}

pub fn parse_unsigned_integer(element: &Value) -> ElementResult<u64> {
    element
        .as_u64()
        .ok_or_else(|| ElementError::new("Element is not an unsigned integer"))
}

fn parse_integer(element: &Value) -> ElementResult<i64> {
    match element.as_i64() {
        Some(value) => Ok(value),
        // Too large for i64 but still an integer
        None if element.is_u64() => Ok(i64::MAX),
        None => Err(ElementError::new("Element is not an integer")),
    }
}

pub fn parse_uint8(element: &Value) -> ElementResult<u8> {
    let value = parse_integer(element)?;
    u8::try_from(value).map_err(|_| ElementError::new("Element is not an 8-bit unsigned integer"))
}

pub fn parse_int8(element: &Value) -> ElementResult<i8> {
    let value = parse_integer(element)?;
    i8::try_from(value).map_err(|_| ElementError::new("Element is not an 8-bit signed integer"))
}

/// Parse a byte written as `0x` followed by exactly two hex digits
pub fn parse_hex_byte(element: &Value) -> ElementResult<u8> {
    let value = parse_string(element, true)?;
    let digits = value
        .strip_prefix("0x")
        .filter(|digits| digits.len() == 2 && digits.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| ElementError::new("Element is not hexadecimal string"))?;
    u8::from_str_radix(digits, 16).map_err(|_| ElementError::new("Element is not hexadecimal string"))
}

pub fn parse_hex_byte_array(element: &Value) -> ElementResult<Vec<u8>> {
    parse_array(element, parse_hex_byte)
}

pub fn parse_bit_position(element: &Value) -> ElementResult<u8> {
    match parse_integer(element)? {
        value @ 0..=7 => Ok(value as u8),
        _ => Err(ElementError::new("Element is not a bit position")),
    }
}

pub fn parse_bit_value(element: &Value) -> ElementResult<u8> {
    match parse_integer(element)? {
        value @ 0..=1 => Ok(value as u8),
        _ => Err(ElementError::new("Element is not a bit value")),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde_json::json;

    fn message<T: std::fmt::Debug>(result: ElementResult<T>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_verify_kinds() {
        assert!(verify_is_object(&json!({})).is_ok());
        assert_eq!(message(verify_is_object(&json!([]))), "Element is not an object");
        assert!(verify_is_array(&json!([1])).is_ok());
        assert_eq!(message(verify_is_array(&json!({}))), "Element is not an array");
    }

    #[test]
    fn test_verify_properties() {
        let element = json!({ "id": "r1", "comments": ["x"] });
        let object = element.as_object().unwrap();
        assert!(verify_properties(object, &["comments", "id", "actions"], &["id"]).is_ok());
        assert_eq!(
            message(verify_properties(object, &["comments", "id", "actions"], &["id", "actions"])),
            "Required property missing: actions"
        );
        assert_eq!(
            message(verify_properties(object, &["id"], &["id"])),
            "Element contains an invalid property"
        );
    }

    #[test]
    fn test_get_required_property() {
        let element = json!({ "format": "linear" });
        let object = element.as_object().unwrap();
        assert_eq!(get_required_property(object, "format").unwrap(), "linear");
        assert_eq!(
            message(get_required_property(object, "volts")),
            "Required property missing: volts"
        );
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(parse_string(&json!("vdd_regulator"), false).unwrap(), "vdd_regulator");
        assert_eq!(parse_string(&json!(""), true).unwrap(), "");
        assert_eq!(message(parse_string(&json!(""), false)), "Element contains an empty string");
        assert_eq!(message(parse_string(&json!(7), false)), "Element is not a string");
    }

    #[test]
    fn test_parse_boolean_and_double() {
        assert!(parse_boolean(&json!(true)).unwrap());
        assert_eq!(message(parse_boolean(&json!(1))), "Element is not a boolean");
        assert_eq!(parse_double(&json!(1.03)).unwrap(), 1.03);
        assert_eq!(parse_double(&json!(-2)).unwrap(), -2.0);
        assert_eq!(message(parse_double(&json!("1.03"))), "Element is not a number");
    }

    #[test]
    fn test_parse_unsigned_integer() {
        assert_eq!(parse_unsigned_integer(&json!(3)).unwrap(), 3);
        assert_eq!(message(parse_unsigned_integer(&json!(-1))), "Element is not an unsigned integer");
        assert_eq!(message(parse_unsigned_integer(&json!(0.5))), "Element is not an unsigned integer");
    }

    #[test]
    fn test_parse_uint8() {
        assert_eq!(parse_uint8(&json!(0)).unwrap(), 0);
        assert_eq!(parse_uint8(&json!(255)).unwrap(), 255);
        assert_eq!(message(parse_uint8(&json!(256))), "Element is not an 8-bit unsigned integer");
        assert_eq!(message(parse_uint8(&json!(-1))), "Element is not an 8-bit unsigned integer");
        assert_eq!(message(parse_uint8(&json!(1.5))), "Element is not an integer");
        assert_eq!(message(parse_uint8(&json!("1"))), "Element is not an integer");
    }

    #[test]
    fn test_parse_int8() {
        assert_eq!(parse_int8(&json!(-128)).unwrap(), -128);
        assert_eq!(parse_int8(&json!(127)).unwrap(), 127);
        assert_eq!(message(parse_int8(&json!(128))), "Element is not an 8-bit signed integer");
        assert_eq!(message(parse_int8(&json!(u64::MAX))), "Element is not an 8-bit signed integer");
        assert_eq!(message(parse_int8(&json!(-8.5))), "Element is not an integer");
    }

    #[test]
    fn test_parse_hex_byte() {
        assert_eq!(parse_hex_byte(&json!("0x0A")).unwrap(), 0x0A);
        assert_eq!(parse_hex_byte(&json!("0xfe")).unwrap(), 0xFE);
        for invalid in ["0xf", "0x123", "0X0A", "0a", "0xG0", "0x"] {
            assert_eq!(
                message(parse_hex_byte(&json!(invalid))),
                "Element is not hexadecimal string",
                "{}",
                invalid
            );
        }
        assert_eq!(message(parse_hex_byte(&json!(""))), "Element is not hexadecimal string");
        assert_eq!(message(parse_hex_byte(&json!(10))), "Element is not a string");
    }

    #[test]
    fn test_parse_hex_byte_array() {
        assert_eq!(parse_hex_byte_array(&json!(["0xCC", "0xFF"])).unwrap(), vec![0xCC, 0xFF]);
        assert!(parse_hex_byte_array(&json!([])).unwrap().is_empty());
        let err = parse_hex_byte_array(&json!(["0xCC", "0xZZ"])).unwrap_err();
        assert_eq!(err.pointer(), "/1");
    }

    #[test]
    fn test_parse_bits() {
        assert_eq!(parse_bit_position(&json!(7)).unwrap(), 7);
        assert_eq!(message(parse_bit_position(&json!(8))), "Element is not a bit position");
        assert_eq!(message(parse_bit_position(&json!(-1))), "Element is not a bit position");
        assert_eq!(message(parse_bit_position(&json!(1.03))), "Element is not an integer");
        assert_eq!(message(parse_bit_position(&json!("3"))), "Element is not an integer");
        assert_eq!(parse_bit_value(&json!(1)).unwrap(), 1);
        assert_eq!(message(parse_bit_value(&json!(2))), "Element is not a bit value");
        assert_eq!(message(parse_bit_value(&json!(-1))), "Element is not a bit value");
        assert_eq!(message(parse_bit_value(&json!(0.5))), "Element is not an integer");
        assert_eq!(message(parse_bit_value(&json!("1"))), "Element is not an integer");
    }

    #[test]
    fn test_parse_non_empty_array() {
        assert_eq!(
            message(parse_non_empty_array(&json!([]), parse_boolean)),
            "Element contains an empty array"
        );
        assert_eq!(parse_non_empty_array(&json!([true]), parse_boolean).unwrap(), vec![true]);
    }
}
