//! Block-data encoding scenarios from the specification's testable
//! properties table.

use scpi_device::grammar::block::encode;

#[test]
fn encodes_empty_payload() {
    assert_eq!(encode(""), "#10");
}

#[test]
fn encodes_single_byte_payload() {
    assert_eq!(encode("x"), "#11x");
}

#[test]
fn encodes_long_payload() {
    let payload = "a".repeat(100);
    let expected = format!("#3100{payload}");
    assert_eq!(encode(&payload), expected);
}
