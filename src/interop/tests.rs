//! Test suite for interop values and capabilities

use super::*;

#[test]
fn test_foreign_value_downcast() {
    let value = ForeignValue::new(42u64);
    assert_eq!(value.downcast_ref::<u64>(), Some(&42));
    assert!(value.downcast_ref::<i32>().is_none());
    assert!(value.is::<u64>());
}

#[test]
fn test_foreign_value_identity() {
    let a = ForeignValue::new(String::from("host"));
    let b = a.clone();
    let c = ForeignValue::new(String::from("host"));
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&c));
}

#[test]
fn test_basic_interop_null() {
    let interop = BasicInterop;
    assert!(interop.is_null(&ForeignValue::new(ForeignNull)));
    assert!(interop.is_null(&ForeignValue::new(())));
    assert!(!interop.is_null(&ForeignValue::new(0i32)));
}

#[test]
fn test_basic_interop_exception() {
    let interop = BasicInterop;
    assert!(interop.is_exception(&ForeignValue::new(ForeignError("boom".into()))));
    assert!(!interop.is_exception(&ForeignValue::new(ForeignNull)));
}

#[test]
fn test_foreign_object_delegates_to_capability() {
    let object = ForeignObject::new(ForeignValue::new(ForeignError("x".into())), Arc::new(BasicInterop));
    assert!(object.is_exception());
    assert!(!object.is_null());
    assert!(format!("{object:?}").starts_with("ForeignObject"));
}
