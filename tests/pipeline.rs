use std::path::PathBuf;

use xsdgen::config::Config;
use xsdgen::qname::QName;
use xsdgen::xsd::{
    self, Builtin, ComplexType, FacetValue, SchemaSet, SimpleType, Type, TypeDef, SELF_TYPE,
};

const PO: &str = "urn:example:po";
const WEATHER: &str = "urn:example:weather";
const SOAP_ENC: &str = "http://schemas.xmlsoap.org/soap/encoding/";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("read fixture")
}

fn complex<'a>(set: &'a SchemaSet, ns: &str, local: &str) -> &'a ComplexType {
    let name = QName::new(ns, local);
    set.complex_types()
        .map(|(_, ct)| ct)
        .find(|ct| ct.name == name)
        .unwrap_or_else(|| panic!("complex type {name} missing"))
}

fn simple<'a>(set: &'a SchemaSet, ns: &str, local: &str) -> &'a SimpleType {
    let name = QName::new(ns, local);
    set.simple_types()
        .map(|(_, st)| st)
        .find(|st| st.name == name)
        .unwrap_or_else(|| panic!("simple type {name} missing"))
}

fn element_names(ct: &ComplexType) -> Vec<&str> {
    ct.elements.iter().map(|e| &*e.name.local_name).collect()
}

fn assert_fully_resolved(set: &SchemaSet) {
    for (id, st) in set.simple_types() {
        assert!(!st.base.is_linked(), "{}", st.name);
        assert!(set.root_builtin(&Type::Simple(id)).is_some(), "{}", st.name);
    }
    for (id, ct) in set.complex_types() {
        assert!(!ct.base.is_linked(), "{}", ct.name);
        assert!(ct.elements.iter().all(|e| !e.ty.is_linked()), "{}", ct.name);
        assert!(ct.attributes.iter().all(|a| !a.ty.is_linked()), "{}", ct.name);
        assert!(set.root_builtin(&Type::Complex(id)).is_some(), "{}", ct.name);
    }
}

#[test]
fn purchase_order_resolves() {
    let doc = read_fixture("purchase-order.xsd");
    let set = xsd::parse(&[&doc], &Config::default()).unwrap();
    assert_fully_resolved(&set);

    let schema = set.schema(PO).unwrap();
    assert_eq!(schema.doc, "Purchase order schema.");

    let order = complex(&set, PO, "PurchaseOrderType");
    assert_eq!(element_names(order), ["shipTo", "billTo", "comment", "items"]);
    let comment = &order.elements[2];
    assert!(comment.optional);
    assert_eq!(comment.ty, Type::Builtin(Builtin::String));
    assert_eq!(order.attributes[0].ty, Type::Builtin(Builtin::Date));

    let us = complex(&set, PO, "USAddress");
    assert!(us.extends);
    assert_eq!(set.type_name(&us.base), QName::new(PO, "Address"));
    assert_eq!(us.attributes[0].default.as_deref(), Some("US"));

    let item = complex(&set, PO, "item");
    assert!(item.anonymous);
    assert_eq!(
        element_names(item),
        ["productName", "quantity", "USPrice", "comment", "shipDate"]
    );
    let items = complex(&set, PO, "Items");
    assert!(items.elements[0].plural && items.elements[0].optional);
    assert_eq!(set.type_name(&items.elements[0].ty), item.name);

    let quantity = simple(&set, PO, "quantity");
    assert_eq!(
        quantity.restriction.max.as_ref().map(|b| (&b.value, b.inclusive)),
        Some((&FacetValue::Number(100.0), false))
    );
    let sku = simple(&set, PO, "SKU");
    assert_eq!(sku.restriction.pattern.as_deref(), Some(r"^(?:\d{3}-[A-Z]{2})$"));

    // Top-Level-Elemente: _self und Aliase.
    let this = complex(&set, PO, SELF_TYPE);
    assert_eq!(element_names(this), ["purchaseOrder", "comment"]);
    assert_eq!(schema.get("purchaseOrder"), schema.get("PurchaseOrderType"));
    assert_eq!(schema.get("comment"), Some(&Type::Builtin(Builtin::String)));
}

#[test]
fn wsdl_types_section_parses() {
    let wsdl = read_fixture("service.wsdl");
    let set = xsd::parse(&[&wsdl], &Config::default()).unwrap();
    assert_fully_resolved(&set);

    let forecast = complex(&set, WEATHER, "GetForecast");
    assert_eq!(element_names(forecast), ["city", "days"]);
    assert!(forecast.elements[1].optional);

    let list = complex(&set, WEATHER, "ForecastList");
    assert_eq!(set.type_name(&list.base), QName::new(SOAP_ENC, "Array"));
    assert_eq!(list.attributes[0].name, QName::new(SOAP_ENC, "arrayType"));

    let sky = simple(&set, WEATHER, "Sky");
    assert_eq!(sky.restriction.enumeration, ["clear", "cloudy"]);
}

#[test]
fn wsdl_without_standard_schemas_fails_on_soap_encoding() {
    let wsdl = read_fixture("service.wsdl");
    let err = xsd::parse(&[&wsdl], &Config::default().without_standard_schemas()).unwrap_err();
    assert!(
        matches!(err.root_cause(), xsdgen::Error::UnresolvedRef { .. }),
        "{err}"
    );
}

#[test]
fn imports_are_followed_and_merged() {
    let docs = xsd::load_with_imports(&fixture("imports/main.xsd"), &Config::default()).unwrap();
    assert_eq!(docs.len(), 3);
    let docs: Vec<&str> = docs.iter().map(String::as_str).collect();
    let set = xsd::parse(&docs, &Config::default()).unwrap();
    assert_fully_resolved(&set);

    let main: Vec<_> = set
        .schemas()
        .iter()
        .filter(|s| s.target_ns == "urn:example:main")
        .collect();
    assert_eq!(main.len(), 1);
    assert!(main[0].get("Order").is_some() && main[0].get("Line").is_some());

    let order = complex(&set, "urn:example:main", "Order");
    assert_eq!(set.root_builtin(&order.elements[0].ty), Some(Builtin::Token));
    let note = &order.elements[1];
    assert_eq!(note.name, QName::new("urn:example:common", "note"));
    assert!(note.optional);

    let TypeDef::Complex(note_type) = set.get(&note.ty) else {
        panic!("note is not complex");
    };
    assert_eq!(&*note_type.attributes[0].name.local_name, "lang");
    assert_eq!(set.root_builtin(&note_type.base), Some(Builtin::String));

    let line = complex(&set, "urn:example:main", "Line");
    assert!(!line.attributes[0].optional);
    assert_eq!(line.attributes[1].default.as_deref(), Some("1"));
}

#[test]
fn generated_code_covers_fixture() {
    let doc = read_fixture("purchase-order.xsd");
    let set = xsd::parse(&[&doc], &Config::default()).unwrap();
    let code = xsdgen::codegen::render(&set);
    assert!(code.contains("pub struct PurchaseOrderType {"), "{code}");
    assert!(code.contains("pub struct UsAddress {"), "{code}");
    assert!(code.contains("pub type Sku = String;"), "{code}");
    assert!(code.contains("pub item: Vec<Item>,"), "{code}");
    assert!(!code.contains(SELF_TYPE), "{code}");
}
