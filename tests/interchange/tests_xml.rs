//! XML codec behaviour on hand-written documents.

use aas::interchange::{CodecOptions, EnvironmentFormat, InterchangeError, NS_AAS, Xml};
use aas::model::{DataTypeDefXsd, SubmodelElement};

use crate::helpers::*;

fn document(elements: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<environment xmlns="{NS_AAS}">
  <submodels>
    <submodel>
      <idShort>TechnicalData</idShort>
      <id>urn:sm:1</id>
      <submodelElements>{elements}</submodelElements>
    </submodel>
  </submodels>
</environment>"#
    )
}

#[test]
fn test_root_declares_namespace() {
    let bytes = Xml::new().write(&motor_environment()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("<?xml"));
    assert!(text.contains(&format!(r#"xmlns:aas="{NS_AAS}""#)));
    assert!(text.contains("<aas:environment"));
}

#[test]
fn test_default_namespace_is_accepted() {
    let xml = document(
        r#"<property valueType="xs:int"><idShort>MaxRpm</idShort><value>5000</value></property>"#,
    );
    let env = Xml::new().read(xml.as_bytes()).unwrap();
    let element = env.submodel("urn:sm:1").unwrap().elements().get("MaxRpm").unwrap();
    let SubmodelElement::Property(p) = element else {
        panic!("not a property");
    };
    assert_eq!(p.value_type(), DataTypeDefXsd::Int);
    assert_eq!(p.value().unwrap().render(), "5000");
}

#[test]
fn test_value_type_mismatch_carries_path() {
    let xml = document(
        r#"<property valueType="xs:int"><idShort>MaxRpm</idShort><value>12.5</value></property>"#,
    );
    match Xml::new().read(xml.as_bytes()) {
        Err(InterchangeError::ValueTypeMismatch { path, value, .. }) => {
            assert_eq!(value, "12.5");
            assert!(path.ends_with("aas:property[1]/aas:value"), "{path}");
        }
        other => panic!("expected a value type mismatch, got {other:?}"),
    }
}

#[test]
fn test_nested_referred_semantic_id_is_kept() {
    let xml = document(
        r#"<property valueType="xs:int">
             <idShort>MaxRpm</idShort>
             <semanticId>
               <type>ExternalReference</type>
               <referredSemanticId>
                 <type>ExternalReference</type>
                 <keys><key><type>GlobalReference</type><value>urn:semantics:rpm</value></key></keys>
               </referredSemanticId>
               <keys><key><type>GlobalReference</type><value>urn:concept:rpm</value></key></keys>
             </semanticId>
             <value>5000</value>
           </property>"#,
    );
    let xml_format = Xml::with_options(CodecOptions::strict());
    let env = xml_format.read(xml.as_bytes()).unwrap();
    let element = env.submodel("urn:sm:1").unwrap().elements().get("MaxRpm").unwrap();
    let referred = element
        .common()
        .semantic_id
        .as_ref()
        .and_then(|r| r.referred_semantic_id())
        .unwrap();
    assert_eq!(referred.keys()[0].value(), "urn:semantics:rpm");

    let text = String::from_utf8(xml_format.write(&env).unwrap()).unwrap();
    let referred_at = text.find("<aas:referredSemanticId>").unwrap();
    let keys_at = text.rfind("<aas:keys>").unwrap();
    assert!(referred_at < keys_at, "referredSemanticId precedes keys");
    assert_eq!(xml_format.read(text.as_bytes()).unwrap(), env);
}

#[test]
fn test_foreign_elements_follow_unknown_field_policy() {
    let xml = document(
        r#"<property xmlns:x="urn:vendor" valueType="xs:string"><idShort>MaxRpm</idShort><x:note>hi</x:note></property>"#,
    );
    assert!(Xml::new().read(xml.as_bytes()).is_ok());
    let err = Xml::with_options(CodecOptions::strict())
        .read(xml.as_bytes())
        .unwrap_err();
    assert!(matches!(err, InterchangeError::UnknownField { .. }), "{err:?}");
}

#[test]
fn test_malformed_document_is_an_xml_error() {
    let err = Xml::new().read(b"<environment><submodels>").unwrap_err();
    assert!(matches!(err, InterchangeError::Xml(_)), "{err:?}");
}

#[test]
fn test_failsafe_skips_broken_elements() {
    let xml = document(
        r#"<property valueType="xs:string"><idShort>Good</idShort></property>
           <file><idShort>NoContentType</idShort></file>"#,
    );
    assert!(Xml::new().read(xml.as_bytes()).is_err());
    let env = Xml::with_options(CodecOptions::failsafe())
        .read(xml.as_bytes())
        .unwrap();
    let elements = env.submodel("urn:sm:1").unwrap().elements();
    assert_eq!(elements.len(), 1);
    assert!(elements.contains("Good"));
}
