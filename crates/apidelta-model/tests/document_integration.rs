//! Integration tests for document decoding and the types store.

use apidelta_model::{
    ApiDocument, CommunicationalPattern, DataEncodingStrategy, DateEncodingStrategy,
    EncoderConfiguration, Endpoint, EnumCase, Error, ExporterConfiguration, ExporterKind,
    Operation, Parameter, ParameterKind, PrimitiveType, ServiceInformation, TypeDescriptor,
    TypeProperty, TypesStore,
};
use serde_json::json;

fn catalog() -> TypeDescriptor {
    TypeDescriptor::object(
        "Catalog",
        vec![
            TypeProperty::new(
                "products",
                TypeDescriptor::repeated(TypeDescriptor::object(
                    "Product",
                    vec![
                        TypeProperty::new("sku", TypeDescriptor::scalar(PrimitiveType::String)),
                        TypeProperty::new(
                            "category",
                            TypeDescriptor::enumeration_with_raw_type(
                                "Category",
                                PrimitiveType::Int,
                                vec![
                                    EnumCase::with_raw_value("books", "1"),
                                    EnumCase::with_raw_value("games", "2"),
                                ],
                            ),
                        ),
                    ],
                )),
            ),
            TypeProperty::new(
                "prices",
                TypeDescriptor::dictionary(
                    PrimitiveType::String,
                    TypeDescriptor::optional(TypeDescriptor::scalar(PrimitiveType::Double)),
                ),
            ),
        ],
    )
}

#[test]
fn test_construct_inverts_store() {
    let descriptors = vec![
        TypeDescriptor::scalar(PrimitiveType::Bool),
        TypeDescriptor::repeated(TypeDescriptor::scalar(PrimitiveType::Int8)),
        TypeDescriptor::optional(catalog()),
        TypeDescriptor::dictionary(PrimitiveType::Int, TypeDescriptor::repeated(catalog())),
        catalog(),
    ];

    for descriptor in descriptors {
        let mut store = TypesStore::new();
        let stored = store.store(descriptor.clone());
        assert_eq!(store.construct(&stored).unwrap(), descriptor);
    }
}

#[test]
fn test_mutually_recursive_types() {
    let department = TypeDescriptor::object(
        "Department",
        vec![
            TypeProperty::new("name", TypeDescriptor::scalar(PrimitiveType::String)),
            TypeProperty::new(
                "staff",
                TypeDescriptor::repeated(TypeDescriptor::object(
                    "Employee",
                    vec![TypeProperty::optional(
                        "department",
                        TypeDescriptor::reference("Department"),
                    )],
                )),
            ),
        ],
    );

    let mut store = TypesStore::new();
    let stored = store.store(department.clone());
    assert_eq!(store.len(), 2);
    assert_eq!(store.construct(&stored).unwrap(), department);

    // Entering through the other type expands Department once.
    let employee = store
        .construct(&TypeDescriptor::reference("Employee"))
        .unwrap();
    let nested = &employee.properties()[0].type_;
    assert!(nested.unwrapped().is_object());
}

#[test]
fn test_v2_document_round_trip() {
    let mut doc = ApiDocument::new(ServiceInformation::new("Shop", "v3"));
    doc.add_exporter(ExporterConfiguration::rest(
        EncoderConfiguration::new(
            DateEncodingStrategy::Iso8601,
            DataEncodingStrategy::Base64,
        ),
        Default::default(),
    ))
    .unwrap();
    doc.add_endpoint(
        Endpoint::new("getCatalog", Operation::Read, "/catalog", catalog())
            .with_parameter(Parameter::new(
                "page",
                TypeDescriptor::scalar(PrimitiveType::UInt32),
                ParameterKind::Lightweight,
            ))
            .with_pattern(CommunicationalPattern::ServiceSideStream)
            .with_error(404, "catalog missing"),
    )
    .unwrap();

    let json = doc.to_json().unwrap();
    let back = ApiDocument::from_json(&json).unwrap();

    assert_eq!(back.id(), doc.id());
    assert_eq!(back.endpoints().unwrap(), doc.endpoints().unwrap());
    assert_eq!(back.models().unwrap().len(), 3);
    assert_eq!(back.to_json().unwrap(), json);
}

#[test]
fn test_legacy_document_upgrade() {
    let legacy = json!({
        "id": "7b0f8a9e-6a4e-4c3b-9f39-8f4f5b8b2d10",
        "info": {
            "title": "Shop",
            "version": "v1",
            "serverPath": "http://localhost:8080",
            "encoderConfiguration": {
                "dateEncodingStrategy": "secondsSince1970",
                "dataEncodingStrategy": "base64"
            }
        },
        "endpoints": [{
            "handlerName": "getUser",
            "deltaIdentifier": "getUser",
            "operation": "read",
            "absolutePath": "/users/{id}",
            "parameters": [{
                "parameterName": "id",
                "typeInformation": {"scalar": "Int"},
                "hasDefaultValue": false,
                "kind": "path"
            }],
            "response": {"reference": {"key": "User"}},
            "errors": [{"code": 404, "message": "not found"}]
        }],
        "components": {
            "User": {"object": {"name": "User", "properties": [
                {"name": "id", "type": {"scalar": "Int"}}
            ]}}
        }
    });

    let doc = ApiDocument::from_value(legacy).unwrap();

    assert_eq!(doc.service().name, "Shop");
    assert_eq!(doc.service().http.as_ref().map(|h| h.port), Some(8080));
    assert!(doc.service().exporter(ExporterKind::Rest).is_some());
    assert_eq!(
        doc.service().rest_encoder().map(|e| e.date_encoding_strategy),
        Some(DateEncodingStrategy::SecondsSince1970)
    );

    let endpoints = doc.endpoints().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].path(), Some("/users/{id}"));
    assert!(endpoints[0].response.is_object());
    assert_eq!(endpoints[0].errors[0].code, 404);

    let upgraded = doc.to_value().unwrap();
    assert_eq!(upgraded["version"], "2.0.0");
    assert!(upgraded.get("info").is_none());
    assert!(upgraded.get("components").is_none());
}

#[test]
fn test_dangling_reference_rejected_on_decode() {
    let doc = json!({
        "version": "2.0.0",
        "id": "7b0f8a9e-6a4e-4c3b-9f39-8f4f5b8b2d10",
        "service": {"name": "Shop", "version": "v1"},
        "endpoints": [{
            "deltaIdentifier": "getUser",
            "identifiers": {"handlerName": "getUser", "operation": "read", "path": "/u"},
            "response": {"reference": {"key": "User"}}
        }],
        "types": {}
    });

    match ApiDocument::from_value(doc) {
        Err(Error::DanglingReference { key }) => assert_eq!(key, "User"),
        other => panic!("Expected DanglingReference, got {:?}", other),
    }
}
