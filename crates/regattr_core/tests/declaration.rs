use regattr_core::attribute::recognized_options;
use regattr_core::{
    Capabilities, ConfigurationError, DatastreamDelegation, DefaultPolicy, DelegationOptions,
    ModelType, PersistenceTarget, StorageKind,
};
use serde_json::json;

#[test]
fn unknown_option_keys_are_rejected() {
    let model = ModelType::new("Work");
    let err = model
        .attribute("title", json!({"datastream": "properties", "size": 3}))
        .expect_err("unknown key must fail");

    assert_eq!(err, ConfigurationError::UnknownOption("size".to_string()));
    assert!(model.registered_attribute_names().is_empty());
    assert_eq!(recognized_options().len(), 11);
}

#[test]
fn wrong_value_types_are_rejected() {
    let model = ModelType::new("Work");
    let err = model
        .attribute("title", json!({"multiple": "yes"}))
        .expect_err("non-boolean multiple must fail");
    assert!(matches!(err, ConfigurationError::InvalidOption { key: "multiple", .. }));

    let err = model
        .attribute("title", json!(["not", "an", "object"]))
        .expect_err("non-object options must fail");
    assert_eq!(err, ConfigurationError::OptionsNotAnObject);

    let err = model
        .attribute("  ", json!({}))
        .expect_err("blank names must fail");
    assert_eq!(err, ConfigurationError::BlankName);
}

#[test]
fn descriptor_delegation_resolves_location_and_multiplicity() {
    let model = ModelType::new("Work");
    let attribute = model
        .attribute(
            "title",
            json!({"datastream": {"to": "descMetadata", "at": ["ab"], "unique": false}}),
        )
        .expect("title");

    assert!(matches!(
        attribute.storage(),
        StorageKind::Delegated(PersistenceTarget::Descriptor(_))
    ));
    assert_eq!(
        attribute.delegation_options(),
        Some(DelegationOptions {
            target: "descMetadata".to_string(),
            location: Some(vec!["ab".to_string()]),
            unique: true,
        })
    );

    let mut instance = model.new_instance().expect("instance");
    instance.write("title", json!("Hello")).expect("write");
    assert_eq!(
        instance
            .datastream("descMetadata")
            .expect("stream")
            .values("ab"),
        &[json!("Hello")]
    );
}

#[test]
fn malformed_descriptors_are_rejected() {
    let model = ModelType::new("Work");
    let err = model
        .attribute("title", json!({"datastream": {"to": "x", "colour": "red"}}))
        .expect_err("unknown descriptor field must fail");
    assert!(matches!(err, ConfigurationError::InvalidDescriptor(_)));
}

#[test]
fn false_datastream_means_virtual() {
    let model = ModelType::new("Work");
    let attribute = model
        .attribute("notes", json!({"datastream": false, "multiple": true}))
        .expect("notes");

    assert!(attribute.is_virtual());
    assert_eq!(attribute.delegation_options(), None);
    assert!(attribute.with_accession_options(|name, _| name.to_string()).is_some());
}

#[test]
fn redeclaring_a_failed_attribute_keeps_the_previous_definition() {
    let model = ModelType::with_capabilities(
        "Work",
        Capabilities::default().with_delegation(DatastreamDelegation::restricted(["properties"])),
    );
    model
        .attribute("title", json!({"datastream": "properties"}))
        .expect("title");

    model
        .attribute("title", json!({"datastream": "rights", "editable": false}))
        .expect_err("undeclared store must fail");

    let title = model.registry().get("title").cloned().expect("title kept");
    assert!(title.is_editable());
    let mut instance = model.new_instance().expect("instance");
    instance.write("title", json!("kept")).expect("write");
    assert!(instance.datastream("properties").is_some());
}

#[test]
fn invalid_validation_rules_leave_nothing_behind() {
    let model = ModelType::new("Work");
    let err = model
        .attribute("title", json!({"validates": {"format": "[a-z]+"}}))
        .expect_err("unsupported rule must fail");
    assert!(matches!(err, ConfigurationError::UnsupportedValidation { .. }));
    assert!(model.accessor("title").is_none());
    assert!(model.new_instance().expect("instance").is_valid());
}

#[test]
fn schema_declares_attributes_in_document_order() {
    let model = ModelType::new("Work");
    model
        .attributes_from_json(json!({
            "title": {"datastream": "properties", "validates": {"presence": true}},
            "tags": {"datastream": "properties", "multiple": true, "default": ["draft"]},
            "internal_note": {"editable": false, "displayable": false}
        }))
        .expect("schema");

    assert_eq!(
        model.registered_attribute_names(),
        vec!["title", "tags", "internal_note"]
    );
    assert_eq!(model.terms_for_display(), vec!["title", "tags"]);

    let instance = model.new_instance().expect("instance");
    assert_eq!(instance.read("tags").expect("read"), json!(["draft"]));
    assert!(!instance.is_valid());
}

#[test]
fn computed_defaults_see_the_instance() {
    let model = ModelType::new("Work");
    model.set_default_policy(DefaultPolicy::WhenUnset);
    model
        .attribute("title", json!({}))
        .expect("title");
    model
        .attribute(
            "slug",
            regattr_core::AttributeOptions::new().default_with(|instance| {
                let title = instance.read("title").unwrap_or_default();
                json!(title.as_str().unwrap_or("untitled").to_lowercase().replace(' ', "-"))
            }),
        )
        .expect("slug");

    let built = model
        .build([("title", json!("Hello World"))])
        .expect("instance");
    assert_eq!(built.read("slug").expect("read"), json!("hello-world"));

    let blank = model.new_instance().expect("instance");
    assert_eq!(blank.read("slug").expect("read"), json!("untitled"));
}

#[test]
fn names_are_registered_as_given() {
    let model = ModelType::new("Work");
    model.attribute(" title", json!({})).expect("padded name");

    assert_eq!(model.registered_attribute_names(), vec![" title"]);
    assert!(model.accessor("title").is_none());
    assert!(model.accessor(" title").is_some());
}
