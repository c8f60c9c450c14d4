use regattr_core::{AttributeOptions, Capabilities, LabelCatalog, ModelType, RuleValidations};
use serde_json::json;

fn base_model() -> std::rc::Rc<ModelType> {
    let base = ModelType::with_capabilities(
        "Work",
        Capabilities::default().with_labels(LabelCatalog::new().with("Work.title", "Work title")),
    );
    base.attribute(
        "title",
        json!({"datastream": "properties", "validates": {"presence": true}}),
    )
    .expect("title");
    base.attribute("creator", json!({"datastream": "properties", "multiple": true}))
        .expect("creator");
    base
}

#[test]
fn derived_types_see_parent_attributes() {
    let base = base_model();
    let image = ModelType::derive(&base, "Image");

    assert_eq!(image.registered_attribute_names(), vec!["title", "creator"]);
    let mut instance = image.new_instance().expect("instance");
    instance.write("creator", json!(["Ann", ""])).expect("write");
    assert_eq!(instance.read("creator").expect("read"), json!(["Ann"]));
}

#[test]
fn derived_declarations_do_not_leak_upwards() {
    let base = base_model();
    let image = ModelType::derive(&base, "Image");
    image
        .attribute("width", AttributeOptions::new().datastream("properties"))
        .expect("width");
    image
        .attribute("creator", AttributeOptions::new().editable(false))
        .expect("creator override");

    assert_eq!(
        image.registered_attribute_names(),
        vec!["title", "creator", "width"]
    );
    assert_eq!(image.terms_for_editing(), vec!["title", "width"]);
    assert_eq!(base.registered_attribute_names(), vec!["title", "creator"]);
    assert_eq!(base.terms_for_editing(), vec!["title", "creator"]);

    let instance = base.new_instance().expect("instance");
    assert!(instance.read("width").is_err());
}

#[test]
fn sibling_types_are_independent() {
    let base = base_model();
    let image = ModelType::derive(&base, "Image");
    let audio = ModelType::derive(&base, "Audio");
    image
        .attribute("width", json!({}))
        .expect("width");
    audio
        .attribute("duration", json!({}))
        .expect("duration");

    assert!(!image.registered_attribute_names().contains(&"duration".to_string()));
    assert!(!audio.registered_attribute_names().contains(&"width".to_string()));
}

#[test]
fn parent_declarations_after_first_use_stay_on_the_parent() {
    let base = base_model();
    let image = ModelType::derive(&base, "Image");
    assert_eq!(image.registered_attribute_names().len(), 2);

    base.attribute("subject", json!({})).expect("subject");
    assert_eq!(base.registered_attribute_names().len(), 3);
    assert_eq!(image.registered_attribute_names().len(), 2);
}

#[test]
fn inherited_labels_resolve_against_the_declaring_type() {
    let base = base_model();
    let image = ModelType::derive(&base, "Image");
    image.attribute("width", json!({})).expect("width");

    assert_eq!(base.label_for("title"), "Work title");
    assert_eq!(image.label_for("title"), "Work title");
    assert_eq!(image.label_for("width"), "Width");
}

#[test]
fn validations_run_for_parent_and_child_rules() {
    let base = base_model();
    let image = ModelType::derive_with(
        &base,
        "Image",
        Capabilities::default().with_validations(RuleValidations::new()),
    );
    image
        .attribute(
            "caption",
            json!({"validates": {"length": {"maximum": 5}}}),
        )
        .expect("caption");

    let mut instance = image.new_instance().expect("instance");
    instance.write("caption", json!("far too long")).expect("write");

    let errors = instance.validate();
    assert_eq!(errors.get("title"), ["can't be blank".to_string()]);
    assert_eq!(errors.get("caption").len(), 1);
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["title", "caption"]);
}
