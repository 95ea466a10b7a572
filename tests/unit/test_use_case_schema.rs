//! Unit tests for the use case document schema and its validation

use serde_json::{Value, json};
use use_case_api::models::{
    ArrayField, CreateUseCase, FieldPath, FlowType, FormUseCase, UpdateUseCase, UpsertUseCase,
    UseCaseStatus, Validate,
};

fn registro_de_usuario() -> Value {
    json!({
        "type": "create",
        "date": "2024-05-01",
        "sector": "Autenticación",
        "name": "Registro de Usuario",
        "participants": ["Ana"],
        "description": "Alta de nuevos usuarios",
        "trigger": "El usuario pulsa Registrarse",
        "documentationRef": [],
        "useCaseRef": [],
        "actors": { "primary": ["Usuario"], "secondary": [] },
        "preconditions": [],
        "succuesfulResults": ["Cuenta creada"],
        "failedResults": [],
        "conditions": [],
        "flows": [{
            "name": "Flujo principal",
            "type": "main",
            "frequency": 100,
            "description": "Registro estándar",
            "flowDetails": [{
                "step": 1,
                "actor": "Usuario",
                "action": "Ingresa datos",
                "systemResponse": "Valida y guarda",
                "conditions": [],
                "exceptions": [],
                "notes": ""
            }]
        }],
        "input": [],
        "output": [],
        "notes": "",
        "status": "draft"
    })
}

fn parse(value: Value) -> UpsertUseCase {
    serde_json::from_value(value).unwrap()
}

fn errors_of(value: Value) -> use_case_api::models::ValidationErrors {
    parse(value).validate().unwrap_err()
}

#[test]
fn test_create_payload_is_valid() {
    let payload = parse(registro_de_usuario());
    assert_eq!(payload.kind(), "create");
    assert_eq!(payload.name(), "Registro de Usuario");
    assert!(payload.validate().is_ok());
}

#[test]
fn test_create_ignores_client_identities() {
    let mut value = registro_de_usuario();
    value["id"] = json!(42);
    value["flows"][0]["id"] = json!(7);

    let UpsertUseCase::Create(doc) = parse(value) else {
        panic!("expected a create payload");
    };
    let serialized = serde_json::to_value(&doc).unwrap();
    assert!(serialized.get("id").is_none());
    assert!(serialized["flows"][0].get("id").is_none());
}

#[test]
fn test_wire_names_match_the_client() {
    let UpsertUseCase::Create(doc) = parse(registro_de_usuario()) else {
        panic!("expected a create payload");
    };
    assert_eq!(doc.successful_results, vec!["Cuenta creada"]);
    assert_eq!(doc.flows[0].flow_type, FlowType::Main);

    let serialized = serde_json::to_value(&doc).unwrap();
    assert_eq!(serialized["succuesfulResults"][0], "Cuenta creada");
    assert_eq!(serialized["flows"][0]["type"], "main");
    assert_eq!(serialized["flows"][0]["flowDetails"][0]["systemResponse"], "Valida y guarda");
}

#[test]
fn test_unknown_enum_values_are_rejected() {
    let mut value = registro_de_usuario();
    value["status"] = json!("archived");
    assert!(serde_json::from_value::<UpsertUseCase>(value).is_err());

    let mut value = registro_de_usuario();
    value["flows"][0]["type"] = json!("happy");
    assert!(serde_json::from_value::<UpsertUseCase>(value).is_err());
}

#[test]
fn test_missing_tag_is_rejected() {
    let mut value = registro_de_usuario();
    value.as_object_mut().unwrap().remove("type");
    assert!(serde_json::from_value::<UpsertUseCase>(value).is_err());
}

#[test]
fn test_type_errors_point_at_the_field() {
    let mut value = registro_de_usuario();
    value["flows"][0]["frequency"] = json!("alta");
    let errors = UpsertUseCase::from_json(value).unwrap_err();
    assert!(errors.contains("flows[0].frequency"));
    assert_eq!(errors.len(), 1);

    let mut value = registro_de_usuario();
    value["actors"]["primary"] = json!([1]);
    let errors = UpsertUseCase::from_json(value).unwrap_err();
    assert!(errors.contains("actors.primary[0]"));

    let mut value = registro_de_usuario();
    value["type"] = json!("upsert");
    let errors = UpsertUseCase::from_json(value).unwrap_err();
    assert!(errors.contains("type"));

    assert_eq!(
        UpsertUseCase::from_json(registro_de_usuario()).unwrap(),
        parse(registro_de_usuario())
    );
}

#[test]
fn test_frequency_out_of_range_points_at_the_flow() {
    let mut value = registro_de_usuario();
    value["flows"][0]["frequency"] = json!(150);

    let errors = errors_of(value);
    assert_eq!(
        errors.at("flows[0].frequency"),
        Some(&["La frecuencia debe estar entre 0 y 100".to_string()][..])
    );
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_frequency_bounds_are_inclusive() {
    for frequency in [0, 100] {
        let mut value = registro_de_usuario();
        value["flows"][0]["frequency"] = json!(frequency);
        assert!(parse(value).validate().is_ok());
    }
}

#[test]
fn test_empty_flows_fail_at_array_level() {
    let mut value = registro_de_usuario();
    value["flows"] = json!([]);

    let errors = errors_of(value);
    assert_eq!(
        errors.at("flows"),
        Some(&["Se requiere al menos un flujo".to_string()][..])
    );
}

#[test]
fn test_flow_without_details_fails_at_array_level() {
    let mut value = registro_de_usuario();
    value["flows"][0]["flowDetails"] = json!([]);

    let errors = errors_of(value);
    assert!(errors.contains("flows[0].flowDetails"));
}

#[test]
fn test_blank_strings_fail_per_element() {
    let mut value = registro_de_usuario();
    value["name"] = json!("   ");
    value["participants"] = json!(["Ana", ""]);
    value["actors"]["secondary"] = json!([""]);
    value["flows"][0]["flowDetails"][0]["exceptions"] = json!(["Timeout", " "]);
    value["flows"][0]["flowDetails"][0]["step"] = json!(0);

    let errors = errors_of(value);
    assert!(errors.contains("name"));
    assert!(errors.contains("participants[1]"));
    assert!(!errors.contains("participants[0]"));
    assert!(errors.contains("actors.secondary[0]"));
    assert!(errors.contains("flows[0].flowDetails[0].exceptions[1]"));
    assert!(errors.contains("flows[0].flowDetails[0].step"));
    assert_eq!(errors.len(), 5);
}

#[test]
fn test_use_case_refs_are_checked() {
    let mut value = registro_de_usuario();
    value["useCaseRef"] = json!([{ "id": 0, "name": "" }]);

    let errors = errors_of(value);
    assert!(errors.contains("useCaseRef[0].id"));
    assert!(errors.contains("useCaseRef[0].name"));
}

#[test]
fn test_update_requires_positive_identities() {
    let mut value = registro_de_usuario();
    value["type"] = json!("update");
    value["id"] = json!(3);
    value["flows"][0]["id"] = json!(0);
    value["flows"][0]["flowDetails"][0]["id"] = json!(9);

    let errors = errors_of(value);
    assert_eq!(
        errors.at("flows[0].id"),
        Some(&["El ID debe ser al menos 1".to_string()][..])
    );
    assert!(!errors.contains("id"));
}

#[test]
fn test_update_without_identity_does_not_parse() {
    let mut value = registro_de_usuario();
    value["type"] = json!("update");
    assert!(serde_json::from_value::<UpsertUseCase>(value).is_err());
}

#[test]
fn test_form_shape_round_trips_through_create_and_update() {
    let mut value = registro_de_usuario();
    value["type"] = json!("update");
    value["id"] = json!(5);
    value["flows"][0]["id"] = json!(6);
    value["flows"][0]["flowDetails"][0]["id"] = json!(7);
    let UpsertUseCase::Update(stored) = parse(value) else {
        panic!("expected an update payload");
    };

    let form: FormUseCase = stored.clone().into_form();
    assert_eq!(form.flows[0].flow_details[0].id, Some(7));

    let create: CreateUseCase = form.clone().into_create();
    assert_eq!(create.name, stored.name);

    let update: UpdateUseCase = form.into_update(5).unwrap();
    assert_eq!(update, stored);
}

#[test]
fn test_update_from_form_reports_children_without_identity() {
    let mut value = registro_de_usuario();
    value["type"] = json!("update");
    value["id"] = json!(5);
    value["flows"][0]["id"] = json!(6);
    value["flows"][0]["flowDetails"][0]["id"] = json!(7);
    let UpsertUseCase::Update(stored) = parse(value) else {
        panic!("expected an update payload");
    };

    let mut form = stored.into_form();
    let mut appended = form.flows[0].clone();
    appended.id = None;
    appended.flow_details[0].id = None;
    form.flows.push(appended);

    let errors = form.into_update(5).unwrap_err();
    assert!(errors.contains("flows[1].id"));
    assert!(errors.contains("flows[1].flowDetails[0].id"));
    assert!(!errors.contains("flows[0].id"));
}

#[test]
fn test_each_identity_policy_deserializes_directly() {
    let mut value = registro_de_usuario();
    value.as_object_mut().unwrap().remove("type");

    let form: FormUseCase = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(form.id, None);
    assert_eq!(form.flows[0].flow_details[0].id, None);

    value["id"] = json!(3);
    value["flows"][0]["id"] = json!(4);
    value["flows"][0]["flowDetails"][0]["id"] = json!(5);
    let create: CreateUseCase = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(create.flows[0].flow_details[0].actor, "Usuario");

    let form: FormUseCase = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(form.id, Some(3));
    let update: UpdateUseCase = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(update.flows[0].id, 4);

    value["flows"][0]["flowDetails"][0]
        .as_object_mut()
        .unwrap()
        .remove("id");
    assert!(serde_json::from_value::<UpdateUseCase>(value).is_err());
}

#[test]
fn test_field_paths_render_and_parse() {
    let path: FieldPath = "flows[0].flowDetails[1].action".parse().unwrap();
    assert_eq!(path.to_string(), "flows[0].flowDetails[1].action");
    assert!(path.starts_with(&ArrayField::FlowDetails { flow: 0 }.path()));
}

#[test]
fn test_status_and_flow_type_labels() {
    assert_eq!(UseCaseStatus::Review.label(), "En Revisión");
    assert_eq!("approved".parse::<UseCaseStatus>().unwrap(), UseCaseStatus::Approved);
    assert_eq!(FlowType::Exception.label(), "Excepción");
    assert!("deleted".parse::<UseCaseStatus>().is_err());
}
