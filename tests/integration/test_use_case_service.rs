//! Integration tests for the use case service over the in-memory backend
//!
//! Covers the upsert procedure, ownership checks, soft and hard deletion and
//! the read queries, including atomicity of failing multi-row writes.

use std::sync::Arc;

use serde_json::{Value, json};
use use_case_api::models::{
    DeleteRequest, UpsertUseCase, UseCaseFull, UseCaseQuery, UseCaseStatus,
};
use use_case_api::services::{ServiceError, UseCaseService};
use use_case_api::storage::{InMemoryStorageBackend, UserContext};

fn registro_de_usuario() -> Value {
    json!({
        "type": "create",
        "date": "2024-05-01",
        "sector": "Autenticación",
        "name": "Registro de Usuario",
        "participants": ["Ana"],
        "description": "Alta de nuevos usuarios",
        "trigger": "El usuario pulsa Registrarse",
        "documentationRef": ["RFC-12"],
        "useCaseRef": [],
        "actors": { "primary": ["Usuario"], "secondary": ["Servicio de correo"] },
        "preconditions": ["El usuario no tiene cuenta"],
        "succuesfulResults": ["Cuenta creada"],
        "failedResults": ["Email duplicado"],
        "conditions": [],
        "flows": [
            {
                "name": "Flujo principal",
                "type": "main",
                "frequency": 100,
                "description": "Registro estándar",
                "flowDetails": [
                    {
                        "step": 1,
                        "actor": "Usuario",
                        "action": "Ingresa datos",
                        "systemResponse": "Valida y guarda",
                        "conditions": [],
                        "exceptions": [],
                        "notes": ""
                    },
                    {
                        "step": 2,
                        "actor": "Sistema",
                        "action": "Envía correo",
                        "systemResponse": "Correo enviado",
                        "conditions": ["Email válido"],
                        "exceptions": ["Servidor caído"],
                        "notes": "Reintentar tres veces"
                    }
                ]
            },
            {
                "name": "Email duplicado",
                "type": "exception",
                "frequency": 5,
                "description": "El email ya existe",
                "flowDetails": [{
                    "step": 1,
                    "actor": "Sistema",
                    "action": "Detecta duplicado",
                    "systemResponse": "Muestra error",
                    "conditions": [],
                    "exceptions": [],
                    "notes": ""
                }]
            }
        ],
        "input": ["Email", "Contraseña"],
        "output": ["Cuenta"],
        "notes": "",
        "status": "draft"
    })
}

/// Three flows of uneven length and no optional list filled in.
fn inventario_minimo() -> Value {
    let detail = |step: i32, actor: &str| {
        json!({
            "step": step,
            "actor": actor,
            "action": format!("Paso {}", step),
            "systemResponse": "Actualiza el stock",
            "conditions": [],
            "exceptions": [],
            "notes": ""
        })
    };
    json!({
        "type": "create",
        "date": "2024-06-10",
        "sector": "Inventario",
        "name": "Ajuste de stock",
        "participants": [],
        "description": "Corrección manual del inventario",
        "trigger": "Conteo físico",
        "documentationRef": [],
        "useCaseRef": [],
        "actors": { "primary": [], "secondary": [] },
        "preconditions": [],
        "succuesfulResults": [],
        "failedResults": [],
        "conditions": [],
        "flows": [
            {
                "name": "Ajuste",
                "type": "main",
                "frequency": 80,
                "description": "Ajuste directo",
                "flowDetails": [detail(1, "Almacenero"), detail(2, "Sistema"), detail(3, "Supervisor")]
            },
            {
                "name": "Sin permisos",
                "type": "alternative",
                "frequency": 0,
                "description": "Requiere aprobación",
                "flowDetails": [detail(1, "Almacenero")]
            },
            {
                "name": "Stock negativo",
                "type": "exception",
                "frequency": 20,
                "description": "El ajuste deja stock negativo",
                "flowDetails": [detail(1, "Sistema"), detail(2, "Supervisor")]
            }
        ],
        "input": [],
        "output": [],
        "notes": "",
        "status": "approved"
    })
}

fn fixtures() -> Vec<Value> {
    vec![registro_de_usuario(), inventario_minimo()]
}

fn create_payload() -> UpsertUseCase {
    serde_json::from_value(registro_de_usuario()).unwrap()
}

fn update_payload(stored: &UseCaseFull) -> UpsertUseCase {
    UpsertUseCase::Update(stored.clone())
}

fn setup() -> (InMemoryStorageBackend, UseCaseService) {
    let storage = InMemoryStorageBackend::new();
    let service = UseCaseService::new(Arc::new(storage.clone()));
    (storage, service)
}

fn owner() -> UserContext {
    UserContext::new("user-1")
}

async fn create(service: &UseCaseService) -> UseCaseFull {
    let response = service
        .save_use_case(&owner(), create_payload())
        .await
        .unwrap();
    service.get_use_case_by_id(response.id).await.unwrap()
}

#[tokio::test]
async fn test_create_then_read_back() {
    let (_, service) = setup();
    let response = service
        .save_use_case(&owner(), create_payload())
        .await
        .unwrap();
    assert!(response.success);
    assert!(response.id > 0);
    assert_eq!(response.message, "Use case created successfully");

    let doc = service.get_use_case_by_id(response.id).await.unwrap();
    assert_eq!(doc.flows[0].flow_details[0].actor, "Usuario");
    assert!(doc.flows.iter().all(|f| f.id > 0));
    assert!(
        doc.flows
            .iter()
            .flat_map(|f| &f.flow_details)
            .all(|d| d.id > 0)
    );
}

#[tokio::test]
async fn test_round_trip_keeps_every_field_but_identities() {
    let (_, service) = setup();
    for submitted in fixtures() {
        let payload: UpsertUseCase = serde_json::from_value(submitted.clone()).unwrap();
        let response = service.save_use_case(&owner(), payload).await.unwrap();
        let doc = service.get_use_case_by_id(response.id).await.unwrap();
        assert!(doc.flows.iter().all(|f| f.id > 0));

        let mut read_back = serde_json::to_value(&doc).unwrap();
        let mut submitted = submitted;
        submitted.as_object_mut().unwrap().remove("type");
        read_back.as_object_mut().unwrap().remove("id");
        for flow in read_back["flows"].as_array_mut().unwrap() {
            flow.as_object_mut().unwrap().remove("id");
            for detail in flow["flowDetails"].as_array_mut().unwrap() {
                assert!(detail["id"].as_i64().unwrap() > 0);
                detail.as_object_mut().unwrap().remove("id");
            }
        }
        assert_eq!(read_back, submitted);
    }
}

#[tokio::test]
async fn test_invalid_payload_never_reaches_storage() {
    let (storage, service) = setup();
    let mut value = registro_de_usuario();
    value["flows"][0]["frequency"] = json!(150);
    let payload: UpsertUseCase = serde_json::from_value(value).unwrap();

    let Err(ServiceError::Validation(errors)) = service.save_use_case(&owner(), payload).await
    else {
        panic!("expected a validation failure");
    };
    assert!(errors.contains("flows[0].frequency"));
    assert_eq!(storage.row_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_update_replaces_children() {
    let (storage, service) = setup();
    let mut doc = create(&service).await;
    let old_flow_ids: Vec<i64> = doc.flows.iter().map(|f| f.id).collect();

    doc.name = "Registro de Cliente".to_string();
    doc.status = UseCaseStatus::Review;
    doc.flows.truncate(1);
    doc.flows[0].flow_details[0].action = "Completa el formulario".to_string();

    let response = service
        .save_use_case(&owner(), update_payload(&doc))
        .await
        .unwrap();
    assert_eq!(response.id, doc.id);
    assert_eq!(response.message, "Use case updated successfully");

    let updated = service.get_use_case_by_id(doc.id).await.unwrap();
    assert_eq!(updated.name, "Registro de Cliente");
    assert_eq!(updated.status, UseCaseStatus::Review);
    assert_eq!(updated.flows.len(), 1);
    assert_eq!(updated.flows[0].flow_details.len(), 2);
    assert_eq!(
        updated.flows[0].flow_details[0].action,
        "Completa el formulario"
    );
    assert!(!old_flow_ids.contains(&updated.flows[0].id));
    assert_eq!(storage.row_counts().await, (1, 1, 2));
}

#[tokio::test]
async fn test_repeated_update_is_idempotent_except_child_ids() {
    let strip = |doc: &UseCaseFull| {
        let mut form = doc.clone().into_form();
        for flow in &mut form.flows {
            flow.id = None;
            for detail in &mut flow.flow_details {
                detail.id = None;
            }
        }
        form
    };

    for fixture in fixtures() {
        let (storage, service) = setup();
        let payload: UpsertUseCase = serde_json::from_value(fixture).unwrap();
        let response = service.save_use_case(&owner(), payload).await.unwrap();
        let doc = service.get_use_case_by_id(response.id).await.unwrap();
        let rows = storage.row_counts().await;

        service
            .save_use_case(&owner(), update_payload(&doc))
            .await
            .unwrap();
        let once = service.get_use_case_by_id(doc.id).await.unwrap();
        service
            .save_use_case(&owner(), update_payload(&doc))
            .await
            .unwrap();
        let twice = service.get_use_case_by_id(doc.id).await.unwrap();

        assert_eq!(strip(&once), strip(&twice));
        assert_eq!(strip(&once), strip(&doc));
        assert_eq!(storage.row_counts().await, rows);
    }
}

#[tokio::test]
async fn test_update_by_another_owner_is_not_found() {
    let (_, service) = setup();
    let doc = create(&service).await;
    let mut changed = doc.clone();
    changed.name = "Robado".to_string();

    let result = service
        .save_use_case(&UserContext::new("intruder"), update_payload(&changed))
        .await;
    assert_eq!(
        result,
        Err(ServiceError::NotFound(
            "Use case not found or you don't have permission to edit it".to_string()
        ))
    );
    assert_eq!(service.get_use_case_by_id(doc.id).await.unwrap(), doc);
}

#[tokio::test]
async fn test_update_of_missing_use_case_is_not_found() {
    let (_, service) = setup();
    let mut doc = create(&service).await;
    doc.id = 999;

    let result = service.save_use_case(&owner(), update_payload(&doc)).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_failed_create_leaves_no_rows() {
    let (storage, service) = setup();
    storage.fail_detail_inserts(true);

    let result = service.save_use_case(&owner(), create_payload()).await;
    assert_eq!(
        result,
        Err(ServiceError::Persistence("Failed to save use case".to_string()))
    );
    assert_eq!(storage.row_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_failed_update_keeps_previous_document() {
    let (storage, service) = setup();
    let doc = create(&service).await;
    let mut changed = doc.clone();
    changed.name = "A medias".to_string();

    storage.fail_detail_inserts(true);
    let result = service.save_use_case(&owner(), update_payload(&changed)).await;
    assert!(matches!(result, Err(ServiceError::Persistence(_))));

    storage.fail_detail_inserts(false);
    assert_eq!(service.get_use_case_by_id(doc.id).await.unwrap(), doc);
    assert_eq!(storage.row_counts().await, (1, 2, 3));
}

#[tokio::test]
async fn test_soft_delete_hides_the_document() {
    let (storage, service) = setup();
    let doc = create(&service).await;

    let response = service
        .delete_use_case(
            &owner(),
            DeleteRequest {
                id: doc.id,
                hard_delete: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(response.message, "Use case deleted successfully");

    assert_eq!(
        service.get_use_case_by_id(doc.id).await,
        Err(ServiceError::NotFound("Use case not found".to_string()))
    );
    assert!(service.get_all_use_cases().await.unwrap().is_empty());
    let row = storage.raw_use_case(doc.id).await.unwrap();
    assert_eq!(row.status, "deleted");
    assert_eq!(storage.row_counts().await, (1, 2, 3));
}

#[tokio::test]
async fn test_hard_delete_removes_every_row() {
    let (storage, service) = setup();
    let doc = create(&service).await;

    service
        .delete_use_case(
            &owner(),
            DeleteRequest {
                id: doc.id,
                hard_delete: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(storage.row_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_delete_by_another_owner_is_not_found() {
    let (storage, service) = setup();
    let doc = create(&service).await;

    let result = service
        .delete_use_case(
            &UserContext::new("intruder"),
            DeleteRequest {
                id: doc.id,
                hard_delete: true,
            },
        )
        .await;
    assert_eq!(
        result,
        Err(ServiceError::NotFound(
            "Use case not found or you don't have permission to delete it".to_string()
        ))
    );
    assert_eq!(storage.row_counts().await, (1, 2, 3));
}

#[tokio::test]
async fn test_get_by_name_is_case_insensitive() {
    let (_, service) = setup();
    let doc = create(&service).await;

    let found = service
        .get_use_case(UseCaseQuery {
            id: None,
            name: Some("registro DE".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(found.id, doc.id);
}

#[tokio::test]
async fn test_id_takes_precedence_over_name() {
    let (_, service) = setup();
    let doc = create(&service).await;

    let result = service
        .get_use_case(UseCaseQuery {
            id: Some(999),
            name: Some("Registro".to_string()),
        })
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let found = service
        .get_use_case(UseCaseQuery {
            id: Some(doc.id),
            name: Some("no coincide".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(found.id, doc.id);
}

#[tokio::test]
async fn test_get_without_identifier_is_invalid() {
    let (_, service) = setup();
    let result = service.get_use_case(UseCaseQuery::default()).await;
    assert_eq!(
        result,
        Err(ServiceError::InvalidIdentifier(
            "Either id or name must be provided".to_string()
        ))
    );

    let result = service
        .get_use_case(UseCaseQuery {
            id: None,
            name: Some(String::new()),
        })
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidIdentifier(_))));
}

#[tokio::test]
async fn test_missing_use_case_is_not_found() {
    let (_, service) = setup();
    let result = service
        .get_use_case(UseCaseQuery {
            id: Some(999_999),
            name: None,
        })
        .await;
    assert_eq!(
        result,
        Err(ServiceError::NotFound("Use case not found".to_string()))
    );
}

#[tokio::test]
async fn test_list_is_ordered_by_id() {
    let (_, service) = setup();
    let first = create(&service).await;
    let second = create(&service).await;

    let all = service.get_all_use_cases().await.unwrap();
    let ids: Vec<i64> = all.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn test_concurrent_updates_on_one_use_case_serialize() {
    let (storage, service) = setup();
    let doc = create(&service).await;

    let mut tasks = Vec::new();
    for round in 0..8 {
        let service = service.clone();
        let mut changed = doc.clone();
        changed.name = format!("Versión {}", round);
        tasks.push(tokio::spawn(async move {
            service
                .save_use_case(&owner(), UpsertUseCase::Update(changed))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = service.get_use_case_by_id(doc.id).await.unwrap();
    assert!(stored.name.starts_with("Versión "));
    assert_eq!(storage.row_counts().await, (1, 2, 3));
}
