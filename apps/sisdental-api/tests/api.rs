//! Testes HTTP de ponta a ponta sobre o router completo

mod common;

use axum::http::header::CONTENT_DISPOSITION;
use axum::http::{Method, StatusCode};
use common::{body_bytes, body_json, build_test_app};
use serde_json::json;

fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

#[tokio::test]
async fn test_health() {
    let app = build_test_app().await;
    let response = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = build_test_app().await;

    let response = app.send(Method::GET, "/api/pacientes", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["erro"].is_string());

    let response = app.get("/api/pacientes", "lixo").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patient_token_cannot_reach_staff_routes() {
    let app = build_test_app().await;
    let token = app.patient_token(1, "Maria");

    let response = app.get("/api/dashboard", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_staff_register_and_login() {
    let app = build_test_app().await;
    let body = json!({
        "email": "Recepcao@Clinica.com",
        "password": "segura123",
        "full_name": "Recepção"
    });

    let response = app.post_json("/auth/register", None, body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["email"], "recepcao@clinica.com");

    let response = app.post_json("/auth/register", None, body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": "recepcao@clinica.com", "password": "errada" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": "recepcao@clinica.com", "password": "segura123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let token = json["access_token"].as_str().expect("token").to_string();
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["user"]["email"], "recepcao@clinica.com");
    assert!(json["user"].get("password_hash").is_none());

    let response = app.get("/api/dashboard", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total_patients"], 0);
}

#[tokio::test]
async fn test_patient_crud() {
    let app = build_test_app().await;
    let token = app.staff_token();

    let id = app
        .create_patient(
            &token,
            json!({
                "name": "Maria Souza",
                "cpf": "123.456.789-01",
                "birth_date": "1990-04-12"
            }),
        )
        .await;

    let response = app.get("/api/pacientes?busca=maria", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["cpf"], "12345678901");

    let response = app
        .put_json(
            &format!("/api/pacientes/{id}"),
            &token,
            json!({ "name": "Maria S. Lima", "cpf": "12345678901", "phone": "11 99999-0000" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Maria S. Lima");

    let response = app.get(&format!("/api/pacientes/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let details = body_json(response).await;
    assert_eq!(details["patient"]["phone"], "11 99999-0000");
    assert!(details["appointments"].is_array());
    assert!(details["documents"].is_array());

    let response = app.delete(&format!("/api/pacientes/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["sucesso"], true);

    let response = app.get(&format!("/api/pacientes/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patient_without_name_is_rejected() {
    let app = build_test_app().await;
    let token = app.staff_token();

    let response = app
        .post_json("/api/pacientes", Some(&token), json!({ "name": "   " }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_appointment_flags_today() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let patient_id = app.create_patient(&token, json!({ "name": "João Lima" })).await;

    let response = app
        .post_json(
            "/api/agendamentos",
            Some(&token),
            json!({
                "patient_id": patient_id,
                "service": "Limpeza",
                "date": today(),
                "time": "09:30"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().expect("id do agendamento");
    assert_eq!(created["time"], "09:30:00");

    let response = app.get("/api/agendamentos?paciente=Jo", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list[0]["is_today"], true);
    assert_eq!(list[0]["is_tomorrow"], false);

    let response = app
        .put_json(
            &format!("/api/agendamentos/{id}/status"),
            &token,
            json!({ "status": "desconhecido" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/dashboard", &token).await;
    let summary = body_json(response).await;
    assert_eq!(summary["appointments_today"], 1);
}

#[tokio::test]
async fn test_appointment_for_missing_patient() {
    let app = build_test_app().await;
    let token = app.staff_token();

    let response = app
        .post_json(
            "/api/agendamentos",
            Some(&token),
            json!({ "patient_id": 999, "service": "Limpeza", "date": today(), "time": "10:00" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_treatment_bills_and_cascades() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let patient_id = app.create_patient(&token, json!({ "name": "Ana Prado" })).await;

    let response = app
        .post_json(
            "/api/odontograma/tratamentos",
            Some(&token),
            json!({
                "patient_id": patient_id,
                "tooth_number": 36,
                "treatment_type": "Restauração",
                "treatment_date": "2024-03-10",
                "amount": "150.00"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let treatment = body_json(response).await;
    let treatment_id = treatment["id"].as_i64().expect("id do tratamento");
    assert_eq!(treatment["completed"], false);

    let response = app.get(&format!("/api/odontograma/{patient_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let overview = body_json(response).await;
    assert_eq!(overview["patient"]["name"], "Ana Prado");
    assert_eq!(overview["finances"][0]["treatment_id"], treatment_id);
    assert_eq!(overview["finances"][0]["amount"], 150.0);
    assert_eq!(overview["finances"][0]["status"], "pendente");

    let response = app
        .put_json(
            &format!("/api/odontograma/tratamentos/{treatment_id}/status"),
            &token,
            json!({ "completed": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/api/odontograma/{patient_id}/tratamentos"), &token)
        .await;
    assert_eq!(body_json(response).await[0]["completed"], true);

    let response = app
        .delete(&format!("/api/odontograma/tratamentos/{treatment_id}"), &token)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/api/financeiro/lancamentos", &token).await;
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_tooth_number_out_of_range() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let patient_id = app.create_patient(&token, json!({ "name": "Ana Prado" })).await;

    let response = app
        .post_json(
            "/api/odontograma/tratamentos",
            Some(&token),
            json!({
                "patient_id": patient_id,
                "tooth_number": 99,
                "treatment_type": "Extração",
                "treatment_date": "2024-03-10"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_finance_entry_lifecycle() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let patient_id = app.create_patient(&token, json!({ "name": "Carla Dias" })).await;

    let response = app
        .post_json(
            "/api/financeiro/lancamentos",
            Some(&token),
            json!({
                "patient_id": patient_id,
                "description": "Consulta",
                "amount": "-10",
                "due_date": "2024-05-01"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/api/financeiro/lancamentos",
            Some(&token),
            json!({
                "patient_id": patient_id,
                "description": "Consulta",
                "amount": "80.50",
                "due_date": "2024-05-01"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_i64().expect("id do lançamento");

    let response = app
        .put_json(
            &format!("/api/financeiro/lancamentos/{id}/status"),
            &token,
            json!({ "status": "pago", "paid_date": "2024-05-02" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/financeiro/lancamentos", &token).await;
    let list = body_json(response).await;
    assert_eq!(list[0]["status"], "pago");
    assert_eq!(list[0]["paid_date"], "2024-05-02");
    assert_eq!(list[0]["patient"]["name"], "Carla Dias");

    let response = app
        .delete(&format!("/api/financeiro/lancamentos/{id}"), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_document_generate_and_download() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let patient_id = app.create_patient(&token, json!({ "name": "Pedro Alves" })).await;

    let response = app
        .post_json(
            &format!("/api/documentos/paciente/{patient_id}/atestado"),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let document = body_json(response).await;
    let id = document["id"].as_i64().expect("id do documento");
    assert_eq!(document["document_type"], "certificate");
    assert!(document.get("storage_path").is_none());

    let response = app
        .post_json(
            &format!("/api/documentos/paciente/{patient_id}/laudo"),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get(&format!("/api/documentos/{id}/download"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("atestado_"));

    let content = String::from_utf8(body_bytes(response).await).expect("texto");
    assert!(content.starts_with("ATESTADO ODONTOLÓGICO"));
    assert!(content.contains("Pedro Alves"));

    let response = app
        .get(&format!("/api/documentos/paciente/{patient_id}"), &token)
        .await;
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_portal_flow() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let patient_id = app
        .create_patient(
            &token,
            json!({ "name": "Lúcia Reis", "cpf": "987.654.321-00", "birth_date": "1985-07-20" }),
        )
        .await;
    let other_id = app.create_patient(&token, json!({ "name": "Outro Paciente" })).await;

    let response = app
        .post_json(
            &format!("/api/documentos/paciente/{other_id}/receita"),
            Some(&token),
            json!({ "body": "Amoxicilina 500mg" }),
        )
        .await;
    let foreign_document = body_json(response).await["id"].as_i64().expect("id");

    // Login antes do primeiro acesso
    let response = app
        .post_json(
            "/portal/login",
            None,
            json!({ "cpf": "98765432100", "password": "senha123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/portal/primeiro-acesso",
            None,
            json!({
                "cpf": "98765432100",
                "birth_date": "1985-07-20",
                "password": "senha123",
                "password_confirmation": "outra123"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let first_access = json!({
        "cpf": "987.654.321-00",
        "birth_date": "1985-07-20",
        "password": "senha123",
        "password_confirmation": "senha123"
    });
    let response = app
        .post_json("/portal/primeiro-acesso", None, first_access.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_json("/portal/primeiro-acesso", None, first_access)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .post_json(
            "/portal/login",
            None,
            json!({ "cpf": "98765432100", "password": "senha123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    assert_eq!(login["patient"]["id"], patient_id);
    let patient_token = login["access_token"].as_str().expect("token").to_string();

    let response = app.get("/portal/home", &patient_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let home = body_json(response).await;
    assert_eq!(home["name"], "Lúcia Reis");
    assert!(home["treatments"].is_array());

    let response = app
        .get(&format!("/portal/documentos/{foreign_document}/download"), &patient_token)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Token do portal não abre a área da equipe
    let response = app.get("/api/pacientes", &patient_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_patient_delete_removes_stored_documents() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let patient_id = app.create_patient(&token, json!({ "name": "Rita Moraes" })).await;
    let other_id = app.create_patient(&token, json!({ "name": "Sérgio Nunes" })).await;

    for (id, kind) in [(patient_id, "certificate"), (patient_id, "receita"), (other_id, "atestado")] {
        let response = app
            .post_json(&format!("/api/documentos/paciente/{id}/{kind}"), Some(&token), json!({}))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    assert_eq!(app.stored_files(), 3);

    let response = app.delete(&format!("/api/pacientes/{patient_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.stored_files(), 1);

    let response = app
        .get(&format!("/api/documentos/paciente/{other_id}"), &token)
        .await;
    let remaining = body_json(response).await;
    let document_id = remaining[0]["id"].as_i64().expect("id do documento");
    let response = app
        .get(&format!("/api/documentos/{document_id}/download"), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_first_access_sets_password_only_once_under_concurrency() {
    let app = build_test_app().await;
    let token = app.staff_token();
    app.create_patient(
        &token,
        json!({ "name": "Bruno Costa", "cpf": "111.222.333-44", "birth_date": "1979-02-03" }),
    )
    .await;

    let request = |password: &str| {
        json!({
            "cpf": "11122233344",
            "birth_date": "1979-02-03",
            "password": password,
            "password_confirmation": password
        })
    };
    let (first, second) = tokio::join!(
        app.post_json("/portal/primeiro-acesso", None, request("primeira1")),
        app.post_json("/portal/primeiro-acesso", None, request("segunda2")),
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort_by_key(|s| s.as_u16());
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    // Só uma das duas senhas vale no login
    let mut accepted = 0;
    for password in ["primeira1", "segunda2"] {
        let response = app
            .post_json(
                "/portal/login",
                None,
                json!({ "cpf": "11122233344", "password": password }),
            )
            .await;
        if response.status() == StatusCode::OK {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn test_appointment_show_and_update() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let patient_id = app.create_patient(&token, json!({ "name": "Helena Duarte" })).await;

    let response = app
        .post_json(
            "/api/agendamentos",
            Some(&token),
            json!({
                "patient_id": patient_id,
                "service": "Avaliação",
                "date": "2024-06-10",
                "time": "14:00"
            }),
        )
        .await;
    let id = body_json(response).await["id"].as_i64().expect("id do agendamento");

    let response = app.get(&format!("/api/agendamentos/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let shown = body_json(response).await;
    assert_eq!(shown["appointment"]["status"], "Agendado");
    assert_eq!(shown["appointment"]["service"], "Avaliação");
    assert_eq!(
        shown["statuses"],
        json!(["Agendado", "Confirmado", "Realizado", "Cancelado", "Não Compareceu"])
    );

    let update = |status: &str| {
        json!({
            "patient_id": patient_id,
            "service": "Canal",
            "date": "2024-06-11",
            "time": "15:30",
            "status": status,
            "notes": "Trazer exames"
        })
    };

    let response = app
        .put_json(&format!("/api/agendamentos/{id}"), &token, update("Confirmado"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["service"], "Canal");
    assert_eq!(updated["date"], "2024-06-11");
    assert_eq!(updated["time"], "15:30:00");
    assert_eq!(updated["status"], "Confirmado");

    let response = app
        .put_json(&format!("/api/agendamentos/{id}"), &token, update("Adiado"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .put_json(&format!("/api/agendamentos/{}", id + 100), &token, update("Confirmado"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get(&format!("/api/agendamentos/{}", id + 100), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get(&format!("/api/agendamentos/{id}"), &token).await;
    assert_eq!(body_json(response).await["appointment"]["status"], "Confirmado");
}

#[tokio::test]
async fn test_patient_names_for_selectors() {
    let app = build_test_app().await;
    let token = app.staff_token();
    let zeca = app
        .create_patient(&token, json!({ "name": "Zeca Ramos", "cpf": "22233344455" }))
        .await;
    let amanda = app.create_patient(&token, json!({ "name": "Amanda Reis" })).await;

    let response = app.get("/api/pacientes/listar", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([
            { "id": amanda, "name": "Amanda Reis" },
            { "id": zeca, "name": "Zeca Ramos" }
        ])
    );
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let app = build_test_app().await;
    let token = app.staff_token();
    app.create_patient(&token, json!({ "name": "Maria Souza" })).await;
    app.create_patient(&token, json!({ "name": "Ana_Beatriz" })).await;

    let response = app.get("/api/pacientes?busca=_", &token).await;
    let found = body_json(response).await;
    assert_eq!(found.as_array().map(Vec::len), Some(1));
    assert_eq!(found[0]["name"], "Ana_Beatriz");

    let response = app.get("/api/pacientes?busca=%25", &token).await;
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(0));
}
