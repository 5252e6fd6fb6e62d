// tests/exam_tests.rs

mod common;

use common::{pdf_part, spawn_app};
use examurp::models::user::Role;
use reqwest::multipart::{Form, Part};

#[tokio::test]
async fn created_exam_is_listed_and_its_pdf_is_served() {
    let app = spawn_app().await;
    let admin = app.user_token(Role::Admin).await;

    let exam = app
        .create_exam(&admin, "Base de Datos", "Final", "6 ciclo", 2024, "II")
        .await;
    let file_url = exam["file_url"].as_str().unwrap();
    assert!(file_url.starts_with(&format!("{}/storage/examenes/pdfs/Base_de_Datos_Final_6_ciclo_2024_II_", app.address)));

    let pdf = app.client.get(file_url).send().await.unwrap();
    assert_eq!(pdf.status().as_u16(), 200);
    assert_eq!(pdf.bytes().await.unwrap().as_ref(), b"%PDF-1.4 original");

    let student = app.user_token(Role::Alumno).await;
    let preview: serde_json::Value = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam["id"])))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preview["file_url"], exam["file_url"]);
    assert_eq!(preview["exam_type"], "Final");
}

#[tokio::test]
async fn create_requires_every_field_and_a_pdf() {
    let app = spawn_app().await;
    let admin = app.user_token(Role::Admin).await;

    let missing_cycle = Form::new()
        .text("course", "Redes")
        .text("exam_type", "Final")
        .text("cycle", "   ")
        .text("year", "2024")
        .text("period", "I")
        .part("file", pdf_part(b"%PDF"));

    let missing_file = Form::new()
        .text("course", "Redes")
        .text("exam_type", "Final")
        .text("cycle", "6 ciclo")
        .text("year", "2024")
        .text("period", "I");

    let not_a_pdf = Form::new()
        .text("course", "Redes")
        .text("exam_type", "Final")
        .text("cycle", "6 ciclo")
        .text("year", "2024")
        .text("period", "I")
        .part(
            "file",
            Part::bytes(&b"hello"[..]).file_name("notes.txt").mime_str("text/plain").unwrap(),
        );

    let bad_type = Form::new()
        .text("course", "Redes")
        .text("exam_type", "Midterm")
        .text("cycle", "6 ciclo")
        .text("year", "2024")
        .text("period", "I")
        .part("file", pdf_part(b"%PDF"));

    for form in [missing_cycle, missing_file, not_a_pdf, bad_type] {
        let response = app
            .client
            .post(app.url("/api/admin/exams"))
            .bearer_auth(&admin)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    let listed: Vec<serde_json::Value> = app
        .client
        .get(app.url("/api/exams"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn catalog_filters_combine() {
    let app = spawn_app().await;
    let admin = app.user_token(Role::Admin).await;
    app.create_exam(&admin, "Cálculo I", "Partial", "6 ciclo", 2023, "I").await;
    app.create_exam(&admin, "Calculus II", "Final", "7 ciclo", 2024, "II").await;
    app.create_exam(&admin, "Redes", "Final", "6 ciclo", 2024, "I").await;

    let student = app.user_token(Role::Alumno).await;
    let courses = |query: &'static str| {
        let app = &app;
        let student = student.clone();
        async move {
            let exams: Vec<serde_json::Value> = app
                .client
                .get(app.url(&format!("/api/exams{}", query)))
                .bearer_auth(student)
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            exams
                .iter()
                .map(|e| e["course"].as_str().unwrap().to_string())
                .collect::<Vec<_>>()
        }
    };

    assert_eq!(courses("").await.len(), 3);
    assert_eq!(courses("?course=&exam_type=&year=").await.len(), 3);
    // no accent folding: "calc" misses "Cálculo I"
    assert_eq!(courses("?course=CALC").await, vec!["Calculus II"]);
    assert_eq!(courses("?exam_type=Final&cycle=6%20ciclo").await, vec!["Redes"]);
    assert_eq!(courses("?year=2024&period=II").await, vec!["Calculus II"]);
    assert!(courses("?year=1999").await.is_empty());

    let years: Vec<i32> = app
        .client
        .get(app.url("/api/exams/years"))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(years, vec![2024, 2023]);
}

#[tokio::test]
async fn catalog_requires_a_session() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/api/exams")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn editing_the_file_replaces_the_stored_object() {
    let app = spawn_app().await;
    let admin = app.user_token(Role::Admin).await;
    let exam = app.create_exam(&admin, "Redes", "Final", "6 ciclo", 2024, "I").await;
    let old_url = exam["file_url"].as_str().unwrap().to_string();

    let form = Form::new()
        .text("course", "Redes de Computadoras")
        .part("file", pdf_part(b"%PDF-1.4 replacement"));
    let response = app
        .client
        .put(app.url(&format!("/api/admin/exams/{}", exam["id"])))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: serde_json::Value = response.json().await.unwrap();

    let new_url = updated["file_url"].as_str().unwrap();
    assert_ne!(new_url, old_url);
    assert!(new_url.contains(&format!("/pdfs/{}_", exam["id"])));
    assert_eq!(updated["course"], "Redes de Computadoras");
    assert_eq!(updated["exam_type"], "Final");

    let old = app.client.get(&old_url).send().await.unwrap();
    assert_eq!(old.status().as_u16(), 404);

    let new = app.client.get(new_url).send().await.unwrap();
    assert_eq!(new.bytes().await.unwrap().as_ref(), b"%PDF-1.4 replacement");
}

#[tokio::test]
async fn editing_fields_only_keeps_the_file() {
    let app = spawn_app().await;
    let admin = app.user_token(Role::Admin).await;
    let exam = app.create_exam(&admin, "Redes", "Final", "6 ciclo", 2024, "I").await;

    let response = app
        .client
        .put(app.url(&format!("/api/admin/exams/{}", exam["id"])))
        .bearer_auth(&admin)
        .multipart(Form::new().text("year", "2025").text("period", "II"))
        .send()
        .await
        .unwrap();
    let updated: serde_json::Value = response.json().await.unwrap();

    assert_eq!(updated["year"], 2025);
    assert_eq!(updated["period"], "II");
    assert_eq!(updated["file_url"], exam["file_url"]);

    let missing = app
        .client
        .put(app.url("/api/admin/exams/99999"))
        .bearer_auth(&admin)
        .multipart(Form::new().text("year", "2025"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_removes_row_and_object() {
    let app = spawn_app().await;
    let admin = app.user_token(Role::Admin).await;
    let exam = app.create_exam(&admin, "Redes", "Final", "6 ciclo", 2024, "I").await;
    let path = format!("/api/admin/exams/{}", exam["id"]);

    let response = app.client.delete(app.url(&path)).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let again = app.client.delete(app.url(&path)).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(again.status().as_u16(), 404);

    let preview = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam["id"])))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(preview.status().as_u16(), 404);

    let file = app.client.get(exam["file_url"].as_str().unwrap()).send().await.unwrap();
    assert_eq!(file.status().as_u16(), 404);
}
