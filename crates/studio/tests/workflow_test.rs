//! Integration tests for the workbench driven against the mock backend

use docflow_common::models::OptimizeResponse;
use docflow_common::{Error, FilterKind, OutputFormat};
use docflow_studio::gateway::{GatewayError, Method, RequestBody};
use docflow_studio::generation::{GenerationLifecycle, GenerationState};
use docflow_studio::optimization::{OptimizationLifecycle, OptimizationState};
use docflow_studio::{Channel, Command, Config, MockBackend, UploadFile, Workbench};
use serde_json::{json, Value};
use std::sync::Arc;

/// Helper to create a workbench over a fresh mock backend
fn create_test_bench() -> (Workbench, Arc<MockBackend>) {
    let backend = Arc::new(MockBackend::new());
    let bench = Workbench::new(&Config::default(), backend.clone());
    (bench, backend)
}

fn png(name: &str) -> UploadFile {
    UploadFile::new(name, vec![0x89, b'P', b'N', b'G'])
}

async fn fill_generation_form(bench: &mut Workbench) {
    bench.dispatch(Command::SetDocumentType(Some("report".into()))).await.unwrap();
    bench.dispatch(Command::SetTemplate(Some("t1.docx".into()))).await.unwrap();
    bench.dispatch(Command::EditRequirements("x".into())).await.unwrap();
    bench.dispatch(Command::SetOutputFormat(OutputFormat::Pdf)).await.unwrap();
}

#[tokio::test]
async fn test_generate_success_refreshes_list_once() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(Method::Post, "/generate", json!({"success": true, "filename": "out.pdf", "format": "pdf"}))
        .await;
    backend
        .respond(
            Method::Get,
            "/generated_documents",
            json!([{"filename": "out.pdf", "format": "pdf", "size": 1024, "created": "2024-03-01 12:00:00"}]),
        )
        .await;

    fill_generation_form(&mut bench).await;
    bench.dispatch(Command::Generate).await.unwrap();

    match bench.generation().state() {
        GenerationState::Succeeded(result) => {
            assert_eq!(result.filename, "out.pdf");
            assert_eq!(result.format, "pdf");
            assert!(result.usage.is_none());
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(backend.call_count(Method::Get, "/generated_documents").await, 1);
    assert_eq!(bench.library().records().len(), 1);

    let calls = backend.calls().await;
    assert_eq!(
        calls[0].body,
        RequestBody::Json(json!({
            "doc_type": "report",
            "template": "t1.docx",
            "requirements": "x",
            "output_format": "pdf"
        }))
    );

    let alert = bench.alerts().latest(Channel::Generate).unwrap();
    assert!(!alert.is_error());
    assert!(alert.message.contains("out.pdf"));
}

#[tokio::test]
async fn test_generate_failure_leaves_list_untouched() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(Method::Post, "/generate", json!({"success": false, "error": "模板文件不存在"}))
        .await;

    fill_generation_form(&mut bench).await;
    let result = bench.dispatch(Command::Generate).await;

    assert_eq!(result, Err(Error::RemoteOperation("模板文件不存在".into())));
    assert_eq!(bench.generation().state(), &GenerationState::Failed("模板文件不存在".into()));
    assert_eq!(backend.call_count(Method::Get, "/generated_documents").await, 0);
    assert_eq!(bench.alerts().latest(Channel::Generate).unwrap().message, "模板文件不存在");
}

#[tokio::test]
async fn test_generate_without_template_never_calls_backend() {
    let (mut bench, backend) = create_test_bench();
    bench.dispatch(Command::SetDocumentType(Some("report".into()))).await.unwrap();

    let result = bench.dispatch(Command::Generate).await;
    assert!(matches!(result, Err(Error::LocalValidation(_))));
    assert_eq!(bench.generation().state(), &GenerationState::Idle);
    assert!(backend.calls().await.is_empty());
}

#[tokio::test]
async fn test_import_then_generate_forwards_image_folder() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(
            Method::Post,
            "/extract_text",
            json!({"success": true, "content": "舊版 SOP", "images": {"folder": "extracted_42", "count": 2}}),
        )
        .await;
    backend
        .respond(Method::Post, "/generate", json!({"success": true, "filename": "sop.docx", "format": "docx"}))
        .await;
    backend.respond(Method::Get, "/generated_documents", json!([])).await;

    bench
        .dispatch(Command::ImportDocument(UploadFile::new("old.docx", b"PK".to_vec())))
        .await
        .unwrap();
    assert_eq!(bench.generation().draft().requirements, "舊版 SOP");
    assert!(bench.alerts().latest(Channel::Generate).unwrap().message.contains("2 images"));

    bench.dispatch(Command::SetDocumentType(Some("sop".into()))).await.unwrap();
    bench.dispatch(Command::SetTemplate(Some("t1.docx".into()))).await.unwrap();
    bench.dispatch(Command::Generate).await.unwrap();

    let calls = backend.calls().await;
    let generate = calls.iter().find(|c| c.endpoint == "/generate").unwrap();
    match &generate.body {
        RequestBody::Json(body) => assert_eq!(body["image_folder"], json!("extracted_42")),
        other => panic!("unexpected body {:?}", other),
    }
}

#[tokio::test]
async fn test_generation_guard_does_not_block_optimization() {
    let mut generation = GenerationLifecycle::new(OutputFormat::Docx);
    generation.draft_mut().doc_type = Some("report".into());
    generation.draft_mut().template = Some("t1.docx".into());

    generation.begin().unwrap();
    assert_eq!(generation.begin(), Err(Error::Busy("Generation")));

    let mut optimization = OptimizationLifecycle::new();
    let request = optimization.begin("x", Some("report")).unwrap();
    assert_eq!(request.requirements, "x");
    assert_eq!(optimization.state(), OptimizationState::Optimizing);

    optimization
        .complete(Ok(OptimizeResponse {
            optimized_requirements: "better x".into(),
        }))
        .unwrap();
    assert!(generation.is_submitting());
}

#[tokio::test]
async fn test_optimize_accept_revert_roundtrip() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(
            Method::Post,
            "/optimize-requirements",
            json!({"success": true, "optimized_requirements": "1. Goal\n2. Steps"}),
        )
        .await;

    let original = "  weekly sales summary \n";
    bench.dispatch(Command::SetDocumentType(Some("report".into()))).await.unwrap();
    bench.dispatch(Command::EditRequirements(original.into())).await.unwrap();
    bench.dispatch(Command::OptimizeRequirements).await.unwrap();

    let calls = backend.calls().await;
    assert_eq!(
        calls[0].body,
        RequestBody::Json(json!({"requirements": "weekly sales summary", "doc_type": "report"}))
    );

    bench.dispatch(Command::AcceptOptimized).await.unwrap();
    assert_eq!(bench.generation().draft().requirements, "1. Goal\n2. Steps");

    bench.dispatch(Command::RevertRequirements).await.unwrap();
    assert_eq!(bench.generation().draft().requirements, original);
}

#[tokio::test]
async fn test_optimize_transport_failure_keeps_live_field() {
    let (mut bench, backend) = create_test_bench();
    backend
        .fail(Method::Post, "/optimize-requirements", GatewayError::transport("connection refused"))
        .await;

    bench.dispatch(Command::SetDocumentType(Some("report".into()))).await.unwrap();
    bench.dispatch(Command::EditRequirements("draft".into())).await.unwrap();

    let result = bench.dispatch(Command::OptimizeRequirements).await;
    assert_eq!(result, Err(Error::Transport("connection refused".into())));
    assert_eq!(bench.optimization().state(), OptimizationState::Idle);
    assert_eq!(bench.generation().draft().requirements, "draft");
    assert!(bench.dispatch(Command::CancelOptimized).await.is_err());
}

#[tokio::test]
async fn test_staging_skips_failed_file_in_order() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond_with(Method::Post, "/stage_image", |request| {
            let name = match &request.body {
                RequestBody::File { file, .. } => file.filename.clone(),
                _ => String::new(),
            };
            if name == "b.png" {
                return Ok(json!({"success": false, "error": "不支持的文件格式"}));
            }
            Ok(json!({"success": true, "filename": format!("1_{}", name), "path": format!("temp_images/1_{}", name)}))
        })
        .await;

    bench
        .dispatch(Command::StageImages(vec![png("a.png"), png("b.png"), png("c.png")]))
        .await
        .unwrap();

    let names: Vec<_> = bench
        .registry()
        .images()
        .iter()
        .map(|i| i.original_filename.as_str())
        .collect();
    assert_eq!(names, vec!["a.png", "c.png"]);
    assert_eq!(backend.call_count(Method::Post, "/stage_image").await, 3);

    let errors: Vec<_> = bench.alerts().active().into_iter().filter(|a| a.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("b.png"));
    assert!(errors[0].message.contains("不支持的文件格式"));
}

#[tokio::test]
async fn test_inject_with_empty_registry_is_local() {
    let (mut bench, backend) = create_test_bench();
    bench.dispatch(Command::SelectSource(Some("deck.pptx".into()))).await.unwrap();

    let result = bench.dispatch(Command::InjectImages).await;
    assert!(matches!(result, Err(Error::LocalValidation(_))));
    assert!(backend.calls().await.is_empty());
    assert!(bench.alerts().latest(Channel::Injection).unwrap().is_error());
}

#[tokio::test]
async fn test_inject_success_resets_and_refreshes() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(
            Method::Get,
            "/history",
            json!([{"filename": "deck.pptx", "date": "2024-03-01"}, {"filename": "memo.docx", "date": "2024-03-01"}]),
        )
        .await;
    backend
        .respond(
            Method::Get,
            "/history",
            json!([{"filename": "deck.pptx", "date": "2024-03-01"}, {"filename": "deck_v1.pptx", "date": "2024-03-02"}]),
        )
        .await;
    backend
        .respond(Method::Post, "/stage_image", json!({"success": true, "filename": "1_a.png", "path": "temp_images/1_a.png"}))
        .await;
    backend
        .respond(
            Method::Post,
            "/inject_images",
            json!({"success": true, "filename": "deck_v1.pptx", "download_url": "/api/download/deck_v1.pptx"}),
        )
        .await;
    backend
        .respond(
            Method::Get,
            "/generated_documents",
            json!([{"filename": "deck.pptx"}, {"filename": "deck_v1.pptx"}]),
        )
        .await;

    bench.dispatch(Command::RefreshSources).await.unwrap();
    assert_eq!(bench.sources().entries().len(), 1);

    bench.dispatch(Command::SelectSource(Some("deck.pptx".into()))).await.unwrap();
    bench.dispatch(Command::StageImages(vec![png("a.png")])).await.unwrap();
    bench
        .dispatch(Command::SetSlideNumber {
            index: 0,
            value: "3".into(),
        })
        .await
        .unwrap();
    bench.dispatch(Command::InjectImages).await.unwrap();

    let calls = backend.calls().await;
    let inject = calls.iter().find(|c| c.endpoint == "/inject_images").unwrap();
    assert_eq!(
        inject.body,
        RequestBody::Json(json!({
            "filename": "deck.pptx",
            "injections": [{"image_path": "temp_images/1_a.png", "slide_number": 3}]
        }))
    );

    assert!(bench.registry().is_empty());
    assert!(bench.registry().source().is_none());
    assert_eq!(backend.call_count(Method::Get, "/generated_documents").await, 1);
    assert_eq!(bench.sources().entries().len(), 2);

    bench.dispatch(Command::SetFilter(FilterKind::Optimized)).await.unwrap();
    let visible: Vec<_> = bench.library().visible().into_iter().map(|r| r.filename).collect();
    assert_eq!(visible, vec!["deck_v1.pptx"]);
}

#[tokio::test]
async fn test_inject_failure_keeps_staged_images() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(Method::Post, "/stage_image", json!({"success": true, "filename": "1_a.png", "path": "temp_images/1_a.png"}))
        .await;
    backend
        .respond(Method::Post, "/inject_images", json!({"success": false, "error": "投影片編號超出範圍"}))
        .await;

    bench.dispatch(Command::SelectSource(Some("deck.pptx".into()))).await.unwrap();
    bench.dispatch(Command::StageImages(vec![png("a.png")])).await.unwrap();

    let result = bench.dispatch(Command::InjectImages).await;
    assert_eq!(result, Err(Error::RemoteOperation("投影片編號超出範圍".into())));
    assert_eq!(bench.registry().len(), 1);
    assert_eq!(bench.registry().source(), Some("deck.pptx"));
    assert!(!bench.registry().is_injecting());
    assert_eq!(backend.call_count(Method::Get, "/generated_documents").await, 0);
}

#[tokio::test]
async fn test_vanished_source_is_cleared() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(Method::Get, "/history", json!([{"filename": "other.pptx", "date": "2024-03-01"}]))
        .await;

    bench.dispatch(Command::SelectSource(Some("deleted.pptx".into()))).await.unwrap();
    bench.dispatch(Command::RefreshSources).await.unwrap();
    assert!(bench.registry().source().is_none());
}

#[tokio::test]
async fn test_diagram_render_failure_keeps_previous_image() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(
            Method::Post,
            "/generate-mermaid",
            json!({"success": true, "mermaid_code": "flowchart TD\n  A --> B"}),
        )
        .await;
    backend
        .respond(
            Method::Post,
            "/generate-flowchart",
            json!({"success": true, "download_url": "/api/download/flowchart_1.png", "filename": "flowchart_1.png"}),
        )
        .await;
    backend
        .fail(Method::Post, "/generate-flowchart", GatewayError::backend("Kroki 服務無回應"))
        .await;

    bench.dispatch(Command::DescribeDiagram("A then B".into())).await.unwrap();
    bench.dispatch(Command::EditDiagramSource("graph LR; X-->Y".into())).await.unwrap();
    bench.dispatch(Command::GenerateDiagramSource).await.unwrap();
    assert_eq!(bench.diagram().source(), Some("flowchart TD\n  A --> B"));

    bench.dispatch(Command::RenderDiagram).await.unwrap();
    let first = bench.diagram().rendered().cloned().unwrap();
    assert_eq!(first.image_url, "http://mock.local/api/download/flowchart_1.png");

    let result = bench.dispatch(Command::RenderDiagram).await;
    assert_eq!(result, Err(Error::RemoteOperation("Kroki 服務無回應".into())));
    assert_eq!(bench.diagram().rendered(), Some(&first));
    assert!(!bench.diagram().is_rendering());
}

#[tokio::test]
async fn test_batch_delete() {
    let (mut bench, backend) = create_test_bench();

    let result = bench.dispatch(Command::BatchDeleteArtifacts(vec![])).await;
    assert!(matches!(result, Err(Error::LocalValidation(_))));
    assert!(backend.calls().await.is_empty());

    backend
        .respond(Method::Post, "/batch_delete_generated", json!({"success": false, "error": "部分文件刪除失敗"}))
        .await;
    backend
        .respond(Method::Get, "/generated_documents", json!([{"filename": "b.docx"}]))
        .await;

    let result = bench
        .dispatch(Command::BatchDeleteArtifacts(vec!["a.docx".into(), "b.docx".into()]))
        .await;
    assert_eq!(result, Err(Error::RemoteOperation("部分文件刪除失敗".into())));
    assert_eq!(backend.call_count(Method::Get, "/generated_documents").await, 1);
    assert_eq!(bench.library().records().len(), 1);

    let calls = backend.calls().await;
    assert_eq!(calls[0].body, RequestBody::Json(json!({"filenames": ["a.docx", "b.docx"]})));
}

#[tokio::test]
async fn test_delete_succeeds_when_reload_fails() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(Method::Delete, "/delete_generated/*", json!({"success": true}))
        .await;
    backend
        .fail(Method::Get, "/generated_documents", GatewayError::transport("connection reset"))
        .await;

    let result = bench.dispatch(Command::DeleteArtifact("a.docx".into())).await;
    assert_eq!(result, Ok(()));
    assert_eq!(backend.call_count(Method::Get, "/generated_documents").await, 1);

    let alerts: Vec<_> = bench
        .alerts()
        .active()
        .into_iter()
        .filter(|alert| alert.channel == Channel::Documents)
        .map(|alert| (alert.is_error(), alert.message.clone()))
        .collect();
    assert_eq!(
        alerts,
        vec![(true, "connection reset".to_string()), (false, "Deleted a.docx".to_string())]
    );
}

#[tokio::test]
async fn test_template_upload_succeeds_when_reload_fails() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(Method::Post, "/upload_template", json!({"success": true, "message": "模板上傳成功"}))
        .await;
    backend
        .fail(Method::Get, "/templates", GatewayError::transport("connection reset"))
        .await;

    let file = UploadFile::new("weekly.docx", b"PK".to_vec());
    assert_eq!(bench.dispatch(Command::UploadTemplate(file)).await, Ok(()));

    let latest = bench.alerts().latest(Channel::Templates).unwrap();
    assert!(!latest.is_error());
    assert_eq!(latest.message, "模板上傳成功");
    assert_eq!(backend.call_count(Method::Post, "/upload_template").await, 1);
}

#[tokio::test]
async fn test_failed_reoptimize_keeps_edited_review() {
    let (mut bench, backend) = create_test_bench();
    backend
        .respond(
            Method::Post,
            "/optimize-requirements",
            json!({"success": true, "optimized_requirements": "B"}),
        )
        .await;
    backend
        .fail(Method::Post, "/optimize-requirements", GatewayError::transport("connection reset"))
        .await;

    bench.dispatch(Command::SetDocumentType(Some("report".into()))).await.unwrap();
    bench.dispatch(Command::EditRequirements("A".into())).await.unwrap();
    bench.dispatch(Command::OptimizeRequirements).await.unwrap();
    bench.dispatch(Command::EditOptimized("B, hand-edited".into())).await.unwrap();

    let result = bench.dispatch(Command::OptimizeRequirements).await;
    assert_eq!(result, Err(Error::Transport("connection reset".into())));
    assert_eq!(bench.optimization().state(), OptimizationState::Reviewing);
    assert_eq!(bench.optimization().optimized(), Some("B, hand-edited"));

    bench.dispatch(Command::AcceptOptimized).await.unwrap();
    assert_eq!(bench.generation().draft().requirements, "B, hand-edited");
}

#[tokio::test]
async fn test_settings_roundtrip() {
    let (mut bench, backend) = create_test_bench();
    backend.respond(Method::Get, "/config", json!({})).await;
    backend.respond(Method::Post, "/config", json!({"success": true})).await;

    bench.dispatch(Command::LoadSettings).await.unwrap();
    assert_eq!(bench.settings().api_type, "gemini");
    assert_eq!(bench.settings().openai_model, "gpt-4o-mini");

    let mut settings = bench.settings().clone();
    settings.api_type = "openai".into();
    bench.dispatch(Command::SaveSettings(settings)).await.unwrap();
    assert_eq!(bench.settings().api_type, "openai");

    let calls = backend.calls().await;
    let saved: &Value = match &calls[1].body {
        RequestBody::Json(body) => body,
        other => panic!("unexpected body {:?}", other),
    };
    assert_eq!(saved["api_type"], json!("openai"));
}
