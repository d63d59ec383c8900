//! Upload → preview → import workflow tests against the in-memory backend

mod common;

use std::time::Duration;

use common::{fast_config, import_result, preview_for, validation, workbook, FakeApi};
use nomina_client::api::ApiEnvelope;
use nomina_client::config::ClientConfig;
use nomina_client::dashboard::Dashboard;
use nomina_client::types::{RawStatistics, UploadFile};
use nomina_client::workflow::preview::IMPORT_CONFIRMATION;
use nomina_client::workflow::{PreviewStage, Step, UploadStage, WorkflowController};
use pretty_assertions::assert_eq;

fn backend_with_two_valid_sheets() -> FakeApi {
    let api = FakeApi::new();
    *api.validate_response.lock().unwrap() = Some(ApiEnvelope::new(
        200,
        "2 hojas válidas, 1 hojas con errores",
        Some(validation(&["Enero", "Febrero"], &["Resumen"])),
    ));
    *api.preview_response.lock().unwrap() = Some(ApiEnvelope::new(
        200,
        "Vista previa generada",
        Some(preview_for(&["Enero", "Febrero"])),
    ));
    *api.import_response.lock().unwrap() = Some(ApiEnvelope::new(
        201,
        "Datos importados",
        Some(import_result(&["Enero", "Febrero"])),
    ));
    api
}

// ═══════════════════════════════════════════════════════════════════════════
// LOCAL FILE CHECKS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_wrong_extension_makes_no_network_call() {
    let api = backend_with_two_valid_sheets();
    let mut controller = WorkflowController::new(fast_config());

    for name in ["nomina.csv", "nomina.pdf", "nomina"] {
        let moved = controller
            .submit_file(UploadFile::from_bytes(name, vec![1, 2, 3]), &api)
            .await;
        assert!(!moved);
        assert_eq!(
            controller.upload().error_message(),
            Some("Only Excel files (.xlsx, .xls) are allowed")
        );
    }
    assert_eq!(api.total_calls(), 0);
    assert_eq!(controller.step(), Step::Upload);
}

#[tokio::test]
async fn test_oversized_file_makes_no_network_call() {
    let api = backend_with_two_valid_sheets();
    let mut controller = WorkflowController::new(fast_config());

    let big = UploadFile::from_bytes("nomina.xlsx", vec![0; 10 * 1024 * 1024 + 1]);
    assert!(!controller.submit_file(big, &api).await);
    assert_eq!(
        controller.upload().error_message(),
        Some("The file must not exceed 10MB")
    );
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_file_at_size_limit_is_sent() {
    let api = backend_with_two_valid_sheets();
    let mut controller = WorkflowController::new(fast_config());

    let exact = UploadFile::from_bytes("nomina.XLSX", vec![0; 10 * 1024 * 1024]);
    assert!(controller.submit_file(exact, &api).await);
    assert_eq!(api.calls_to("validate"), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// VALIDATION OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_application_failure_keeps_envelope_message() {
    let api = FakeApi::new();
    *api.validate_response.lock().unwrap() =
        Some(ApiEnvelope::new(400, "El archivo está dañado", None));
    let mut controller = WorkflowController::new(fast_config());

    assert!(!controller.submit_file(workbook(), &api).await);
    assert_eq!(controller.step(), Step::Upload);
    assert!(!controller.upload().is_validating());
    assert_eq!(
        controller.upload().error_message(),
        Some("El archivo está dañado")
    );
}

#[tokio::test]
async fn test_transport_failure_resets_loading_flag() {
    let api = FakeApi::new();
    let mut controller = WorkflowController::new(fast_config());

    assert!(!controller.submit_file(workbook(), &api).await);
    assert!(!controller.upload().is_validating());
    assert_eq!(controller.upload().error_message(), Some("connection refused"));
    assert!(controller.validation().is_none());
}

#[tokio::test]
async fn test_no_valid_sheets_stays_on_upload_with_result() {
    let api = FakeApi::new();
    *api.validate_response.lock().unwrap() = Some(ApiEnvelope::new(
        200,
        "Ninguna hoja válida",
        Some(validation(&[], &["Hoja1", "Hoja2"])),
    ));
    let mut controller = WorkflowController::new(fast_config());

    assert!(!controller.submit_file(workbook(), &api).await);
    assert_eq!(controller.step(), Step::Upload);
    let result = controller.validation().unwrap();
    assert_eq!(result.invalid_count, 2);
    assert!(controller.preview().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// SHEET SELECTION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_default_selection_is_all_valid_sheets() {
    let api = backend_with_two_valid_sheets();
    let mut controller = WorkflowController::new(fast_config());
    assert!(controller.submit_file(workbook(), &api).await);

    let stage = controller.preview().unwrap();
    assert_eq!(stage.selected_sheets(), ["Enero", "Febrero"]);
    assert_eq!(stage.active_tab(), Some("Enero"));
    assert!(!stage.is_sheet_selected("Resumen"));
}

#[test]
fn test_toggle_is_its_own_inverse() {
    let mut stage = PreviewStage::new(
        validation(&["Enero", "Febrero", "Marzo"], &["Resumen"]),
        Some(workbook()),
        &fast_config(),
    );
    let mut before = stage.selected_sheets().to_vec();
    before.sort();

    for name in ["Enero", "Febrero", "Marzo"] {
        stage.toggle_sheet(name);
        assert!(!stage.is_sheet_selected(name));
        let mut after = stage.toggle_sheet(name);
        after.sort();
        assert_eq!(after, before);
    }
}

#[test]
fn test_toggle_ignores_invalid_sheet_names() {
    let mut stage = PreviewStage::new(
        validation(&["Enero"], &["Resumen"]),
        Some(workbook()),
        &fast_config(),
    );
    assert_eq!(stage.toggle_sheet("Resumen"), vec!["Enero".to_string()]);
    assert_eq!(stage.toggle_sheet("Inexistente"), vec!["Enero".to_string()]);
}

#[tokio::test]
async fn test_empty_selection_blocks_preview_and_import() {
    let api = backend_with_two_valid_sheets();
    let mut controller = WorkflowController::new(fast_config());
    assert!(controller.submit_file(workbook(), &api).await);

    controller.toggle_sheet("Enero");
    assert!(controller.toggle_sheet("Febrero").is_empty());
    assert!(controller.selected_sheets().is_empty());

    assert!(!controller.load_preview(&api).await);
    assert!(controller.import(&api).await.is_none());
    assert_eq!(
        controller.preview().unwrap().import_error(),
        Some("Select at least one valid sheet")
    );
    assert_eq!(api.calls_to("preview"), 0);
    assert_eq!(api.calls_to("import"), 0);
    assert_eq!(controller.step(), Step::Preview);
}

#[tokio::test]
async fn test_preview_and_import_send_selected_sheets() {
    let api = backend_with_two_valid_sheets();
    let mut controller = WorkflowController::new(fast_config());
    assert!(controller.submit_file(workbook(), &api).await);

    controller.toggle_sheet("Enero");
    controller.load_preview(&api).await;
    assert_eq!(*api.last_sheets.lock().unwrap(), vec!["Febrero".to_string()]);

    controller.import(&api).await;
    assert_eq!(*api.last_sheets.lock().unwrap(), vec!["Febrero".to_string()]);
}

// ═══════════════════════════════════════════════════════════════════════════
// END TO END
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_two_valid_one_invalid_reaches_view_after_delay() {
    let api = backend_with_two_valid_sheets();
    let config = ClientConfig::default();
    let mut controller = WorkflowController::new(config.clone());
    let mut reload = controller.subscribe_reload();

    assert!(controller.submit_file(workbook(), &api).await);
    let result = controller.validation().unwrap();
    assert_eq!(result.valid_count, 2);
    assert_eq!(result.invalid_count, 1);
    assert_eq!(controller.selected_sheets(), ["Enero", "Febrero"]);

    assert!(controller.load_preview(&api).await);
    let stage = controller.preview().unwrap();
    assert!(stage.show_preview());
    assert_eq!(stage.preview_data().len(), 2);
    assert_eq!(stage.active_tab(), Some("Enero"));
    assert_eq!(stage.preview_for_sheet("Febrero").unwrap().total_rows, 12);

    let started = tokio::time::Instant::now();
    let imported = controller.import(&api).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(config.import_settle_ms));

    assert_eq!(imported.imported_count, 24);
    assert_eq!(imported.sheets_processed.count(), 2);
    assert_eq!(controller.step(), Step::View);
    assert!(controller.show_employees());
    assert_eq!(
        controller.preview().unwrap().import_message(),
        Some(IMPORT_CONFIRMATION)
    );
    assert!(reload.has_changed().unwrap());
    assert_eq!(*reload.borrow_and_update(), 1);
}

#[tokio::test]
async fn test_import_accepts_status_200() {
    let api = backend_with_two_valid_sheets();
    *api.import_response.lock().unwrap() =
        Some(ApiEnvelope::new(200, "ok", Some(import_result(&["Enero"]))));
    let mut controller = WorkflowController::new(fast_config());
    assert!(controller.submit_file(workbook(), &api).await);

    assert!(controller.import(&api).await.is_some());
    assert_eq!(controller.step(), Step::View);
}

#[tokio::test]
async fn test_import_failure_stays_on_preview() {
    let api = backend_with_two_valid_sheets();
    *api.import_response.lock().unwrap() =
        Some(ApiEnvelope::new(500, "Error de base de datos", None));
    let mut controller = WorkflowController::new(fast_config());
    assert!(controller.submit_file(workbook(), &api).await);

    assert!(controller.import(&api).await.is_none());
    let stage = controller.preview().unwrap();
    assert_eq!(stage.import_error(), Some("Error de base de datos"));
    assert!(!stage.is_importing());
    assert_eq!(controller.step(), Step::Preview);
    assert_eq!(controller.reload_generation(), 0);
}

#[tokio::test]
async fn test_dashboard_reloads_once_per_import() {
    let api = backend_with_two_valid_sheets();
    *api.employees.lock().unwrap() = common::staff(25);
    *api.statistics_response.lock().unwrap() =
        Some(ApiEnvelope::new(200, "", Some(RawStatistics::default())));

    let config = fast_config();
    let mut controller = WorkflowController::new(config.clone());
    let mut dashboard = Dashboard::new(&config, controller.subscribe_reload());

    dashboard.reload_all(&api).await;
    assert!(!dashboard.needs_reload());
    assert_eq!(api.calls_to("list_employees"), 1);

    assert!(controller.submit_file(workbook(), &api).await);
    controller.import(&api).await;
    assert!(dashboard.needs_reload());

    assert!(dashboard.refresh_if_signalled(&api).await);
    assert!(!dashboard.refresh_if_signalled(&api).await);
    assert_eq!(api.calls_to("list_employees"), 2);
    assert_eq!(api.calls_to("statistics"), 2);
    assert_eq!(dashboard.table().filtered().len(), 25);
    assert!(dashboard.statistics().statistics().is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// STALE RESPONSES AND RESET
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_superseded_validation_is_discarded() {
    let mut stage = UploadStage::new(&fast_config());
    assert!(stage.handle_file(workbook()));

    let (first, _) = stage.begin_validation().unwrap();
    let (second, _) = stage.begin_validation().unwrap();

    let late = Ok(ApiEnvelope::new(200, "", Some(validation(&["Viejo"], &[]))));
    assert!(stage.complete_validation(first, late).is_none());
    assert!(stage.is_validating());

    let fresh = Ok(ApiEnvelope::new(200, "", Some(validation(&["Nuevo"], &[]))));
    let done = stage.complete_validation(second, fresh).unwrap();
    assert_eq!(done.validation.valid_names(), vec!["Nuevo".to_string()]);
    assert!(!stage.is_validating());
}

#[test]
fn test_superseded_preview_is_discarded() {
    let mut stage = PreviewStage::new(
        validation(&["Enero", "Febrero"], &[]),
        Some(workbook()),
        &fast_config(),
    );
    let first = stage.begin_preview().unwrap();
    let second = stage.begin_preview().unwrap();

    assert!(stage.complete_preview(
        second.ticket,
        Ok(ApiEnvelope::new(200, "", Some(preview_for(&["Febrero"]))))
    ));
    assert!(!stage.complete_preview(
        first.ticket,
        Ok(ApiEnvelope::new(200, "", Some(preview_for(&["Enero"]))))
    ));
    assert_eq!(stage.preview_data().len(), 1);
    assert_eq!(stage.preview_data()[0].sheet_name, "Febrero");
    assert_eq!(stage.active_tab(), Some("Febrero"));
}

#[test]
fn test_reset_drops_in_flight_validation() {
    let mut controller = WorkflowController::new(fast_config());
    assert!(controller.upload_mut().handle_file(workbook()));
    let (ticket, _) = controller.upload_mut().begin_validation().unwrap();

    controller.reset_upload();
    let late = Ok(ApiEnvelope::new(200, "", Some(validation(&["Enero"], &[]))));
    assert!(controller
        .upload_mut()
        .complete_validation(ticket, late)
        .is_none());
    assert!(controller.upload().selected_file().is_none());
    assert_eq!(controller.step(), Step::Upload);
}

#[tokio::test]
async fn test_back_to_upload_from_preview() {
    let api = backend_with_two_valid_sheets();
    let mut controller = WorkflowController::new(fast_config());
    assert!(controller.submit_file(workbook(), &api).await);

    controller.back_to_upload();
    assert_eq!(controller.step(), Step::Upload);
    assert!(controller.validation().is_none());
    assert!(controller.preview().is_none());
    assert!(controller.upload().file_name().is_none());
}
