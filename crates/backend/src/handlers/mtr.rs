use axum::extract::{Multipart, State};
use axum::Json;
use contracts::usecases::u501_process_mtr::request::ProcessMtrRequest;
use contracts::usecases::u501_process_mtr::response::MtrBatchReport;

use super::{bad_request, ApiError};
use crate::shared::data::file_storage;
use crate::state::AppState;
use crate::usecases::u501_process_mtr;

/// POST /api/mtr/process
///
/// Без `file_id` сверяется последний загруженный файл `GST_MTR_B2*`.
pub async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessMtrRequest>,
) -> Result<Json<MtrBatchReport>, ApiError> {
    let _guard = state.locks.lock(&request.settings_code).await;
    u501_process_mtr::process_mtr_file(&state.db, &request, None)
        .await
        .map(Json)
        .map_err(|e| bad_request(format!("{:#}", e)))
}

/// POST /api/mtr/upload
///
/// Поля формы: `file` (CSV или zip), `settings_code`, `submit`.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MtrBatchReport>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut settings_code = String::new();
    let mut submit = false;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or("mtr_upload.csv")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_request)?;
                file = Some((file_name, bytes.to_vec()));
            }
            "settings_code" => settings_code = field.text().await.map_err(bad_request)?,
            "submit" => {
                let value = field.text().await.map_err(bad_request)?;
                submit = matches!(value.trim(), "1" | "true" | "on");
            }
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    let (file_name, content) = file.ok_or_else(|| bad_request("Form field 'file' is required"))?;
    if content.is_empty() {
        return Err(bad_request("Uploaded file is empty"));
    }

    let file_id = file_storage::save_file(&state.db, &file_name, content, None)
        .await
        .map_err(bad_request)?;
    tracing::info!("Uploaded MTR file '{}' as {}", file_name, file_id);

    let request = ProcessMtrRequest {
        settings_code,
        file_id: Some(file_id),
        submit,
    };
    process(State(state), Json(request)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use crate::usecases::fixtures::SETTINGS_CODE;
    use axum::http::StatusCode;

    const MTR: &str = "Invoice Date,Transaction Type,Order Id,Shipment Item Id,Quantity,Asin,Hsn/sac,Sku,Ship To City,Ship To State,Ship To Country,Ship To Postal Code,Invoice Amount,Tax Exclusive Gross,Cgst Rate,Sgst Rate,Igst Rate,Cgst Tax,Sgst Tax,Igst Tax,Warehouse Id\n\
        2024-04-02 10:11:12,Shipment,408-7000009,S1,1,B0ASIN1,8471,SKU1,Pune,Maharashtra,IN,411001,105,100,0.025,0.025,,2.5,2.5,0,BOM7\n";

    #[tokio::test]
    async fn test_process_latest_mtr_file() {
        let state = test_state().await;
        file_storage::save_file(&state.db, "GST_MTR_B2C_CUSTOM_2024.csv", MTR.as_bytes().to_vec(), None)
            .await
            .unwrap();

        let Json(report) = process(
            State(state.clone()),
            Json(ProcessMtrRequest {
                settings_code: SETTINGS_CODE.into(),
                file_id: None,
                submit: false,
            }),
        )
        .await
        .unwrap();
        assert_eq!(report.counters.created, 1);
        assert_eq!(report.file_name.as_deref(), Some("GST_MTR_B2C_CUSTOM_2024.csv"));

        // Повторная сверка того же файла не создаёт дубликатов
        let Json(again) = process(
            State(state),
            Json(ProcessMtrRequest {
                settings_code: SETTINGS_CODE.into(),
                file_id: None,
                submit: false,
            }),
        )
        .await
        .unwrap();
        assert_eq!(again.counters.created, 0);
        assert_eq!(again.counters.skipped, 1);
    }

    #[tokio::test]
    async fn test_process_without_files() {
        let state = test_state().await;
        let (status, Json(body)) = process(
            State(state),
            Json(ProcessMtrRequest {
                settings_code: SETTINGS_CODE.into(),
                file_id: None,
                submit: false,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("GST_MTR_B2"));
    }
}
