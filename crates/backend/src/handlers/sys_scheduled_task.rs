use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::common::AggregateId;
use contracts::system::tasks::aggregate::ScheduledTaskId;
use contracts::system::tasks::request::{
    CreateScheduledTaskDto, ToggleScheduledTaskEnabledDto, UpdateScheduledTaskDto,
};
use contracts::system::tasks::response::{ScheduledTaskResponse, TaskRunLogResponse};

use super::{api_error, bad_request, ApiError};
use crate::state::AppState;
use crate::system::tasks::service;

fn task_id(id: &str) -> Result<ScheduledTaskId, StatusCode> {
    ScheduledTaskId::from_string(id).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn load(state: &AppState, id: &ScheduledTaskId) -> Result<Json<ScheduledTaskResponse>, ApiError> {
    match service::get_by_id(&state.db, id).await {
        Ok(Some(task)) => Ok(Json(task.into())),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Scheduled task not found")),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}

/// GET /api/sys/scheduled_tasks
pub async fn list_scheduled_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduledTaskResponse>>, StatusCode> {
    match service::list_all(&state.db).await {
        Ok(tasks) => Ok(Json(tasks.into_iter().map(Into::into).collect())),
        Err(e) => {
            tracing::error!("Failed to list scheduled tasks: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/sys/scheduled_tasks/:id
pub async fn get_scheduled_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScheduledTaskResponse>, ApiError> {
    let task_id = task_id(&id).map_err(|s| api_error(s, "Invalid ID"))?;
    load(&state, &task_id).await
}

/// POST /api/sys/scheduled_tasks
pub async fn create_scheduled_task(
    State(state): State<AppState>,
    Json(dto): Json<CreateScheduledTaskDto>,
) -> Result<Json<ScheduledTaskResponse>, ApiError> {
    match service::create(&state.db, dto).await {
        Ok(task_id) => load(&state, &task_id).await,
        Err(e) => {
            tracing::error!("Failed to create scheduled task: {}", e);
            Err(bad_request(e))
        }
    }
}

/// PUT /api/sys/scheduled_tasks/:id
pub async fn update_scheduled_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(dto): Json<UpdateScheduledTaskDto>,
) -> Result<Json<ScheduledTaskResponse>, ApiError> {
    let task_id = task_id(&id).map_err(|s| api_error(s, "Invalid ID"))?;
    match service::update(&state.db, &task_id, dto).await {
        Ok(_) => load(&state, &task_id).await,
        Err(e) => {
            tracing::error!("Failed to update scheduled task {}: {}", id, e);
            Err(bad_request(e))
        }
    }
}

/// DELETE /api/sys/scheduled_tasks/:id
pub async fn delete_scheduled_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let task_id = task_id(&id)?;
    match service::delete(&state.db, &task_id).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            tracing::error!("Failed to delete scheduled task {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/sys/scheduled_tasks/:id/toggle_enabled
pub async fn toggle_scheduled_task_enabled(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(dto): Json<ToggleScheduledTaskEnabledDto>,
) -> Result<Json<ScheduledTaskResponse>, ApiError> {
    let task_id = task_id(&id).map_err(|s| api_error(s, "Invalid ID"))?;
    match service::toggle_enabled(&state.db, &task_id, dto.is_enabled).await {
        Ok(_) => load(&state, &task_id).await,
        Err(e) => {
            tracing::error!("Failed to toggle scheduled task {}: {}", id, e);
            Err(api_error(StatusCode::NOT_FOUND, e))
        }
    }
}

/// GET /api/sys/scheduled_tasks/:id/log/:session_id
pub async fn get_task_log(
    State(state): State<AppState>,
    Path((_task_id, session_id)): Path<(String, String)>,
) -> Result<Json<TaskRunLogResponse>, StatusCode> {
    match state.task_logger.read_log(&session_id) {
        Ok(content) => Ok(Json(TaskRunLogResponse {
            session_id,
            content,
        })),
        Err(e) => {
            tracing::error!("Failed to read log for session {}: {}", session_id, e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    fn create_dto(cron: &str) -> CreateScheduledTaskDto {
        CreateScheduledTaskDto {
            code: "amazon_poll_fast".into(),
            description: "Poll reports every minute".into(),
            task_type: "poll_amazon_reports".into(),
            schedule_cron: Some(cron.into()),
            is_enabled: true,
            config_json: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_toggle_and_read_log() {
        let state = test_state().await;

        let Json(task) = create_scheduled_task(State(state.clone()), Json(create_dto("0 * * * * *")))
            .await
            .unwrap();
        assert!(task.is_enabled);

        let Json(task) = toggle_scheduled_task_enabled(
            State(state.clone()),
            Path(task.id.clone()),
            Json(ToggleScheduledTaskEnabledDto { is_enabled: false }),
        )
        .await
        .unwrap();
        assert!(!task.is_enabled);

        let Json(all) = list_scheduled_tasks(State(state.clone())).await.unwrap();
        assert!(all.iter().any(|t| t.code == "amazon_poll_fast"));

        assert_eq!(
            get_task_log(State(state), Path((task.id, "../../etc/passwd".into())))
                .await
                .unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_cron() {
        let state = test_state().await;
        let (status, _) = create_scheduled_task(State(state), Json(create_dto("every minute")))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
