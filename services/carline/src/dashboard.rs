//! Staff board: JSON API endpoints and a plain HTML page

use std::net::SocketAddr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::board::{Board, NewDismissal};
use crate::workflow::StaffAction;
use crate::CarlineError;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub board: Board,
}

/// Build the dashboard axum router
pub fn build_router(board: Board) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/lane", get(lane_handler))
        .route("/api/lane/cones", put(cones_handler))
        .route("/api/queues", get(queues_handler))
        .route("/api/summary", get(summary_handler))
        .route(
            "/api/dismissals",
            get(dismissals_handler).post(create_handler),
        )
        .route("/api/dismissals/{id}/{action}", post(action_handler))
        .route("/health", get(health_handler))
        .with_state(DashboardState { board })
}

/// Bind the dashboard listener on all interfaces
pub async fn bind(port: u16) -> crate::Result<tokio::net::TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CarlineError::Dashboard(format!("failed to bind {}: {}", addr, e)))
}

/// Error body: always the generic message
struct ApiError(CarlineError);

impl From<CarlineError> for ApiError {
    fn from(e: CarlineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CarlineError::NotFound(_) => StatusCode::NOT_FOUND,
            CarlineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.user_message() });
        (status, Json(body)).into_response()
    }
}

async fn lane_handler(State(dashboard): State<DashboardState>) -> Response {
    match dashboard.board.lane().await {
        Some(lane) => Json(lane).into_response(),
        None => ApiError(CarlineError::NotFound("lane not loaded".to_string())).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ConeCountRequest {
    cone_count: u32,
}

async fn cones_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<ConeCountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let lane = dashboard.board.set_cone_count(request.cone_count).await?;
    Ok(Json(lane))
}

async fn queues_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.board.queues().await)
}

async fn summary_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.board.summary().await)
}

async fn dismissals_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let dismissals = dashboard.board.state().read().await.visible_dismissals();
    Json(dismissals)
}

async fn create_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<NewDismissal>,
) -> Result<impl IntoResponse, ApiError> {
    let dismissal = dashboard.board.create_dismissal(request).await?;
    Ok((StatusCode::CREATED, Json(dismissal)))
}

async fn action_handler(
    State(dashboard): State<DashboardState>,
    Path((id, action)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let action = match action.as_str() {
        "send" => StaffAction::Send,
        "complete" => StaffAction::Complete,
        "dismiss" => StaffAction::Dismiss,
        "archive" => StaffAction::Archive,
        other => {
            return Err(ApiError(CarlineError::NotFound(format!(
                "action {}",
                other
            ))))
        }
    };
    let dismissal = dashboard.board.act(&id, action).await?;
    Ok(Json(dismissal))
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.board.state().read().await;
    let view = state.queue_view();
    let summary = state.summary();

    let title = match &state.lane {
        Some(lane) => format!("Dismissal - {}", lane.date),
        None => "Dismissal".to_string(),
    };

    let error_banner = match &state.last_error {
        Some(message) => format!(
            r#"<p style="padding: 0.5rem; color: #721c24; background-color: #f8d7da;">{}</p>"#,
            message
        ),
        None => String::new(),
    };

    let summary_line: String = summary
        .counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(status, count)| format!("{}: {}", status, count))
        .collect::<Vec<_>>()
        .join(" &middot; ");

    let cone_sections: String = view
        .cones
        .iter()
        .map(|queue| {
            let rows: String = queue
                .entries
                .iter()
                .map(|entry| {
                    let color = if entry.status.is_terminal() {
                        "#6c757d"
                    } else {
                        "inherit"
                    };
                    format!(
                        r#"<tr style="border-bottom: 1px solid #dee2e6; color: {};">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                </tr>"#,
                        color,
                        entry.car_number,
                        escape_html(&entry.students.join(", ")),
                        entry.status
                    )
                })
                .collect();
            format!(
                r#"<section>
        <h2>Cone {}</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Car</th>
                    <th style="padding: 0.5rem; text-align: left;">Students</th>
                    <th style="padding: 0.5rem; text-align: left;">Status</th>
                </tr>
            </thead>
            <tbody>{}</tbody>
        </table>
    </section>"#,
                queue.cone, rows
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta http-equiv="refresh" content="5">
    <title>{title}</title>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>{title}</h1>
    {error_banner}
    <p>{summary_line}</p>
    {cone_sections}
</body>
</html>"#,
        title = title,
        error_banner = error_banner,
        summary_line = summary_line,
        cone_sections = cone_sections,
    );

    Html(html)
}

// Student names come from the store and may hold markup.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
