use crate::actions::{Action, ActionError, Dashboard};
use crate::state::FormField;
use crate::view::{render_text, DashboardView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use evm_interface::{ChainClient, Receipt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub value: String,
}

/// Outcome of a connect or action request, with the view it left behind
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub view: DashboardView,
}

pub fn create_router<C: ChainClient + 'static>(dashboard: Dashboard<C>) -> Router {
    Router::new()
        .route("/", get(get_text::<C>))
        .route("/view", get(get_view::<C>))
        .route("/connect", post(connect::<C>))
        .route("/forms/{field}", put(set_field::<C>))
        .route("/actions/{action}", post(run_action::<C>))
        .route("/notifications/{id}/dismiss", post(dismiss::<C>))
        .layer(CorsLayer::permissive())
        .with_state(dashboard)
}

fn error_status(error: &ActionError) -> StatusCode {
    match error {
        ActionError::Skipped(_) | ActionError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ActionError::Chain(_) | ActionError::Repay(_) => StatusCode::BAD_GATEWAY,
    }
}

async fn get_text<C: ChainClient + 'static>(State(dashboard): State<Dashboard<C>>) -> String {
    render_text(&dashboard.view())
}

async fn get_view<C: ChainClient + 'static>(
    State(dashboard): State<Dashboard<C>>,
) -> Json<DashboardView> {
    Json(dashboard.view())
}

async fn connect<C: ChainClient + 'static>(
    State(dashboard): State<Dashboard<C>>,
) -> (StatusCode, Json<ActionResponse>) {
    match dashboard.connect().await {
        Ok(connection) => {
            info!("Connected {} on {}", connection.account, connection.network.name);
            let response =
                ActionResponse { ok: true, receipt: None, error: None, view: dashboard.view() };
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            let response = ActionResponse {
                ok: false,
                receipt: None,
                error: Some(e.to_string()),
                view: dashboard.view(),
            };
            (error_status(&e), Json(response))
        }
    }
}

async fn set_field<C: ChainClient + 'static>(
    State(dashboard): State<Dashboard<C>>,
    Path(field): Path<FormField>,
    Json(update): Json<FieldUpdate>,
) -> Json<DashboardView> {
    debug!("Setting {} field", field);
    dashboard.set_field(field, update.value);
    Json(dashboard.view())
}

async fn run_action<C: ChainClient + 'static>(
    State(dashboard): State<Dashboard<C>>,
    Path(action): Path<Action>,
) -> (StatusCode, Json<ActionResponse>) {
    match dashboard.run(action).await {
        Ok(receipt) => {
            let response = ActionResponse {
                ok: true,
                receipt: Some(receipt),
                error: None,
                view: dashboard.view(),
            };
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            let response = ActionResponse {
                ok: false,
                receipt: None,
                error: Some(e.to_string()),
                view: dashboard.view(),
            };
            (error_status(&e), Json(response))
        }
    }
}

async fn dismiss<C: ChainClient + 'static>(
    State(dashboard): State<Dashboard<C>>,
    Path(id): Path<u64>,
) -> StatusCode {
    if dashboard.dismiss_notification(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
