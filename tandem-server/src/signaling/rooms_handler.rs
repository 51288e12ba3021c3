use crate::signaling::RelayService;
use axum::Json;
use axum::extract::State;
use tandem_core::RoomsReport;

/// Read-only listing of live rooms and their member counts.
pub async fn rooms_handler(State(service): State<RelayService>) -> Json<RoomsReport> {
    Json(service.report())
}
