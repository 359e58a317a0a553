use axum::extract::State;
use axum::response::Html;

use crate::errors::{ApiError, ResultExt};
use crate::server::app::AppState;

pub async fn show_form(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let page = state.pages.index().during("Error rendering page")?;
    Ok(Html(page))
}
