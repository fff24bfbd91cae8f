// HTTP handlers for the sync trigger

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{CatalogSynchronizer, COMPLETION_MESSAGE};

/// Shared by all workers; the mutex keeps two populate runs from overlapping.
pub struct AppState {
    pub synchronizer: Arc<CatalogSynchronizer>,
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(synchronizer: Arc<CatalogSynchronizer>) -> Self {
        Self {
            synchronizer,
            run_lock: Mutex::new(()),
        }
    }
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

/// Run one sync to completion, then acknowledge. Item-level problems only
/// show up in the logs.
pub async fn populate(state: web::Data<AppState>) -> HttpResponse {
    tracing::info!("populate requested");
    let _guard = state.run_lock.lock().await;

    match state.synchronizer.run().await {
        Ok(report) => {
            tracing::info!(
                created = report.created,
                skipped = report.skipped,
                duplicates = report.duplicates,
                failed = report.failed,
                "populate finished"
            );
            HttpResponse::Ok().body(COMPLETION_MESSAGE)
        }
        Err(err) => {
            tracing::error!(error = %err, "populate aborted");
            HttpResponse::BadGateway().body(err.to_string())
        }
    }
}
