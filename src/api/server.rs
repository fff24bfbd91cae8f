// Sync trigger server using actix-web

use crate::api::handlers::AppState;
use crate::api::{auth, middleware, routes};
use crate::CatalogSynchronizer;
use actix_web::{middleware::Condition, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;

use crate::util::env::{env_opt, env_parse};

/// Bearer guard that is only active when a secret is configured.
pub fn auth_guard(secret: Option<&str>) -> Condition<auth::Auth> {
    Condition::new(
        secret.is_some(),
        auth::Auth::new(secret.unwrap_or_default().to_string()),
    )
}

pub struct SyncServer {
    pub host: String,
    pub port: u16,
    /// When set, every route except `/health` requires `Authorization: Bearer <secret>`.
    pub api_secret: Option<String>,
}

impl SyncServer {
    pub fn from_env() -> Self {
        crate::util::env::init_env();

        Self {
            host: env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env_parse("API_PORT", 8080u16),
            api_secret: env_opt("API_SECRET"),
        }
    }

    pub async fn run(self, synchronizer: CatalogSynchronizer) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            auth = self.api_secret.is_some(),
            "starting sync server"
        );

        let state = web::Data::new(AppState::new(Arc::new(synchronizer)));
        let secret = self.api_secret.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();

            App::new()
                .app_data(state.clone())
                .wrap(auth_guard(secret.as_deref()))
                .wrap(compress)
                .wrap(logger)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("failed to bind to {bind_addr}"))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, offline_synchronizer, ScriptedCatalog};
    use actix_web::{http::StatusCode, test};

    fn state() -> web::Data<AppState> {
        let catalog = ScriptedCatalog::new(vec![item("A", "a")]);
        web::Data::new(AppState::new(Arc::new(offline_synchronizer(catalog))))
    }

    #[actix_web::test]
    async fn populate_requires_bearer_when_secret_set() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .wrap(auth_guard(Some("s3cret")))
                .configure(routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/games/populate").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/games/populate")
            .insert_header(("Authorization", "Bearer wrong"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/games/populate")
            .insert_header(("Authorization", "Bearer s3cret"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn populate_is_open_without_secret() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .wrap(auth_guard(None))
                .configure(routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/games/populate").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
