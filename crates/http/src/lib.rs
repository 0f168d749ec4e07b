//! HTTP server facade for bookshelf with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{routing::get, Router};

use bookshelf_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod router;

use router::RouterBuilder;

/// Serve every module's routes until Ctrl-C or SIGTERM
pub async fn start_server(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let app = build_router(registry, settings);

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {address}"))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new().route("/healthz", get(health_check));

    for module in registry.modules() {
        let module_name = module.name();
        tracing::info!(
            module = module_name,
            "mounting module routes under /api/{}",
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes());
        if module.mount_at_root() {
            router_builder = router_builder.merge_at_root(module_name, module.routes());
        }
    }

    router_builder = router_builder
        .with_openapi(registry)
        .with_not_found_fallback();

    // No deadline unless configured: dropping the handler would abandon an
    // in-flight statement.
    if let Some(timeout_ms) = settings.server.request_timeout_ms {
        router_builder = router_builder.with_timeout(timeout_ms);
    }

    router_builder
        .with_request_id()
        .with_cors()
        .with_tracing()
        .build()
}

async fn health_check() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct PingModule;

    #[async_trait::async_trait]
    impl bookshelf_kernel::Module for PingModule {
        fn name(&self) -> &'static str {
            "ping"
        }

        fn routes(&self) -> Router {
            Router::new().route("/ping-me", get(|| async { "pong" }))
        }
    }

    struct RootPingModule;

    #[async_trait::async_trait]
    impl bookshelf_kernel::Module for RootPingModule {
        fn name(&self) -> &'static str {
            "ping"
        }

        fn mount_at_root(&self) -> bool {
            true
        }

        fn routes(&self) -> Router {
            Router::new().route("/", get(|| async { "pong" }))
        }
    }

    #[tokio::test]
    async fn root_mounted_modules_answer_at_both_paths() {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(std::sync::Arc::new(RootPingModule));
        let app = build_router(&registry, &Settings::default());

        for uri in ["/", "/api/ping"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn module_routes_are_mounted_under_api_prefix() {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(std::sync::Arc::new(PingModule));
        let app = build_router(&registry, &Settings::default());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/ping/ping-me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/api/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
