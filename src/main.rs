use std::sync::Arc;

use axum::{Router, routing::get};
use og_backend::features::health::{self, health_check};
use og_backend::features::og::{
    self, FontLoader, SvgRenderer, create_og_router, resolve_fonts_dir,
};
use og_backend::request_id::request_id_middleware;
use og_backend::startup::run_startup_checks;
use og_backend::state::AppState;
use og_backend::{ShutdownManager, config::AppConfig, error};
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 只压缩文本类响应（SVG/JSON）；PNG 本身已压缩
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}


#[derive(OpenApi)]
#[openapi(
    paths(og::handler::render_og, health::handler::health_check),
    components(schemas(error::ErrorBody, health::HealthResponse)),
    tags(
        (name = "OG", description = "Open Graph preview images"),
        (name = "Health", description = "Health APIs"),
    ),
    info(
        title = "OG Backend API",
        version = "0.1.0",
        description = "Open Graph preview image service (Axum)"
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "og_backend=info,tower_http=info".into()),
        )
        .init();

    let shutdown_manager = ShutdownManager::new();

    if let Err(e) = AppConfig::init_global() {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();

    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let render_options = config.image.render_options();
    let fonts_dir = resolve_fonts_dir();
    tracing::info!("字体目录: {}", fonts_dir.display());
    let fonts = FontLoader::from_dir(&fonts_dir);
    run_startup_checks(&fonts, &render_options).await;

    let renderer = match SvgRenderer::new(render_options) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!("HTTP Client 初始化失败: {}", e);
            std::process::exit(1);
        }
    };
    let app_state = AppState::new(fonts, renderer).with_cache_control(&config.image.cache_control);

    // Routes
    let api_router = Router::<AppState>::new().merge(create_og_router());
    let prefix = config.api.prefix.trim_end_matches('/');
    let app = Router::<AppState>::new().route("/health", get(health_check));
    let app = if prefix.is_empty() {
        app.merge(api_router)
    } else {
        app.nest(prefix, api_router)
    };
    let app = app
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new().compress_when(compression_predicate()));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("OG image: http://{}{}", addr, config.og_path());

    let shutdown_timeout = config.shutdown.timeout_duration();
    let signal = shutdown_manager.clone();
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let reason = signal.wait_for_shutdown().await;
                tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
            })
            .await
    };
    // 收到信号后最多等待 timeout_secs 让在途请求完成
    let drain_deadline = async {
        shutdown_manager.wait_for_shutdown().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("服务器运行错误: {}", e);
                std::process::exit(1);
            }
            tracing::info!("服务器已优雅关闭");
        }
        _ = drain_deadline => {
            tracing::warn!(
                "优雅退出超时（{}秒），强制退出",
                config.shutdown.timeout_secs
            );
        }
    }
}
