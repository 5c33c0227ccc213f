use axum::{Router, routing::get};
use qrgen_backend::config::AppConfig;
use qrgen_backend::cors::build_cors_layer;
use qrgen_backend::features::health;
use qrgen_backend::features::qr::create_qr_router;
use qrgen_backend::openapi::ApiDoc;
use qrgen_backend::request_id::request_id_middleware;
use qrgen_backend::shutdown::ShutdownManager;
use qrgen_backend::state::AppState;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 压缩策略：明确排除不该压缩的响应。
    //
    // - PNG 输出本身已压缩，再压缩只浪费 CPU；SVG/JSON 文本收益明显，保持启用。
    // - 保留默认的最小大小阈值，避免压缩开销覆盖收益。
    SizeAbove::default()
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::const_new("application/octet-stream"))
}

#[cfg(test)]
mod compression_predicate_tests {
    use super::compression_predicate;
    use axum::body::Body;
    use axum::http::{Response as HttpResponse, header};
    use tower_http::compression::predicate::Predicate;

    fn should_compress_for(ct: &str) -> bool {
        // 命中 SizeAbove（默认 32B），避免因为 body 太小导致测试不稳定。
        let body_bytes = vec![b'x'; 2048];
        let resp = HttpResponse::builder()
            .header(header::CONTENT_TYPE, ct)
            .body(Body::from(body_bytes))
            .unwrap();
        compression_predicate().should_compress(&resp)
    }

    #[test]
    fn compression_predicate_disables_png_but_allows_svg() {
        assert!(!should_compress_for("image/png"));
        assert!(should_compress_for("image/svg+xml"));
    }

    #[test]
    fn compression_predicate_allows_json() {
        assert!(should_compress_for("application/json"));
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrgen_backend=info,tower_http=info".into()),
        )
        .init();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("配置加载失败: {}", e);
            std::process::exit(1);
        }
    };

    // 优雅退出管理器与信号处理器
    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let app_state = AppState::new(config.clone());

    // Routes
    let api_router = Router::<AppState>::new().nest("/qr", create_qr_router());

    let mut app = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .nest(&config.api.prefix, api_router)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // 前端静态资源（目录不存在时仅提供 API）
    let static_dir = config.static_dir();
    if static_dir.is_dir() {
        app = app.fallback_service(ServeDir::new(&static_dir));
        tracing::info!("静态资源目录: {:?}", static_dir);
    } else {
        tracing::info!("静态资源目录 {:?} 不存在，仅提供 API", static_dir);
    }

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    // request_id 注入需要先于其他层执行
    app = app.layer(axum::middleware::from_fn(request_id_middleware));

    // 响应压缩：SVG/JSON 文本启用 gzip/brotli，PNG 等图片排除
    app = app.layer(CompressionLayer::new().compress_when(compression_predicate()));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("监听地址绑定失败 {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("QR API: http://{}{}/qr", addr, config.api.prefix);

    let shutdown_timeout = config.shutdown.timeout_duration();
    let shutdown_signal = async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅退出...", reason);

        // 留出在途请求的完成窗口
        if tokio::time::timeout(shutdown_timeout, async {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        })
        .await
        .is_err()
        {
            tracing::warn!("优雅退出超时，强制退出");
        }
    };

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal.await;
        tracing::info!("开始优雅关闭HTTP服务器...");
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
