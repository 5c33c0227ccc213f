use utoipa::OpenApi;
use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};

/// 为 Swagger UI 提供正确的“业务接口前缀”Servers 配置。
///
/// - 业务接口默认前缀为 `/api`（对应 `config.api.prefix` / `APP_API_PREFIX`）。
/// - `/health` 不带前缀，因此额外提供 `/` 作为备用 server 以便在 Swagger UI 中切换测试。
struct ApiServers;

impl utoipa::Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some(
                        "业务接口前缀：对应 config.api.prefix（可通过 APP_API_PREFIX 覆盖）",
                    )),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（用于 /health 等不带前缀接口）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::qr::handler::generate,
        crate::features::qr::handler::generate_svg,
        crate::features::qr::handler::preview,
        crate::features::qr::handler::batch_generate,
    ),
    modifiers(&ApiServers),
    tags(
        (
            name = "QR",
            description = "二维码生成：按类型校验并规范化载荷，渲染 PNG/SVG，支持 Logo 合成与批量生成。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "QR Generator API",
        version = env!("CARGO_PKG_VERSION"),
        description = "二维码生成服务 API（Axum + utoipa）。注意：除 /health 外，其余业务接口实际挂载在 `config.api.prefix`（默认 /api）下，OpenAPI 的 paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;
