use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 前端静态资源目录（不存在时仅提供 API）
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "./public".to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 日志格式
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 路由前缀
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// 是否启用 CORS
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    pub allowed_origins: Vec<String>,
    /// 是否允许携带凭证（Cookie/Authorization）
    pub allow_credentials: bool,
    /// 预检缓存时间（秒）
    pub max_age_secs: Option<u64>,
}

/// 输入上限配置
///
/// 把原本散落在各处的魔法数字集中为显式配置，由请求入口层统一执行。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Logo 上传字节上限（默认 5 MiB）
    pub max_logo_bytes: usize,
    /// 批量生成单次条数上限
    pub max_batch_items: usize,
    /// 文本型载荷的字符数上限
    pub max_text_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_logo_bytes: 5 * 1024 * 1024,
            max_batch_items: 50,
            max_text_chars: 2000,
        }
    }
}

/// 渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// 是否启用渲染结果缓存（载荷与选项确定时输出确定，可安全复用）
    pub cache_enabled: bool,
    /// 缓存最大容量（字节），按图片字节大小加权
    pub cache_max_bytes: u64,
    /// 缓存 TTL（秒）
    pub cache_ttl_secs: u64,
    /// 缓存 TTI（秒）
    pub cache_tti_secs: u64,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    pub max_parallel: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_max_bytes: 64 * 1024 * 1024,
            cache_ttl_secs: 300,
            cache_tti_secs: 60,
            max_parallel: 0,
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl ShutdownConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 应用配置
///
/// 在 `main` 中加载一次后经由 `AppState` 显式传递，处理管线不读取任何全局状态。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    /// CORS 配置
    pub cors: CorsConfig,
    /// 输入上限配置
    pub limits: LimitsConfig,
    /// 渲染配置
    pub render: RenderConfig,
    /// 优雅退出配置
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    ///
    /// 配置文件缺失时回落到内置默认值，便于零配置启动。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let builder = ConfigBuilder::builder()
            // 加载配置文件（允许缺失）
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_API_PREFIX
            .add_source(
                Environment::with_prefix("APP")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取前端静态资源目录
    pub fn static_dir(&self) -> PathBuf {
        PathBuf::from(&self.server.static_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_service_contract() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.max_logo_bytes, 5 * 1024 * 1024);
        assert_eq!(limits.max_batch_items, 50);
        assert_eq!(limits.max_text_chars, 2000);
    }

    #[test]
    fn server_addr_joins_host_and_port() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 8080;
        assert_eq!(config.server_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn config_deserializes_from_partial_toml() {
        let partial: AppConfig = toml::from_str(
            r#"
            [limits]
            max_batch_items = 10
            "#,
        )
        .expect("parse partial config");
        assert_eq!(partial.limits.max_batch_items, 10);
        // 未给出的字段取默认值
        assert_eq!(partial.limits.max_text_chars, 2000);
        assert_eq!(partial.server.port, 3000);
    }
}
