use axum::body::Bytes;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::AppConfig;

/// 聚合的应用共享状态
///
/// 配置加载一次后在此显式传递，处理管线不依赖全局单例。
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
    /// 渲染结果缓存（按图片字节大小加权；仅缓存无 Logo 的确定性输出）
    pub render_cache: Cache<String, Bytes>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let render = &config.render;
        let render_cache: Cache<String, Bytes> = Cache::builder()
            .weigher(|_k, v: &Bytes| v.len() as u32)
            .max_capacity(render.cache_max_bytes)
            .time_to_live(Duration::from_secs(render.cache_ttl_secs))
            .time_to_idle(Duration::from_secs(render.cache_tti_secs))
            .build();

        let permits = {
            let m = render.max_parallel as usize;
            if m == 0 { num_cpus::get() } else { m }
        };

        Self {
            config: Arc::new(config),
            render_semaphore: Arc::new(Semaphore::new(permits)),
            render_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_sizes_semaphore_from_config() {
        let mut config = AppConfig::default();
        config.render.max_parallel = 3;
        let state = AppState::new(config);
        assert_eq!(state.render_semaphore.available_permits(), 3);
    }
}
