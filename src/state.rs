use std::sync::Arc;

use axum::http::HeaderValue;

use crate::features::og::{FontLoader, Renderer};

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 预览图字体资源（每个请求重新读取）
    pub fonts: Arc<FontLoader>,
    /// 图片渲染器（测试中可替换为桩实现）
    pub renderer: Arc<dyn Renderer>,
    /// 成功响应附带的 Cache-Control
    pub cache_control: Option<HeaderValue>,
}

impl AppState {
    pub fn new(fonts: FontLoader, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            fonts: Arc::new(fonts),
            renderer,
            cache_control: None,
        }
    }

    /// 设置 Cache-Control；空串表示不下发，非法值告警后忽略
    pub fn with_cache_control(mut self, value: &str) -> Self {
        let value = value.trim();
        self.cache_control = if value.is_empty() {
            None
        } else {
            match HeaderValue::from_str(value) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Cache-Control 配置非法，已忽略: {:?} ({})", value, e);
                    None
                }
            }
        };
        self
    }
}
