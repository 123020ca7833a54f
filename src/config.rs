use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::features::og::RenderOptions;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 路由前缀（预览图端点为 `{prefix}/og`）
    pub prefix: String,
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRenderConfig {
    /// 是否优先速度渲染（OptimizeSpeed），提升栅格化性能，可能略降画质
    #[serde(default)]
    pub optimize_speed: bool,
    /// 是否加载系统字体作为兜底（请求字体之外的字形回退）
    #[serde(default = "ImageRenderConfig::default_load_system_fonts")]
    pub load_system_fonts: bool,
    /// 拉取作者头像的超时（秒）
    #[serde(default = "ImageRenderConfig::default_avatar_timeout")]
    pub avatar_timeout_secs: u64,
    /// 成功响应附带的 Cache-Control（留空则不设置）
    #[serde(default = "ImageRenderConfig::default_cache_control")]
    pub cache_control: String,
}

impl ImageRenderConfig {
    fn default_load_system_fonts() -> bool {
        true
    }
    fn default_avatar_timeout() -> u64 {
        10
    }
    fn default_cache_control() -> String {
        "public, immutable, no-transform, max-age=31536000".to_string()
    }

    /// 转换为渲染器选项
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            optimize_speed: self.optimize_speed,
            load_system_fonts: self.load_system_fonts,
            avatar_timeout: Duration::from_secs(self.avatar_timeout_secs.max(1)),
        }
    }
}

impl Default for ImageRenderConfig {
    fn default() -> Self {
        Self {
            optimize_speed: false,
            load_system_fonts: Self::default_load_system_fonts(),
            avatar_timeout_secs: Self::default_avatar_timeout(),
            cache_control: Self::default_cache_control(),
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 收到退出信号后，等待在途请求完成的最长时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    /// 图片渲染配置
    #[serde(default)]
    pub image: ImageRenderConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 按 默认值 → config.toml（可选）→ 环境变量 的顺序加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let builder = ConfigBuilder::builder()
            .add_source(ConfigBuilder::try_from(&AppConfig::default())?)
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_SERVER__PORT、APP_IMAGE__OPTIMIZE_SPEED
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 预览图端点的完整路径
    pub fn og_path(&self) -> String {
        format!("{}/og", self.api.prefix.trim_end_matches('/'))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            api: ApiConfig {
                prefix: "/api".to_string(),
            },
            image: ImageRenderConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn og_path_joins_prefix_without_double_slash() {
        let mut cfg = AppConfig::default();
        assert_eq!(cfg.og_path(), "/api/og");
        cfg.api.prefix = "/v1/".to_string();
        assert_eq!(cfg.og_path(), "/v1/og");
    }

    #[test]
    fn default_render_options_clamp_zero_timeout() {
        let mut cfg = AppConfig::default();
        cfg.image.avatar_timeout_secs = 0;
        let opts = cfg.image.render_options();
        assert_eq!(opts.avatar_timeout.as_secs(), 1);
        assert!(opts.load_system_fonts);
    }
}
