//! 布局树 → 图片。
//!
//! 渲染管线：工具类解析（`style`）→ flex 排版（`flex`）→ 远程图片内嵌（`images`）
//! → SVG 序列化（`svg`）→ resvg 栅格化并编码 PNG（`raster`）。

mod flex;
mod images;
mod raster;
mod style;
mod svg;

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use thiserror::Error;

use super::fonts::FontAsset;
use super::layout::{FONT_FAMILY, LayoutNode};

pub use flex::{Paint, Rect, TextStyle};
pub use style::Color;
pub use images::data_uri;
pub use raster::prewarm_system_fonts;

/// 输出画布尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

pub const OG_CANVAS: Canvas = Canvas {
    width: 1200,
    height: 600,
};

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::Canvas(format!(
                "画布尺寸必须为正数: {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    /// 未知取值按 PNG 处理
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("svg") => OutputFormat::Svg,
            _ => OutputFormat::Png,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub root: LayoutNode,
    pub fonts: Vec<FontAsset>,
    pub canvas: Canvas,
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("画布参数无效: {0}")]
    Canvas(String),

    #[error("头像获取失败: {0}")]
    Avatar(String),

    #[error("字体不可用: {0}")]
    Font(String),

    #[error("SVG 生成失败: {0}")]
    Svg(String),

    #[error("栅格化失败: {0}")]
    Raster(String),

    #[error("图片编码失败: {0}")]
    Encode(String),

    #[error("渲染任务异常: {0}")]
    Task(String),
}

/// 图片渲染器：接收布局树与字体，产出编码后的图片
pub trait Renderer: Send + Sync {
    fn render(&self, request: RenderRequest) -> BoxFuture<'_, Result<RenderedImage, RenderError>>;
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// 栅格化优先速度（牺牲抗锯齿与压缩率）
    pub optimize_speed: bool,
    /// 是否把系统字体加入回退字体库
    pub load_system_fonts: bool,
    /// 远程图片下载超时
    pub avatar_timeout: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            optimize_speed: false,
            load_system_fonts: true,
            avatar_timeout: Duration::from_secs(10),
        }
    }
}

/// 基于 resvg 的渲染器
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    options: RenderOptions,
    client: reqwest::Client,
}

impl SvgRenderer {
    pub fn new(options: RenderOptions) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(options.avatar_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { options, client })
    }

    async fn render_inner(&self, request: RenderRequest) -> Result<RenderedImage, RenderError> {
        let t0 = std::time::Instant::now();
        let RenderRequest {
            root,
            fonts,
            canvas,
            format,
        } = request;
        let canvas = Canvas::new(canvas.width, canvas.height)?;

        let paints = flex::compute(&root, canvas, &TextStyle::new(FONT_FAMILY));
        let t_layout = t0.elapsed();

        let bytes = match format {
            // SVG 输出保留原始图片地址，由查看方自行加载
            OutputFormat::Svg => Bytes::from(svg::write_svg(&paints, canvas, &HashMap::new())?),
            OutputFormat::Png => {
                let hrefs = images::inline_images(&self.client, &paints).await?;
                let svg_data = svg::write_svg(&paints, canvas, &hrefs)?;
                let options = self.options.clone();
                let png = tokio::task::spawn_blocking(move || {
                    raster::render_png(&svg_data, &fonts, &options)
                })
                .await
                .map_err(|e| RenderError::Task(e.to_string()))??;
                Bytes::from(png)
            }
        };

        tracing::info!(
            "预览图渲染完成: 格式={:?}, 大小={}B, 排版={:?}, 总计={:?}",
            format,
            bytes.len(),
            t_layout,
            t0.elapsed()
        );
        Ok(RenderedImage {
            bytes,
            content_type: format.content_type(),
            width: canvas.width,
            height: canvas.height,
        })
    }
}

impl Renderer for SvgRenderer {
    fn render(&self, request: RenderRequest) -> BoxFuture<'_, Result<RenderedImage, RenderError>> {
        Box::pin(self.render_inner(request))
    }
}
