//! 文章 OG 预览图：查询参数 → 布局树 → 图片。

pub mod author;
pub mod fonts;
pub mod handler;
pub mod layout;
pub mod post;
pub mod render;

pub use fonts::{FontAsset, FontLoadError, FontLoader, resolve_fonts_dir};
pub use handler::create_og_router;
pub use layout::LayoutNode;
pub use post::{OgQuery, PostMeta};
pub use render::{
    Canvas, OG_CANVAS, OutputFormat, RenderError, RenderOptions, RenderRequest, RenderedImage,
    Renderer, SvgRenderer,
};
