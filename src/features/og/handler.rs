use std::time::Instant;

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};

use super::author::AUTHOR;
use super::layout::og_document;
use super::post::{OgQuery, PostMeta};
use super::render::{OG_CANVAS, OutputFormat, RenderRequest};
use crate::{error::AppError, state::AppState};

#[utoipa::path(
    get,
    path = "/og",
    summary = "生成文章 OG 预览图",
    description = "根据文章标题、发布日期与阅读时长生成 1200x600 的社交分享预览图。所有参数均可缺省：标题缺省为 Untitled，日期无法解析时回落为 1970-01-01，阅读时长不足 1 分钟时不展示。",
    params(
        ("title" = Option<String>, Query, description = "文章标题"),
        ("date" = Option<String>, Query, description = "发布日期，如 2024-03-01 或 RFC 3339 时间"),
        ("readingTime" = Option<String>, Query, description = "阅读时长（分钟）"),
        ("format" = Option<String>, Query, description = "输出格式：png|svg，默认 png"),
    ),
    responses(
        (status = 200, description = "预览图：默认 image/png，format=svg 时为 image/svg+xml"),
        (status = 500, description = "字体加载或渲染失败", body = crate::error::ErrorBody)
    ),
    tag = "OG"
)]
pub async fn render_og(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let t0 = Instant::now();
    let query = OgQuery::from_pairs(pairs);
    let post = PostMeta::from_query(&query);
    let format = OutputFormat::from_query(query.format.as_deref());
    tracing::debug!(
        title = %post.title,
        date = %post.formatted_date(),
        reading_time = post.reading_time_minutes,
        "生成预览图"
    );

    let root = og_document(&post, &AUTHOR);

    let fonts = state.fonts.load().await.map_err(|e| {
        tracing::error!("字体加载失败: {}", e);
        AppError::from(e)
    })?;
    let t_fonts = t0.elapsed();

    let image = state
        .renderer
        .render(RenderRequest {
            root,
            fonts,
            canvas: OG_CANVAS,
            format,
        })
        .await
        .map_err(|e| {
            tracing::error!("预览图渲染失败: {}", e);
            AppError::from(e)
        })?;

    tracing::info!(
        "预览图生成完成: 大小={}B, 字体加载={}ms, 总计={}ms",
        image.bytes.len(),
        t_fonts.as_millis(),
        t0.elapsed().as_millis()
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(image.content_type),
    );
    if let Some(cache_control) = state.cache_control.clone() {
        headers.insert(header::CACHE_CONTROL, cache_control);
    }
    Ok((headers, image.bytes).into_response())
}

pub fn create_og_router() -> Router<AppState> {
    Router::new().route("/og", get(render_og))
}
