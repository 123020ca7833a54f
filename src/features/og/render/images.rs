//! 远程图片内嵌：栅格化阶段不做网络请求，图片需先转成 data URI。

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as base64_engine};
use futures_util::future::try_join_all;

use super::RenderError;
use super::flex::Paint;

/// 下载绘制指令中引用的全部远程图片，返回 `原地址 -> data URI`。
///
/// 已是 `data:` 的地址不需要下载；同一地址只请求一次。任一图片失败则整体失败。
pub async fn inline_images(
    client: &reqwest::Client,
    paints: &[Paint],
) -> Result<HashMap<String, String>, RenderError> {
    let mut sources: Vec<&str> = paints
        .iter()
        .filter_map(|p| match p {
            Paint::Image { src, .. } if !src.starts_with("data:") => Some(src.as_str()),
            _ => None,
        })
        .collect();
    sources.sort_unstable();
    sources.dedup();

    let fetched = try_join_all(sources.into_iter().map(|src| async move {
        let uri = fetch_data_uri(client, src).await?;
        Ok::<_, RenderError>((src.to_string(), uri))
    }))
    .await?;
    Ok(fetched.into_iter().collect())
}

async fn fetch_data_uri(client: &reqwest::Client, url: &str) -> Result<String, RenderError> {
    let t0 = std::time::Instant::now();
    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| RenderError::Avatar(format!("请求图片失败 {url}: {e}")))?
        .bytes()
        .await
        .map_err(|e| RenderError::Avatar(format!("读取图片失败 {url}: {e}")))?;
    let format = image::guess_format(&bytes)
        .map_err(|e| RenderError::Avatar(format!("无法识别图片格式 {url}: {e}")))?;
    tracing::debug!(
        "图片下载完成: url={}, 大小={}B, 耗时={:?}",
        url,
        bytes.len(),
        t0.elapsed()
    );
    Ok(data_uri(format.to_mime_type(), &bytes))
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", base64_engine.encode(bytes))
}
