use std::path::PathBuf;

use crate::features::og::render::prewarm_system_fonts;
use crate::features::og::{FontLoader, RenderOptions};

/// 执行启动检查
///
/// 1. 检查预览图字体文件（仅告警，不阻断启动；缺失时请求会返回 500）
/// 2. 预热系统字体库
pub async fn run_startup_checks(fonts: &FontLoader, options: &RenderOptions) {
    tracing::info!("🔍 开始执行启动检查...");

    let missing = missing_font_files(fonts);
    if missing.is_empty() {
        tracing::info!("✅ 字体资源齐全");
    } else {
        for path in &missing {
            tracing::warn!("⚠️ 未找到字体文件: {}", path.display());
        }
    }

    if options.load_system_fonts {
        let t_prewarm = std::time::Instant::now();
        if let Err(e) = tokio::task::spawn_blocking(prewarm_system_fonts).await {
            tracing::warn!("系统字体预热任务失败: {}", e);
        } else {
            tracing::info!("系统字体预热完成: {}ms", t_prewarm.elapsed().as_millis());
        }
    }

    tracing::info!("✅ 启动检查完成");
}

/// 不存在或不是普通文件的字体路径
pub fn missing_font_files(fonts: &FontLoader) -> Vec<PathBuf> {
    fonts
        .paths()
        .into_iter()
        .filter(|p| !p.is_file())
        .map(|p| p.to_path_buf())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::og::fonts::{BLACK_FONT_FILE, REGULAR_FONT_FILE};

    #[test]
    fn reports_only_missing_fonts() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(REGULAR_FONT_FILE), b"font").expect("write");

        let missing = missing_font_files(&FontLoader::from_dir(dir.path()));
        assert_eq!(missing, vec![dir.path().join(BLACK_FONT_FILE)]);
    }

    #[tokio::test]
    async fn checks_never_fail_startup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let options = RenderOptions {
            load_system_fonts: false,
            ..RenderOptions::default()
        };
        run_startup_checks(&FontLoader::from_dir(dir.path()), &options).await;
    }
}
