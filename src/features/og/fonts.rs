use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;

use super::layout::FONT_FAMILY;

/// 字体资源目录（相对于部署目录，即可执行文件所在目录）
pub const FONTS_DIR: &str = "assets/og";
pub const REGULAR_FONT_FILE: &str = "Inter-Regular.ttf";
pub const BLACK_FONT_FILE: &str = "Inter-Black.ttf";

/// 交给渲染器的字体资源。
///
/// 渲染时以 `family`/`weight` 注册字体，覆盖字体文件自带的名称与字重。
#[derive(Debug, Clone)]
pub struct FontAsset {
    pub family: String,
    pub data: Bytes,
    pub weight: u16,
}

/// 定位字体目录：优先可执行文件旁的 `assets/og`（部署产物），
/// 其次构建时源码目录下的 `assets/og`（`cargo run` 场景）。
pub fn resolve_fonts_dir() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(FONTS_DIR)));
    let in_manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join(FONTS_DIR);
    match beside_exe {
        Some(dir) if dir.is_dir() => dir,
        _ => in_manifest,
    }
}

#[derive(Debug, Error)]
#[error("读取字体文件失败 '{}': {source}", .path.display())]
pub struct FontLoadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl FontLoadError {
    /// 对外展示用的文件名（不暴露部署目录）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// 同一字族的常规字重与最粗字重
#[derive(Debug, Clone)]
pub struct FontLoader {
    family: String,
    regular: PathBuf,
    black: PathBuf,
}

impl Default for FontLoader {
    fn default() -> Self {
        Self::from_dir(resolve_fonts_dir())
    }
}

impl FontLoader {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            FONT_FAMILY,
            dir.join(REGULAR_FONT_FILE),
            dir.join(BLACK_FONT_FILE),
        )
    }

    pub fn new(family: impl Into<String>, regular: PathBuf, black: PathBuf) -> Self {
        Self {
            family: family.into(),
            regular,
            black,
        }
    }

    pub fn paths(&self) -> [&Path; 2] {
        [&self.regular, &self.black]
    }

    /// 并发读取两个字重；任一失败即整体失败，不做字体兜底。
    pub async fn load(&self) -> Result<Vec<FontAsset>, FontLoadError> {
        let (regular, black) = tokio::try_join!(read_font(&self.regular), read_font(&self.black))?;
        Ok(vec![
            FontAsset {
                family: self.family.clone(),
                data: regular,
                weight: 400,
            },
            FontAsset {
                family: self.family.clone(),
                data: black,
                weight: 900,
            },
        ])
    }
}

async fn read_font(path: &Path) -> Result<Bytes, FontLoadError> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| FontLoadError {
            path: path.to_path_buf(),
            source,
        })
}
