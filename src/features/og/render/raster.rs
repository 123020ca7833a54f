use std::sync::{Arc, OnceLock};

use resvg::render;
use tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, Options as UsvgOptions, fontdb};

use super::{RenderError, RenderOptions};
use crate::features::og::fonts::FontAsset;
use crate::features::og::layout::FONT_FAMILY;

// 系统字体数据库单例（扫描系统字体较慢，只做一次）
static SYSTEM_FONT_DB: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

fn system_font_db() -> Arc<fontdb::Database> {
    SYSTEM_FONT_DB
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            tracing::info!("系统字体加载完成: {} 个字体", db.len());
            Arc::new(db)
        })
        .clone()
}

/// 提前扫描系统字体，避免首个请求承担加载耗时
pub fn prewarm_system_fonts() {
    let _ = system_font_db();
}

/// 构造本次渲染使用的字体库：可选的系统字体 + 本次请求加载的字体资源。
///
/// 请求字体按资源声明的字族与字重注册；任一资源解析不出字形即失败，不回退到其他字体。
fn font_db_for(
    fonts: &[FontAsset],
    options: &RenderOptions,
) -> Result<Arc<fontdb::Database>, RenderError> {
    let mut db = if options.load_system_fonts {
        (*system_font_db()).clone()
    } else {
        fontdb::Database::new()
    };
    for font in fonts {
        let source = fontdb::Source::Binary(Arc::new(font.data.to_vec()));
        let ids = db.load_font_source(source);
        if ids.is_empty() {
            return Err(RenderError::Font(format!(
                "{} {} 的字体数据无法解析",
                font.family, font.weight
            )));
        }
        for id in ids {
            let Some(mut face) = db.face(id).cloned() else {
                continue;
            };
            db.remove_face(id);
            face.families = vec![(
                font.family.clone(),
                fontdb::Language::English_UnitedStates,
            )];
            face.weight = fontdb::Weight(font.weight);
            face.style = fontdb::Style::Normal;
            db.push_face_info(face);
        }
    }
    Ok(Arc::new(db))
}

/// SVG → PNG
pub fn render_png(
    svg_data: &str,
    fonts: &[FontAsset],
    options: &RenderOptions,
) -> Result<Vec<u8>, RenderError> {
    let t0 = std::time::Instant::now();
    let speed = options.optimize_speed;
    let opts = UsvgOptions {
        fontdb: font_db_for(fonts, options)?,
        font_family: FONT_FAMILY.to_string(),
        font_size: 16.0,
        languages: vec!["en".to_string()],
        shape_rendering: if speed {
            usvg::ShapeRendering::OptimizeSpeed
        } else {
            usvg::ShapeRendering::GeometricPrecision
        },
        text_rendering: if speed {
            usvg::TextRendering::OptimizeSpeed
        } else {
            usvg::TextRendering::OptimizeLegibility
        },
        image_rendering: if speed {
            usvg::ImageRendering::OptimizeSpeed
        } else {
            usvg::ImageRendering::OptimizeQuality
        },
        ..Default::default()
    };

    let tree = usvg::Tree::from_data(svg_data.as_bytes(), &opts)
        .map_err(|e| RenderError::Svg(format!("Failed to parse SVG: {e}")))?;
    let t_parse = t0.elapsed();

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| RenderError::Raster("Failed to create pixmap".to_string()))?;
    render(&tree, Transform::default(), &mut pixmap.as_mut());
    let t_raster = t0.elapsed();

    let mut out = Vec::with_capacity((size.width() * size.height()) as usize);
    {
        let mut encoder = png::Encoder::new(&mut out, size.width(), size.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if speed {
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_compression(png::Compression::Default);
            encoder.set_filter(png::FilterType::Paeth);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG write_header error: {e}")))?;
        writer
            .write_image_data(pixmap.data())
            .map_err(|e| RenderError::Encode(format!("PNG write_image_data error: {e}")))?;
        writer
            .finish()
            .map_err(|e| RenderError::Encode(format!("PNG finish error: {e}")))?;
    }

    tracing::info!(
        "PNG渲染分段: 解析={:?}, 栅格化={:?}, 编码={:?}",
        t_parse,
        t_raster - t_parse,
        t0.elapsed() - t_raster,
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RenderOptions {
        RenderOptions {
            load_system_fonts: false,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn renders_png_with_svg_dimensions() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20"><rect width="40" height="20" fill="#000000" /></svg>"##;
        let png_bytes = render_png(svg, &[], &options()).expect("render");

        let decoder = png::Decoder::new(std::io::Cursor::new(png_bytes));
        let reader = decoder.read_info().expect("png header");
        assert_eq!(reader.info().width, 40);
        assert_eq!(reader.info().height, 20);
    }

    #[test]
    fn invalid_svg_is_a_render_error() {
        let err = render_png("<not-svg", &[], &options()).expect_err("parse failure");
        assert!(matches!(err, RenderError::Svg(_)));
    }

    fn fixture_font() -> axum::body::Bytes {
        let path =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/Tuffy.ttf");
        axum::body::Bytes::from(std::fs::read(path).expect("read fixture font"))
    }

    fn asset(data: axum::body::Bytes, weight: u16) -> FontAsset {
        FontAsset {
            family: "Inter".to_string(),
            data,
            weight,
        }
    }

    #[test]
    fn unparseable_font_bytes_fail_rendering() {
        let fonts = vec![asset(axum::body::Bytes::from_static(b"not a font"), 400)];
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><text x="0" y="8">hi</text></svg>"#;
        let err = render_png(svg, &fonts, &options()).expect_err("font rejected");
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn one_bad_weight_fails_even_with_system_fonts() {
        let fonts = vec![
            asset(fixture_font(), 400),
            asset(axum::body::Bytes::from_static(b"garbage"), 900),
        ];
        let opts = RenderOptions {
            load_system_fonts: true,
            ..RenderOptions::default()
        };
        let err = font_db_for(&fonts, &opts).expect_err("black weight unusable");
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn fonts_are_registered_under_declared_family_and_weight() {
        let fonts = vec![asset(fixture_font(), 400), asset(fixture_font(), 900)];
        let db = font_db_for(&fonts, &options()).expect("font db");

        for weight in [400, 900] {
            let id = db
                .query(&fontdb::Query {
                    families: &[fontdb::Family::Name("Inter")],
                    weight: fontdb::Weight(weight),
                    ..Default::default()
                })
                .expect("registered face");
            let face = db.face(id).expect("face info");
            assert_eq!(face.weight, fontdb::Weight(weight));
            assert_eq!(face.families[0].0, "Inter");
        }
        assert!(db.faces().all(|f| f.families[0].0 == "Inter"));
    }
}
