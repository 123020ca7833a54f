use std::collections::HashMap;
use std::fmt::Write;

use super::flex::{Paint, Rect, TextStyle};
use super::{Canvas, RenderError};

/// 把绘制指令序列化为 SVG 文档。
///
/// `hrefs` 用于替换图片地址（例如换成内嵌的 data URI）；不在表中的地址原样输出。
pub fn write_svg(
    paints: &[Paint],
    canvas: Canvas,
    hrefs: &HashMap<String, String>,
) -> Result<String, RenderError> {
    let fmt_err = |e: std::fmt::Error| RenderError::Svg(format!("SVG formatting error: {e}"));
    let (width, height) = (canvas.width, canvas.height);

    let mut svg = String::with_capacity(2048);
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    )
    .map_err(fmt_err)?;

    let mut clip_id = 0usize;
    for paint in paints {
        match paint {
            Paint::Rect { rect, fill, radius } => {
                let r = corner_radius(rect, *radius);
                writeln!(
                    svg,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{r:.2}" ry="{r:.2}" fill="{}" fill-opacity="{:.3}" />"#,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    fill.to_hex(),
                    fill.opacity()
                )
                .map_err(fmt_err)?;
            }
            Paint::Image { rect, src, radius } => {
                let href = hrefs.get(src).unwrap_or(src);
                let r = corner_radius(rect, *radius);
                let clip_attr = if r > 0.0 {
                    clip_id += 1;
                    writeln!(
                        svg,
                        r#"<defs><clipPath id="clip-{clip_id}"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{r:.2}" ry="{r:.2}" /></clipPath></defs>"#,
                        rect.x, rect.y, rect.width, rect.height
                    )
                    .map_err(fmt_err)?;
                    format!(r#" clip-path="url(#clip-{clip_id})""#)
                } else {
                    String::new()
                };
                writeln!(
                    svg,
                    r#"<image href="{}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" preserveAspectRatio="none"{clip_attr} />"#,
                    escape_xml(href),
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height
                )
                .map_err(fmt_err)?;
            }
            Paint::Text {
                x,
                baseline,
                content,
                style,
            } => {
                writeln!(
                    svg,
                    r#"<text x="{x:.2}" y="{baseline:.2}" {} xml:space="preserve">{}</text>"#,
                    text_attrs(style),
                    escape_xml(content)
                )
                .map_err(fmt_err)?;
            }
        }
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

/// 圆角不超过短边的一半（`rounded-full` 即为圆形/胶囊）
fn corner_radius(rect: &Rect, radius: Option<f32>) -> f32 {
    radius
        .unwrap_or(0.0)
        .min(rect.width.min(rect.height) / 2.0)
        .max(0.0)
}

fn text_attrs(style: &TextStyle) -> String {
    let mut attrs = format!(
        r#"font-family="{}, sans-serif" font-size="{}" font-weight="{}" fill="{}""#,
        escape_xml(&format!("'{}'", style.family)),
        style.size,
        style.weight,
        style.color.to_hex()
    );
    if style.color.a < 255 {
        attrs.push_str(&format!(r#" fill-opacity="{:.3}""#, style.color.opacity()));
    }
    if style.letter_spacing_em != 0.0 {
        attrs.push_str(&format!(
            r#" letter-spacing="{:.2}""#,
            style.letter_spacing_em * style.size
        ));
    }
    if style.italic {
        attrs.push_str(r#" font-style="italic""#);
    }
    attrs
}

/// 转义 XML 特殊字符，并丢弃 XML 1.0 不允许出现的字符（C0 控制符、U+FFFE/U+FFFF）
fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_char(c) => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::og::render::style::Color;

    fn text_paint(content: &str) -> Paint {
        Paint::Text {
            x: 16.0,
            baseline: 100.0,
            content: content.to_string(),
            style: TextStyle::new("Inter"),
        }
    }

    fn avatar(src: &str, radius: Option<f32>) -> Paint {
        Paint::Image {
            rect: Rect {
                x: 16.0,
                y: 498.0,
                width: 92.0,
                height: 92.0,
            },
            src: src.to_string(),
            radius,
        }
    }

    #[test]
    fn document_has_canvas_dimensions() {
        let svg = write_svg(&[], crate::features::og::render::OG_CANVAS, &HashMap::new())
            .expect("svg");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="1200""#));
        assert!(svg.contains(r#"height="600""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn text_is_escaped() {
        let svg = write_svg(
            &[text_paint(r#"<script> & "quotes" 'n' stuff"#)],
            crate::features::og::render::OG_CANVAS,
            &HashMap::new(),
        )
        .expect("svg");
        assert!(svg.contains("&lt;script&gt; &amp; &quot;quotes&quot; &apos;n&apos; stuff"));
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("font-family=\"&apos;Inter&apos;, sans-serif\""));
    }

    #[test]
    fn control_characters_are_dropped_from_text() {
        let svg = write_svg(
            &[text_paint("Hello\u{1}World\u{b}\u{fffe}\tok")],
            crate::features::og::render::OG_CANVAS,
            &HashMap::new(),
        )
        .expect("svg");
        assert!(svg.contains(">HelloWorld\tok</text>"));
        resvg::usvg::roxmltree::Document::parse(&svg).expect("well-formed xml");
    }

    #[test]
    fn non_ascii_text_is_kept() {
        assert_eq!(escape_xml("标题 · ✨ 😀"), "标题 · ✨ 😀");
    }

    #[test]
    fn rounded_image_is_clipped_to_circle() {
        let svg = write_svg(
            &[avatar("https://example.com/a.png?u=1&s=2", Some(9999.0))],
            crate::features::og::render::OG_CANVAS,
            &HashMap::new(),
        )
        .expect("svg");
        assert!(svg.contains(r#"<clipPath id="clip-1">"#));
        assert!(svg.contains(r#"rx="46.00""#));
        assert!(svg.contains(r#"clip-path="url(#clip-1)""#));
        assert!(svg.contains("https://example.com/a.png?u=1&amp;s=2"));
    }

    #[test]
    fn hrefs_replace_image_sources() {
        let mut hrefs = HashMap::new();
        hrefs.insert(
            "https://example.com/a.png".to_string(),
            "data:image/png;base64,AAAA".to_string(),
        );
        let svg = write_svg(
            &[avatar("https://example.com/a.png", None)],
            crate::features::og::render::OG_CANVAS,
            &hrefs,
        )
        .expect("svg");
        assert!(svg.contains(r#"href="data:image/png;base64,AAAA""#));
        assert!(!svg.contains("clip-path"));
    }

    #[test]
    fn transparent_rect_keeps_opacity() {
        let paint = Paint::Rect {
            rect: Rect::default(),
            fill: Color::TRANSPARENT,
            radius: None,
        };
        let svg = write_svg(&[paint], crate::features::og::render::OG_CANVAS, &HashMap::new())
            .expect("svg");
        assert!(svg.contains(r#"fill-opacity="0.000""#));
    }
}
