//! 工具类样式串（Tailwind 子集）解析。
//!
//! 只覆盖预览图模板用得到的那部分工具类；未知的类名直接忽略。

/// Tailwind 间距刻度：1 单位 = 0.25rem = 4px
const SPACING_UNIT_PX: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    /// 100%（相对父元素内容盒）
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    Between,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Stretch,
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// 解析 `#rgb` / `#rrggbb`
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        let channel = |h: &str| u8::from_str_radix(h, 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|v| v as u8 * 17));
                Some(Color::rgb(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Color::rgb(
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineHeight {
    /// 相对字号的倍数
    Ratio(f32),
    Px(f32),
}

impl LineHeight {
    pub fn to_px(self, font_size: f32) -> f32 {
        match self {
            LineHeight::Ratio(r) => r * font_size,
            LineHeight::Px(px) => px,
        }
    }
}

/// 单个元素解析后的样式；文字相关字段为 `None` 时继承父元素。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub direction: Direction,
    pub grow: f32,
    pub justify: Justify,
    pub align: Align,
    pub width: Option<Length>,
    pub height: Option<Length>,
    pub padding: Edges,
    pub margin: Edges,
    pub background: Option<Color>,
    pub radius: Option<f32>,

    pub color: Option<Color>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<u16>,
    pub italic: Option<bool>,
    /// `leading-*` 显式设置的行高
    pub line_height: Option<LineHeight>,
    /// `text-{size}` 附带的默认行高，优先级低于 `leading-*`
    pub size_line_height: Option<LineHeight>,
    pub letter_spacing_em: Option<f32>,
}

impl Style {
    pub fn effective_line_height(&self) -> Option<LineHeight> {
        self.line_height.or(self.size_line_height)
    }
}

/// 解析空白分隔的工具类串
pub fn parse(tw: &str) -> Style {
    let mut style = Style::default();
    for class in tw.split_whitespace() {
        if !apply(&mut style, class) {
            tracing::debug!(class, "未支持的工具类，已忽略");
        }
    }
    style
}

fn apply(style: &mut Style, class: &str) -> bool {
    match class {
        // 所有元素本身就按 flex 容器排布
        "flex" => return true,
        "grow" => {
            style.grow = 1.0;
            return true;
        }
        "italic" => {
            style.italic = Some(true);
            return true;
        }
        "not-italic" => {
            style.italic = Some(false);
            return true;
        }
        "rounded" => {
            style.radius = Some(4.0);
            return true;
        }
        _ => {}
    }

    let Some((key, value)) = class.split_once('-') else {
        return false;
    };
    match key {
        "flex" => match value {
            "row" => style.direction = Direction::Row,
            "col" => style.direction = Direction::Column,
            "1" => style.grow = 1.0,
            "none" => style.grow = 0.0,
            _ => return false,
        },
        "grow" => match value.parse::<f32>() {
            Ok(v) if v >= 0.0 => style.grow = v,
            _ => return false,
        },
        "justify" => {
            style.justify = match value {
                "start" => Justify::Start,
                "center" => Justify::Center,
                "end" => Justify::End,
                "between" => Justify::Between,
                _ => return false,
            }
        }
        "items" => {
            style.align = match value {
                "start" => Align::Start,
                "center" => Align::Center,
                "end" => Align::End,
                "stretch" => Align::Stretch,
                _ => return false,
            }
        }
        "w" | "h" => {
            let Some(len) = length(value) else {
                return false;
            };
            if key == "w" {
                style.width = Some(len);
            } else {
                style.height = Some(len);
            }
        }
        "p" | "px" | "py" | "pt" | "pr" | "pb" | "pl" => {
            let Some(v) = spacing(value) else {
                return false;
            };
            set_edges(&mut style.padding, &key[1..], v);
        }
        "m" | "mx" | "my" | "mt" | "mr" | "mb" | "ml" => {
            let Some(v) = spacing(value) else {
                return false;
            };
            set_edges(&mut style.margin, &key[1..], v);
        }
        "bg" => match color(value) {
            Some(c) => style.background = Some(c),
            None => return false,
        },
        "text" => {
            if let Some((size, line_height)) = font_size(value) {
                style.font_size = Some(size);
                style.size_line_height = Some(line_height);
            } else if let Some(c) = color(value) {
                style.color = Some(c);
            } else {
                return false;
            }
        }
        "font" => match font_weight(value) {
            Some(w) => style.font_weight = Some(w),
            None if !value.is_empty() => style.font_family = Some(value.replace('_', " ")),
            None => return false,
        },
        "leading" => {
            style.line_height = Some(match value {
                "none" => LineHeight::Ratio(1.0),
                "tight" => LineHeight::Ratio(1.25),
                "snug" => LineHeight::Ratio(1.375),
                "normal" => LineHeight::Ratio(1.5),
                "relaxed" => LineHeight::Ratio(1.625),
                "loose" => LineHeight::Ratio(2.0),
                other => match spacing(other) {
                    Some(px) => LineHeight::Px(px),
                    None => return false,
                },
            })
        }
        "tracking" => {
            style.letter_spacing_em = Some(match value {
                "tighter" => -0.05,
                "tight" => -0.025,
                "normal" => 0.0,
                "wide" => 0.025,
                "wider" => 0.05,
                "widest" => 0.1,
                _ => return false,
            })
        }
        "rounded" => {
            style.radius = Some(match value {
                "none" => 0.0,
                "sm" => 2.0,
                "md" => 6.0,
                "lg" => 8.0,
                "xl" => 12.0,
                "2xl" => 16.0,
                "3xl" => 24.0,
                "full" => 9999.0,
                _ => return false,
            })
        }
        _ => return false,
    }
    true
}

fn set_edges(edges: &mut Edges, side: &str, v: f32) {
    match side {
        "" => {
            *edges = Edges {
                top: v,
                right: v,
                bottom: v,
                left: v,
            }
        }
        "x" => {
            edges.left = v;
            edges.right = v;
        }
        "y" => {
            edges.top = v;
            edges.bottom = v;
        }
        "t" => edges.top = v,
        "r" => edges.right = v,
        "b" => edges.bottom = v,
        "l" => edges.left = v,
        _ => {}
    }
}

/// 间距刻度值：`4` → 16px，`2.5` → 10px，`px` → 1px，`[12px]` → 12px
fn spacing(value: &str) -> Option<f32> {
    if value == "px" {
        return Some(1.0);
    }
    if let Some(px) = arbitrary(value).and_then(|v| v.strip_suffix("px")) {
        return px.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0);
    }
    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v * SPACING_UNIT_PX)
}

fn length(value: &str) -> Option<Length> {
    match value {
        "full" => Some(Length::Full),
        other => spacing(other).map(Length::Px),
    }
}

fn arbitrary(value: &str) -> Option<&str> {
    value.strip_prefix('[')?.strip_suffix(']')
}

fn color(value: &str) -> Option<Color> {
    match value {
        "white" => Some(Color::WHITE),
        "black" => Some(Color::BLACK),
        "transparent" => Some(Color::TRANSPARENT),
        other => arbitrary(other).and_then(Color::from_hex),
    }
}

/// 字号及其默认行高（与 Tailwind 默认主题一致）
fn font_size(value: &str) -> Option<(f32, LineHeight)> {
    let (size, line_height) = match value {
        "xs" => (12.0, LineHeight::Px(16.0)),
        "sm" => (14.0, LineHeight::Px(20.0)),
        "base" => (16.0, LineHeight::Px(24.0)),
        "lg" => (18.0, LineHeight::Px(28.0)),
        "xl" => (20.0, LineHeight::Px(28.0)),
        "2xl" => (24.0, LineHeight::Px(32.0)),
        "3xl" => (30.0, LineHeight::Px(36.0)),
        "4xl" => (36.0, LineHeight::Px(40.0)),
        "5xl" => (48.0, LineHeight::Ratio(1.0)),
        "6xl" => (60.0, LineHeight::Ratio(1.0)),
        "7xl" => (72.0, LineHeight::Ratio(1.0)),
        "8xl" => (96.0, LineHeight::Ratio(1.0)),
        "9xl" => (128.0, LineHeight::Ratio(1.0)),
        _ => return None,
    };
    Some((size, line_height))
}

fn font_weight(value: &str) -> Option<u16> {
    Some(match value {
        "thin" => 100,
        "extralight" => 200,
        "light" => 300,
        "normal" => 400,
        "medium" => 500,
        "semibold" => 600,
        "bold" => 700,
        "extrabold" => 800,
        "black" => 900,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_footer_classes() {
        let s = parse(
            "h-28 w-full px-4 py-2.5 bg-white text-4xl flex flex-row justify-center items-center",
        );
        assert_eq!(s.height, Some(Length::Px(112.0)));
        assert_eq!(s.width, Some(Length::Full));
        assert_eq!(
            s.padding,
            Edges {
                top: 10.0,
                right: 16.0,
                bottom: 10.0,
                left: 16.0
            }
        );
        assert_eq!(s.background, Some(Color::WHITE));
        assert_eq!(s.font_size, Some(36.0));
        assert_eq!(s.effective_line_height(), Some(LineHeight::Px(40.0)));
        assert_eq!(s.direction, Direction::Row);
        assert_eq!(s.justify, Justify::Center);
        assert_eq!(s.align, Align::Center);
    }

    #[test]
    fn leading_overrides_size_line_height_regardless_of_order() {
        let a = parse("leading-none text-4xl");
        let b = parse("text-4xl leading-none");
        assert_eq!(a.effective_line_height(), Some(LineHeight::Ratio(1.0)));
        assert_eq!(a.effective_line_height(), b.effective_line_height());
    }

    #[test]
    fn parses_title_classes() {
        let s = parse("text-9xl font-black text-white leading-none tracking-tighter");
        assert_eq!(s.font_size, Some(128.0));
        assert_eq!(s.font_weight, Some(900));
        assert_eq!(s.color, Some(Color::WHITE));
        assert_eq!(s.letter_spacing_em, Some(-0.05));
    }

    #[test]
    fn font_family_and_grow() {
        let s = parse("font-Inter flex flex-col flex-1 ml-2 rounded-full");
        assert_eq!(s.font_family.as_deref(), Some("Inter"));
        assert_eq!(s.direction, Direction::Column);
        assert_eq!(s.grow, 1.0);
        assert_eq!(s.margin.left, 8.0);
        assert_eq!(s.radius, Some(9999.0));
    }

    #[test]
    fn arbitrary_values_and_unknown_classes() {
        let s = parse("w-[300px] bg-[#1e90ff] text-[#abc] shadow-lg -mt-2 p-x");
        assert_eq!(s.width, Some(Length::Px(300.0)));
        assert_eq!(s.background, Some(Color::rgb(0x1e, 0x90, 0xff)));
        assert_eq!(s.color, Some(Color::rgb(0xaa, 0xbb, 0xcc)));
        assert_eq!(s.margin, Edges::default());
        assert_eq!(s.padding, Edges::default());
    }

    #[test]
    fn color_hex_roundtrip() {
        assert_eq!(Color::from_hex("#000").map(Color::to_hex).as_deref(), Some("#000000"));
        assert_eq!(Color::from_hex("#FFFFFF"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("fff"), None);
        assert_eq!(Color::from_hex("#ffff"), None);
    }
}
