//! 简化的 flexbox 排版：把布局树换算成带绝对坐标的绘制指令。
//!
//! 每个元素都按 flex 容器处理（与预览图模板的写法一致），支持 row/column、
//! grow、按基准尺寸等比收缩、justify/items 对齐、padding 与 margin。
//! 文本宽度按字符显示宽度估算，不依赖字形数据。

use unicode_width::UnicodeWidthChar;

use super::Canvas;
use super::style::{self, Align, Color, Direction, Justify, Length, LineHeight, Style};
use crate::features::og::layout::{Element, LayoutNode};

/// Inter 的 ascent / descent（相对 em）
pub const ASCENT: f32 = 0.969;
pub const DESCENT: f32 = 0.242;

/// 半角字符的平均字宽（常规字重，单位 em）
const HALF_WIDTH_EM: f32 = 0.56;
/// 从常规到最粗字重的平均字宽增量
const WEIGHT_WIDTH_EM: f32 = 0.08;
const SPACE_EM: f32 = 0.28;
const FULL_WIDTH_EM: f32 = 1.0;

const EPSILON: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub color: Color,
    pub line_height: LineHeight,
    pub letter_spacing_em: f32,
    pub italic: bool,
}

impl TextStyle {
    /// 根节点的默认文字样式
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            size: 16.0,
            weight: 400,
            color: Color::BLACK,
            line_height: LineHeight::Ratio(1.2),
            letter_spacing_em: 0.0,
            italic: false,
        }
    }

    fn inherit(&self, style: &Style) -> Self {
        let mut next = self.clone();
        if let Some(family) = &style.font_family {
            next.family = family.clone();
        }
        if let Some(size) = style.font_size {
            next.size = size;
        }
        if let Some(weight) = style.font_weight {
            next.weight = weight;
        }
        if let Some(color) = style.color {
            next.color = color;
        }
        if let Some(line_height) = style.effective_line_height() {
            next.line_height = line_height;
        }
        if let Some(spacing) = style.letter_spacing_em {
            next.letter_spacing_em = spacing;
        }
        if let Some(italic) = style.italic {
            next.italic = italic;
        }
        next
    }

    pub fn line_height_px(&self) -> f32 {
        self.line_height.to_px(self.size)
    }

    /// 估算单行文本宽度（像素）
    pub fn measure_line(&self, line: &str) -> f32 {
        line.chars().map(|c| self.advance(c)).sum()
    }

    fn advance(&self, c: char) -> f32 {
        let em = match c {
            ' ' => SPACE_EM,
            _ => match c.width() {
                None | Some(0) => return 0.0,
                Some(1) => {
                    HALF_WIDTH_EM + (f32::from(self.weight) - 400.0) / 500.0 * WEIGHT_WIDTH_EM
                }
                Some(_) => FULL_WIDTH_EM,
            },
        };
        (em + self.letter_spacing_em) * self.size
    }

    /// 行框内的基线偏移（行高减去字形高度后上下均分）
    fn baseline_offset(&self) -> f32 {
        let line_height = self.line_height_px();
        let glyph_height = (ASCENT + DESCENT) * self.size;
        (line_height - glyph_height) / 2.0 + ASCENT * self.size
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    fn inset(&self, edges: &style::Edges) -> Rect {
        Rect {
            x: self.x + edges.left,
            y: self.y + edges.top,
            width: (self.width - edges.horizontal()).max(0.0),
            height: (self.height - edges.vertical()).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// 绘制指令，按数组顺序由下往上叠放
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Rect {
        rect: Rect,
        fill: Color,
        radius: Option<f32>,
    },
    Image {
        rect: Rect,
        src: String,
        radius: Option<f32>,
    },
    Text {
        x: f32,
        baseline: f32,
        content: String,
        style: TextStyle,
    },
}

/// 排版整棵布局树
pub fn compute(root: &LayoutNode, canvas: Canvas, base: &TextStyle) -> Vec<Paint> {
    let tree = Block::resolve(root, base);
    let (width, height) = (canvas.width as f32, canvas.height as f32);
    let rect = Rect {
        x: 0.0,
        y: 0.0,
        width: resolve_length(tree.style.width, width).unwrap_or(width),
        height: resolve_length(tree.style.height, height).unwrap_or(height),
    };
    let mut paints = Vec::new();
    place(&tree, rect, &mut paints);
    paints
}

/// 贪心折行：优先在空格处断开，单词本身超宽时按字符断开；`\n` 强制换行
pub fn wrap(content: &str, text: &TextStyle, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text.measure_line(&candidate) <= max_width + EPSILON {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                let mut next = current.clone();
                next.push(c);
                if !current.is_empty() && text.measure_line(&next) > max_width + EPSILON {
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                } else {
                    current = next;
                }
            }
        }
        lines.push(current);
    }
    lines
}

enum Kind<'a> {
    Container,
    Image(&'a str),
    Text(&'a str),
}

/// 解析过样式的节点
struct Block<'a> {
    kind: Kind<'a>,
    style: Style,
    text: TextStyle,
    children: Vec<Block<'a>>,
}

impl<'a> Block<'a> {
    fn resolve(node: &'a LayoutNode, parent: &TextStyle) -> Self {
        match node {
            LayoutNode::Text(content) => Block {
                kind: Kind::Text(content),
                style: Style::default(),
                text: parent.clone(),
                children: Vec::new(),
            },
            LayoutNode::Element(el) => {
                let mut style = style::parse(el.style());
                let text = parent.inherit(&style);
                let kind = if el.tag == "img" {
                    style.width = style.width.or_else(|| attr_px(el, "width"));
                    style.height = style.height.or_else(|| attr_px(el, "height"));
                    Kind::Image(el.attr("src").unwrap_or_default())
                } else {
                    Kind::Container
                };
                let children = el
                    .children
                    .iter()
                    .map(|child| Block::resolve(child, &text))
                    .collect();
                Block {
                    kind,
                    style,
                    text,
                    children,
                }
            }
        }
    }
}

fn attr_px(el: &Element, name: &str) -> Option<Length> {
    el.attr(name)?
        .trim_end_matches("px")
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(Length::Px)
}

fn resolve_length(length: Option<Length>, parent: f32) -> Option<f32> {
    length.map(|l| match l {
        Length::Px(px) => px,
        Length::Full => parent.max(0.0),
    })
}

/// 在给定可用宽度下的固有尺寸（含 padding，不含 margin）
fn measure(block: &Block, available_width: f32) -> Size {
    let available_width = available_width.max(0.0);
    if let Kind::Text(content) = block.kind {
        let lines = wrap(content, &block.text, available_width);
        let width = lines
            .iter()
            .map(|l| block.text.measure_line(l))
            .fold(0.0, f32::max);
        return Size {
            width,
            height: lines.len() as f32 * block.text.line_height_px(),
        };
    }

    let padding = &block.style.padding;
    let fixed_width = resolve_length(block.style.width, available_width);
    let inner_max = (fixed_width.unwrap_or(available_width) - padding.horizontal()).max(0.0);
    let content = measure_children(block, inner_max);
    let width = fixed_width
        .unwrap_or_else(|| (content.width + padding.horizontal()).min(available_width));
    let height = match block.style.height {
        Some(Length::Px(px)) => px,
        _ => content.height + padding.vertical(),
    };
    Size { width, height }
}

fn measure_children(block: &Block, inner_width: f32) -> Size {
    let mut total = Size::default();
    for child in &block.children {
        let margin = &child.style.margin;
        let size = measure(child, inner_width - margin.horizontal());
        let (w, h) = (
            size.width + margin.horizontal(),
            size.height + margin.vertical(),
        );
        match block.style.direction {
            Direction::Row => {
                total.width += w;
                total.height = total.height.max(h);
            }
            Direction::Column => {
                total.width = total.width.max(w);
                total.height += h;
            }
        }
    }
    total
}

fn place(block: &Block, rect: Rect, out: &mut Vec<Paint>) {
    if let Kind::Text(content) = block.kind {
        place_text(content, &block.text, rect, out);
        return;
    }
    if let Some(fill) = block.style.background.filter(|c| c.a > 0) {
        out.push(Paint::Rect {
            rect,
            fill,
            radius: block.style.radius,
        });
    }
    if let Kind::Image(src) = block.kind {
        out.push(Paint::Image {
            rect,
            src: src.to_string(),
            radius: block.style.radius,
        });
    }
    layout_children(block, rect.inset(&block.style.padding), out);
}

fn place_text(content: &str, text: &TextStyle, rect: Rect, out: &mut Vec<Paint>) {
    let line_height = text.line_height_px();
    for (i, line) in wrap(content, text, rect.width).into_iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        out.push(Paint::Text {
            x: rect.x,
            baseline: rect.y + i as f32 * line_height + text.baseline_offset(),
            content: line,
            style: text.clone(),
        });
    }
}

/// 子项在主轴/交叉轴上的尺寸与外边距
struct Item {
    main: f32,
    cross: f32,
    margin_main: (f32, f32),
    margin_cross: (f32, f32),
    fixed_main: bool,
}

fn layout_children(block: &Block, content: Rect, out: &mut Vec<Paint>) {
    if block.children.is_empty() {
        return;
    }
    let row = block.style.direction == Direction::Row;
    let align = block.style.align;
    let (main_len, cross_len) = if row {
        (content.width, content.height)
    } else {
        (content.height, content.width)
    };

    let mut items: Vec<Item> = block
        .children
        .iter()
        .map(|child| {
            let m = &child.style.margin;
            let (margin_main, margin_cross) = if row {
                ((m.left, m.right), (m.top, m.bottom))
            } else {
                ((m.top, m.bottom), (m.left, m.right))
            };
            if row {
                let fixed = resolve_length(child.style.width, content.width);
                let main = fixed.unwrap_or_else(|| {
                    measure(child, content.width - margin_main.0 - margin_main.1).width
                });
                Item {
                    main,
                    cross: 0.0,
                    margin_main,
                    margin_cross,
                    fixed_main: fixed.is_some(),
                }
            } else {
                // 纵向排布先定宽度，再按宽度求高度
                let cross = cross_size(
                    child.style.width,
                    cross_len,
                    margin_cross.0 + margin_cross.1,
                    align,
                    || measure(child, cross_len - margin_cross.0 - margin_cross.1).width,
                );
                let fixed = resolve_length(child.style.height, content.height);
                let main = fixed.unwrap_or_else(|| measure(child, cross).height);
                Item {
                    main,
                    cross,
                    margin_main,
                    margin_cross,
                    fixed_main: fixed.is_some(),
                }
            }
        })
        .collect();

    let used: f32 = items
        .iter()
        .map(|i| i.main + i.margin_main.0 + i.margin_main.1)
        .sum();
    let mut free = main_len - used;
    let total_grow: f32 = block.children.iter().map(|c| c.style.grow).sum();

    if free > 0.0 && total_grow > 0.0 {
        for (item, child) in items.iter_mut().zip(&block.children) {
            item.main += free * child.style.grow / total_grow;
        }
        free = 0.0;
    } else if free < 0.0 {
        let shrinkable: f32 = items.iter().filter(|i| !i.fixed_main).map(|i| i.main).sum();
        if shrinkable > 0.0 {
            let ratio = (-free / shrinkable).min(1.0);
            for item in items.iter_mut().filter(|i| !i.fixed_main) {
                item.main *= 1.0 - ratio;
            }
            free += shrinkable * ratio;
        }
    }

    if row {
        for (item, child) in items.iter_mut().zip(&block.children) {
            let main = item.main;
            item.cross = cross_size(
                child.style.height,
                cross_len,
                item.margin_cross.0 + item.margin_cross.1,
                align,
                || measure(child, main).height,
            );
        }
    }

    let free = free.max(0.0);
    let count = items.len();
    let (mut cursor, gap) = match block.style.justify {
        Justify::Start => (0.0, 0.0),
        Justify::Center => (free / 2.0, 0.0),
        Justify::End => (free, 0.0),
        Justify::Between if count > 1 => (0.0, free / (count - 1) as f32),
        Justify::Between => (0.0, 0.0),
    };

    for (item, child) in items.iter().zip(&block.children) {
        cursor += item.margin_main.0;
        let (before, after) = item.margin_cross;
        let cross_offset = match align {
            Align::Start | Align::Stretch => before,
            Align::Center => (cross_len - item.cross - before - after) / 2.0 + before,
            Align::End => cross_len - item.cross - after,
        };
        let rect = if row {
            Rect {
                x: content.x + cursor,
                y: content.y + cross_offset,
                width: item.main,
                height: item.cross,
            }
        } else {
            Rect {
                x: content.x + cross_offset,
                y: content.y + cursor,
                width: item.cross,
                height: item.main,
            }
        };
        place(child, rect, out);
        cursor += item.main + item.margin_main.1 + gap;
    }
}

fn cross_size(
    fixed: Option<Length>,
    cross_len: f32,
    margins: f32,
    align: Align,
    intrinsic: impl FnOnce() -> f32,
) -> f32 {
    match resolve_length(fixed, cross_len) {
        Some(v) => v,
        None if align == Align::Stretch => (cross_len - margins).max(0.0),
        None => intrinsic(),
    }
}
