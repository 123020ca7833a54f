//! 预览图的声明式布局树。
//!
//! 这里只负责"画什么"：节点类型、顺序与工具类样式串（`tw` 属性）；
//! "怎么画"交给渲染器（见 `render` 模块）。

use std::collections::BTreeMap;

use super::author::Author;
use super::post::PostMeta;

/// 样式描述串所在的属性名
pub const STYLE_ATTR: &str = "tw";

/// 主字体族名（与加载的字体资源一致）
pub const FONT_FAMILY: &str = "Inter";

/// 页脚头像边长（像素）
pub const AVATAR_SIZE: u32 = 92;

/// 页脚尾部文本的分隔符
pub const STATUS_SEPARATOR: &str = " · ";

/// 布局节点：元素或文本叶子。子节点顺序即绘制顺序。
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    /// 属性键唯一
    pub attrs: BTreeMap<&'static str, String>,
    pub children: Vec<LayoutNode>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// 工具类样式串（无则为空串）
    pub fn style(&self) -> &str {
        self.attr(STYLE_ATTR).unwrap_or("")
    }
}

impl LayoutNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            LayoutNode::Element(el) => Some(el),
            LayoutNode::Text(_) => None,
        }
    }

    /// 子树中所有文本按顺序拼接
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            LayoutNode::Text(t) => out.push_str(t),
            LayoutNode::Element(el) => el.children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    /// 深度优先查找第一个指定标签的元素
    pub fn find(&self, tag: &str) -> Option<&Element> {
        let el = self.as_element()?;
        if el.tag == tag {
            return Some(el);
        }
        el.children.iter().find_map(|c| c.find(tag))
    }
}

/// 构造元素节点
pub fn h<I>(tag: &'static str, attrs: I, children: Vec<LayoutNode>) -> LayoutNode
where
    I: IntoIterator<Item = (&'static str, String)>,
{
    LayoutNode::Element(Element {
        tag,
        attrs: attrs.into_iter().collect(),
        children,
    })
}

/// 构造只带样式串的元素节点
pub fn styled(tag: &'static str, tw: &str, children: Vec<LayoutNode>) -> LayoutNode {
    h(tag, [(STYLE_ATTR, tw.to_string())], children)
}

pub fn text(s: impl Into<String>) -> LayoutNode {
    LayoutNode::Text(s.into())
}

/// 整张画布：上方插画区（含标题）+ 下方白色页脚
pub fn og_document(post: &PostMeta, author: &Author) -> LayoutNode {
    styled(
        "div",
        &format!("w-full h-full font-{FONT_FAMILY} flex flex-col"),
        vec![illustration(vec![title(&post.title)]), footer(author, post)],
    )
}

/// 黑底插画区，占满页脚以外的纵向空间
pub fn illustration(children: Vec<LayoutNode>) -> LayoutNode {
    styled(
        "div",
        "flex flex-1 justify-start items-center w-full p-4 bg-black",
        children,
    )
}

pub fn title(title: &str) -> LayoutNode {
    styled(
        "h1",
        "text-9xl font-black text-white leading-none tracking-tighter",
        vec![text(title)],
    )
}

pub fn footer(author: &Author, post: &PostMeta) -> LayoutNode {
    styled(
        "footer",
        "h-28 w-full px-4 py-2.5 bg-white text-4xl flex flex-row justify-center items-center",
        vec![
            h(
                "img",
                [
                    ("width", AVATAR_SIZE.to_string()),
                    ("height", AVATAR_SIZE.to_string()),
                    ("src", author.avatar_url.to_string()),
                    (STYLE_ATTR, "rounded-full".to_string()),
                ],
                vec![],
            ),
            styled("span", "ml-2", vec![text(author.name)]),
            styled("div", "flex-1", vec![]),
            h("span", [], vec![text(footer_status(post))]),
        ],
    )
}

/// 页脚尾部文本："YYYY-MM-DD" 或 "YYYY-MM-DD · N min"
pub fn footer_status(post: &PostMeta) -> String {
    [Some(post.formatted_date()), post.reading_time_label()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(STATUS_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::og::author::AUTHOR;
    use crate::features::og::post::{OgQuery, PostMeta};

    fn post(title: &str, date: &str, reading_time: &str) -> PostMeta {
        PostMeta::from_query(&OgQuery {
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            reading_time: Some(reading_time.to_string()),
            format: None,
        })
    }

    #[test]
    fn document_has_illustration_then_footer() {
        let root = og_document(&post("Hello World", "2024-03-01", "3"), &AUTHOR);
        let el = root.as_element().expect("root element");
        assert_eq!(el.tag, "div");
        assert!(el.style().contains("flex-col"));
        assert_eq!(el.children.len(), 2);

        let illustration = el.children[0].as_element().expect("illustration");
        assert!(illustration.style().contains("bg-black"));
        let title = illustration.children[0].as_element().expect("title");
        assert_eq!(title.tag, "h1");
        assert!(title.style().contains("font-black"));
        assert_eq!(el.children[0].text_content(), "Hello World");

        let footer = el.children[1].as_element().expect("footer");
        assert_eq!(footer.tag, "footer");
        let tags: Vec<_> = footer
            .children
            .iter()
            .filter_map(|c| c.as_element().map(|e| e.tag))
            .collect();
        assert_eq!(tags, ["img", "span", "div", "span"]);
    }

    #[test]
    fn footer_carries_author_and_status() {
        let root = og_document(&post("Hello World", "2024-03-01", "3"), &AUTHOR);
        let footer = root.find("footer").expect("footer");
        let img = footer.children[0].as_element().expect("img");
        assert_eq!(img.attr("src"), Some(AUTHOR.avatar_url));
        assert_eq!(img.attr("width"), Some("92"));
        assert_eq!(img.style(), "rounded-full");
        assert_eq!(footer.children[1].text_content(), "Yours Truly");
        assert_eq!(footer.children[3].text_content(), "2024-03-01 · 3 min");
    }

    #[test]
    fn status_omits_short_reading_time() {
        assert_eq!(footer_status(&post("t", "2024-03-01", "0.5")), "2024-03-01");
        assert_eq!(footer_status(&post("t", "2024-03-01", "abc")), "2024-03-01");
        assert_eq!(footer_status(&post("t", "bogus", "5")), "1970-01-01 · 5 min");
    }

    #[test]
    fn untitled_post_renders_placeholder_title() {
        let root = og_document(&post("", "", ""), &AUTHOR);
        let h1 = root.find("h1").expect("h1");
        assert_eq!(h1.children, vec![text("Untitled")]);
    }
}
