/// 预览图页脚展示的作者信息（进程级只读常量，不随请求变化）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Author {
    pub name: &'static str,
    pub avatar_url: &'static str,
}

pub const AUTHOR: Author = Author {
    name: "Yours Truly",
    avatar_url: "https://i.pravatar.cc/256?u=30",
};
