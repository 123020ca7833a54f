/// 健康检查
pub mod health;
/// 文章预览图
pub mod og;
