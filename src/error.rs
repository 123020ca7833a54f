use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::features::og::{FontLoadError, RenderError};

/// 应用统一错误类型
///
/// 所有变体都映射为 HTTP 500，调用方只能看到 `{"message": ...}`；
/// 详细原因由产生错误的处理函数记录日志。
#[derive(Error, Debug)]
pub enum AppError {
    /// 字体资源加载失败（文件缺失/读取错误）
    #[error("字体资源加载失败: {0}")]
    FontLoad(String),

    /// 图像渲染错误（渲染器内部原因不透传）
    #[error("图像渲染失败")]
    ImageRenderer,
}

/// 错误响应体
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// 人类可读的失败描述
    #[schema(example = "图像渲染失败")]
    pub message: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::FontLoad(_) | AppError::ImageRenderer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<FontLoadError> for AppError {
    fn from(err: FontLoadError) -> Self {
        AppError::FontLoad(err.file_name())
    }
}

impl From<RenderError> for AppError {
    fn from(_: RenderError) -> Self {
        // 渲染器失败对外不做解释，具体原因由调用方记录到日志
        AppError::ImageRenderer
    }
}
