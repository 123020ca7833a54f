//! 优雅退出协调
//!
//! 信号处理（SIGINT/SIGTERM，Windows 下 Ctrl+C）与退出状态广播。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
    /// 应用主动请求退出
    Application,
}

#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("信号设置失败: {0}")]
    SignalSetup(String),
}

/// 优雅退出管理器。克隆后共享同一退出状态；只有第一次触发生效。
#[derive(Debug, Clone)]
pub struct ShutdownManager {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        let first = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        if first {
            info!("触发优雅退出: {:?}", reason);
        } else {
            debug!("重复的退出信号被忽略: {:?}", reason);
        }
    }

    /// 等待退出信号；已触发过则立即返回第一次的原因
    pub async fn wait_for_shutdown(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).unwrap_or(ShutdownReason::Application),
            // 发送端随 self 存活，通道不会在此关闭
            Err(_) => ShutdownReason::Application,
        }
    }

    /// 安装进程信号监听；收到信号后触发退出
    pub fn start_signal_handler(&self) -> Result<(), ShutdownError> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigint = signal(SignalKind::interrupt())
                .map_err(|e| ShutdownError::SignalSetup(e.to_string()))?;
            let mut sigterm = signal(SignalKind::terminate())
                .map_err(|e| ShutdownError::SignalSetup(e.to_string()))?;

            let manager = self.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("接收到SIGINT信号 (Ctrl+C)");
                        manager.trigger_shutdown(ShutdownReason::Interrupt);
                    }
                    _ = sigterm.recv() => {
                        info!("接收到SIGTERM信号");
                        manager.trigger_shutdown(ShutdownReason::Terminate);
                    }
                }
            });
        }

        #[cfg(not(unix))]
        {
            let manager = self.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("接收到Ctrl+C信号");
                        manager.trigger_shutdown(ShutdownReason::Interrupt);
                    }
                    Err(e) => tracing::warn!("监听Ctrl+C信号失败: {}", e),
                }
            });
        }

        Ok(())
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_then_wait_returns_immediately() {
        let manager = ShutdownManager::new();
        manager.trigger_shutdown(ShutdownReason::Application);
        assert_eq!(manager.wait_for_shutdown().await, ShutdownReason::Application);
    }

    #[tokio::test]
    async fn first_reason_wins() {
        let manager = ShutdownManager::new();
        manager.trigger_shutdown(ShutdownReason::Interrupt);
        manager.trigger_shutdown(ShutdownReason::Terminate);
        assert_eq!(manager.wait_for_shutdown().await, ShutdownReason::Interrupt);
    }

    #[tokio::test]
    async fn clones_observe_trigger_from_another_task() {
        let manager = ShutdownManager::new();
        let waiter = manager.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_shutdown().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.trigger_shutdown(ShutdownReason::Terminate);
        assert_eq!(handle.await.expect("join"), ShutdownReason::Terminate);
    }

    #[tokio::test]
    async fn wait_blocks_until_triggered() {
        let manager = ShutdownManager::new();
        let pending = tokio::time::timeout(Duration::from_millis(50), manager.wait_for_shutdown());
        assert!(pending.await.is_err());
    }
}
