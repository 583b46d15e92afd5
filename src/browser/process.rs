//! 浏览器进程清理
//!
//! 尽力而为：命令不存在或没有匹配进程都只记录日志。

use tokio::process::Command;
use tracing::{debug, info, warn};

#[cfg(windows)]
fn kill_command() -> Command {
    let mut cmd = Command::new("taskkill");
    cmd.args(["/F", "/IM", "chrome.exe"]);
    cmd
}

#[cfg(not(windows))]
fn kill_command() -> Command {
    let mut cmd = Command::new("pkill");
    cmd.args(["-f", "chrome"]);
    cmd
}

/// 结束正在运行的 Chrome，返回是否结束了进程
pub async fn kill_running_browser() -> bool {
    match kill_command().output().await {
        Ok(output) if output.status.success() => {
            info!("已结束正在运行的 Chrome");
            true
        }
        Ok(output) => {
            debug!(
                "没有需要结束的 Chrome 进程: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        }
        Err(e) => {
            warn!("结束 Chrome 进程时出错: {}", e);
            false
        }
    }
}
