//! 浏览器适配层
//!
//! 连接或启动浏览器，并提供基于浏览器的 `TranslationClient` 实现。

pub mod connection;
pub mod headless;
pub mod process;
pub mod readable_client;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;
pub use process::kill_running_browser;
pub use readable_client::ReadableClient;

use chromiumoxide::Browser;

use crate::config::Config;
use crate::error::BrowserError;

/// 按配置获取浏览器：端口为 0 时启动无头浏览器，否则连接调试端口
pub async fn open_browser(config: &Config) -> Result<Browser, BrowserError> {
    if config.kill_browser_first {
        kill_running_browser().await;
    }
    if config.browser_debug_port == 0 {
        launch_headless_browser().await
    } else {
        connect_to_browser(config.browser_debug_port).await
    }
}
