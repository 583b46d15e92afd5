//! 标签页执行器 - 基础设施层
//!
//! 持有一个标签页，只暴露"执行 JS""等待脚本结果""给文件输入框设置文件"这几项能力。

use std::path::Path;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::BrowserError;

/// 标签页执行器
///
/// - 每个提交单元独占一个
/// - 不认识文档或部分，只做页面操作
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, BrowserError> {
        let result = self.page.evaluate(js_code.into()).await?;
        Ok(result.into_value()?)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, BrowserError> {
        let json_value = self.eval(js_code).await?;
        Ok(serde_json::from_value(json_value)?)
    }

    /// 反复执行脚本，直到返回非空字符串或超时
    ///
    /// 脚本必须返回字符串，空串表示"还没有"
    pub async fn poll_string(
        &self,
        js_code: &str,
        timeout: Duration,
        interval: Duration,
        what: &str,
    ) -> Result<String, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            let value: String = self.eval_as(js_code).await?;
            if !value.is_empty() {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementTimeout {
                    selector: what.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            sleep(interval).await;
        }
    }

    /// 等待元素出现
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let script = format!(
            "document.querySelector({}) ? 'ok' : ''",
            serde_json::to_string(selector)?
        );
        self.poll_string(&script, timeout, Duration::from_millis(500), selector)
            .await
            .map(|_| ())
    }

    /// 给 `selector` 指向的文件输入框设置文件
    pub async fn set_input_file(&self, selector: &str, file: &Path) -> Result<(), BrowserError> {
        let element = self.page.find_element(selector).await?;
        let mut params = SetFileInputFilesParams::new(vec![file.to_string_lossy().into_owned()]);
        params.backend_node_id = Some(element.backend_node_id);
        self.page.execute(params).await?;
        debug!("已设置上传文件: {}", file.display());
        Ok(())
    }
}
