//! # PDF Translate Batch
//!
//! 通过浏览器驱动的翻译服务批量翻译 PDF：超出阈值的文档先拆分，
//! 各部分并发提交，取回译文后按原顺序合并，最后整理工作目录。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `PdfFile` - 读取、截取、拼接 PDF，原子写盘
//! - `JsExecutor` - 单个标签页，提供 eval / 等待 / 设置上传文件能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `Partitioner` - 按页数和体积拆分文档
//! - `Reassembler` - 按基础名分组、按序号合并
//! - `Reconciler` - 暂存目录 → 工作目录，清理部分文件
//! - `SkipSet` - 已翻译文档的跳过规则
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个单元"的完整处理流程
//! - `UnitCtx` - 上下文封装（单元标识 + 序号）
//! - `UnitFlow` - 提交 → 等待 → 记录
//! - `JobTracker` - 文档 → 单元 → 译文 的在途映射
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 规划、并发提交、合并、整理
//! - `orchestrator/document_processor` - 单个文档的跳过与拆分规划
//!
//! 翻译服务通过 `clients::TranslationClient` 抽象，浏览器实现位于 `browser/`。

pub mod browser;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_support;

// 重新导出常用类型
pub use clients::{SubmissionHandle, TranslationClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::PdfFile;
pub use models::{Artifact, Document, DocumentId, Part, PartName, UnitId, WorkUnit};
pub use orchestrator::{App, DocumentOutcome, RunReport};
pub use services::{Partitioner, Reassembler, Reconciler, SkipSet, SplitLimits};
pub use workflow::{JobTracker, UnitCtx, UnitFlow};
