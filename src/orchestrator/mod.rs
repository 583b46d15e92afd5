//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整个流水线的阶段调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 持有翻译客户端（浏览器）
//! - 控制并发数量（Semaphore）
//! - 依次执行：规划 → 提交 → 合并 → 整理 → 汇总
//!
//! ### `document_processor` - 单个文档的规划
//! - 跳过规则、残留部分文件、拆分
//!
//! ### `report` - 运行结果
//! - 每个文档一条结论，决定退出码
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理整个工作目录)
//!     ↓
//! document_processor (处理单个文档的规划)
//!     ↓
//! workflow::UnitFlow (处理单个提交单元)
//!     ↓
//! services (能力层：拆分 / 合并 / 整理)
//!     ↓
//! infrastructure (基础设施：PdfFile / JsExecutor)
//! ```

pub mod batch_processor;
pub mod document_processor;
pub mod report;

pub use batch_processor::App;
pub use document_processor::{DocumentPlanner, PlannedDocument, WorkPlan};
pub use report::{DocumentOutcome, DocumentReport, RunReport};
