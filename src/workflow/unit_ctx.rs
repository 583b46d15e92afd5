//! 单元处理上下文
//!
//! 封装"我正在处理第几个单元、属于哪个文档"这一信息

use std::fmt::Display;

use crate::models::UnitId;

/// 单元处理上下文
#[derive(Debug, Clone)]
pub struct UnitCtx {
    pub unit: UnitId,

    /// 在本轮提交中的序号（从 1 开始，仅用于日志显示）
    pub position: usize,

    /// 本轮提交的单元总数
    pub total: usize,
}

impl UnitCtx {
    pub fn new(unit: UnitId, position: usize, total: usize) -> Self {
        Self {
            unit,
            position,
            total,
        }
    }
}

impl Display for UnitCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[单元 {}/{} {}]", self.position, self.total, self.unit)
    }
}
