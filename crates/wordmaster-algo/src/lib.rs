//! # wordmaster-algo - 词汇学习核心算法库
//!
//! 本 crate 提供纯 Rust 实现的间隔重复算法:
//!
//! - **ReviewScheduler** - 基于艾宾浩斯遗忘曲线的固定间隔表调度
//! - **ProgressTracker** - 单词学习进度的状态转移 (learning / reviewing / mastered)
//!
//! ## 设计理念
//!
//! - **纯函数** - 无 I/O、无数据库、无全局状态，调用方传入快照并持久化结果
//! - **可复用** - 核心算法与 HTTP/存储层分离，可在任何 Rust 项目中使用
//! - **充分测试** - 所有算法都有完整的单元测试与性质测试
//!
//! ## 模块结构
//!
//! - [`scheduler`] - 复习调度 (间隔表、准确率调整)
//! - [`progress`] - 进度状态转移 (计数器、状态、个人难度)
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::Utc;
//! use wordmaster_algo::{apply_outcome, WordProgress, WordStatus};
//!
//! let now = Utc::now();
//! let progress = WordProgress::new(now);
//! let updated = apply_outcome(&progress, true, now);
//! assert_eq!(updated.correct_count, 1);
//! assert_eq!(updated.status, WordStatus::Reviewing);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod progress;
pub mod scheduler;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

/// 重新导出复习调度函数
pub use scheduler::{accuracy_percent, next_review};

/// 重新导出进度状态转移函数
pub use progress::apply_outcome;
