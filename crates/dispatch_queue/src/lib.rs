//! # Dispatch Queue
//!
//! 延迟工作分发模块。
//!
//! 负责：
//! - 将协议回调转交给专用 worker 线程执行
//! - 有界 FIFO，入队等待有上限，满则丢弃
//! - 参数私有拷贝，handler 返回后释放

pub mod error;
pub mod item;
pub mod metrics;
pub mod queue;
mod worker;

pub use contracts::{CopyHook, SharedHandler, WorkHandler, WorkParam};
pub use error::DispatchError;
pub use item::{Signal, WorkItem};
pub use metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use queue::DispatchQueue;
