//! # Bridge
//!
//! 协议引擎与两个子系统之间的桥接层。
//!
//! 负责：
//! - 分发队列与音频流的生命周期管理
//! - 将协议事件路由到对应 handler
//! - 提供模拟协议引擎，用于无硬件环境下的开发与测试

pub mod bridge;
pub mod error;
pub mod handlers;
pub mod mock_engine;
pub mod router;

pub use crate::bridge::{Bridge, BridgeSnapshot};
pub use error::BridgeError;
pub use handlers::LoggingHandler;
pub use mock_engine::{MockEngineConfig, MockProtocolEngine};
pub use router::{ProfileHandlers, ProfileRouter};
