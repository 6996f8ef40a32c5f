//! 桥接指标收集模块
//!
//! 分发队列与音频环形缓冲区的 Prometheus 指标名称集中在这里定义。

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// 分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted,
    QueueFull,
    NotRunning,
    AllocationFailed,
}

impl DispatchOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::QueueFull => "queue_full",
            Self::NotRunning => "not_running",
            Self::AllocationFailed => "allocation_failed",
        }
    }
}

/// 音频块准入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Admitted,
    BufferFull,
    Oversized,
    Empty,
    NotRunning,
}

impl ChunkOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::BufferFull => "buffer_full",
            Self::Oversized => "oversized",
            Self::Empty => "empty",
            Self::NotRunning => "not_running",
        }
    }
}

/// 记录一次分发请求
pub fn record_work_dispatch(outcome: DispatchOutcome) {
    counter!(
        "bridge_work_dispatch_total",
        "status" => outcome.as_str()
    )
    .increment(1);
}

/// 记录工作项处理完成 (排队延迟)
pub fn record_work_processed(queue_latency: Duration, panicked: bool) {
    let status = if panicked { "panicked" } else { "ok" };
    counter!("bridge_work_processed_total", "status" => status).increment(1);
    histogram!("bridge_work_queue_latency_ms").record(queue_latency.as_secs_f64() * 1000.0);
}

/// 记录音频块准入
pub fn record_audio_chunk(outcome: ChunkOutcome, len: usize) {
    counter!("bridge_audio_chunks_total", "status" => outcome.as_str()).increment(1);
    if outcome == ChunkOutcome::Admitted {
        counter!("bridge_audio_bytes_admitted_total").increment(len as u64);
    } else {
        counter!("bridge_audio_bytes_dropped_total").increment(len as u64);
    }
}

/// 记录一次 sink 写入
pub fn record_sink_write(sink_name: &str, requested: usize, written: usize) {
    counter!(
        "bridge_sink_bytes_written_total",
        "sink" => sink_name.to_string()
    )
    .increment(written as u64);
    histogram!("bridge_sink_run_bytes").record(requested as f64);
    if written < requested {
        counter!(
            "bridge_sink_short_writes_total",
            "sink" => sink_name.to_string()
        )
        .increment(1);
    }
}

/// 记录环形缓冲区占用
pub fn record_ring_occupancy(occupied: usize, capacity: usize) {
    gauge!("bridge_ring_occupied_bytes").set(occupied as f64);
    if capacity > 0 {
        gauge!("bridge_ring_fill_ratio").set(occupied as f64 / capacity as f64);
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
