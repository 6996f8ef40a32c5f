//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需蓝牙协议栈）
//! - 生命周期与配置加载联调

#[cfg(test)]
mod support {
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use contracts::{ProfileEvent, SharedHandler, WorkParam};

    /// Handler forwarding every typed event to a channel
    pub fn channel_handler() -> (SharedHandler, mpsc::Receiver<(u16, ProfileEvent)>) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let handler: SharedHandler = Arc::new(move |event_id: u16, param: Option<&WorkParam>| {
            if let Some(event) = param.and_then(WorkParam::as_profile) {
                let _ = tx.lock().unwrap().send((event_id, event.clone()));
            }
        });
        (handler, rx)
    }

    /// Poll `cond` until it holds or `timeout` passes
    pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        cond()
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{
        A2dpEvent, AvrcControllerEvent, AvrcTargetEvent, ConnectionState, ProfileEvent,
    };

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_event_codes_are_stable() {
        let peer = [0; 6];
        let cases = [
            (
                ProfileEvent::A2dp(A2dpEvent::ConnectionState {
                    peer,
                    state: ConnectionState::Connected,
                }),
                0,
            ),
            (
                ProfileEvent::A2dp(A2dpEvent::ProfileState { initialized: true }),
                4,
            ),
            (
                ProfileEvent::AvrcController(AvrcControllerEvent::Metadata {
                    attr_id: 1,
                    text: String::new(),
                }),
                2,
            ),
            (
                ProfileEvent::AvrcTarget(AvrcTargetEvent::SetAbsoluteVolume { volume: 10 }),
                4,
            ),
        ];
        for (event, code) in cases {
            assert_eq!(event.code(), code, "{event:?}");
        }

        assert!(!A2dpEvent::Unsupported { code: 3 }.is_supported());
        assert!(!AvrcTargetEvent::Unsupported { code: 3 }.is_supported());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use audio_stream::MemorySink;
    use bridge::{Bridge, MockEngineConfig, MockProtocolEngine, ProfileHandlers};
    use contracts::{
        A2dpEvent, AudioState, AvrcControllerEvent, BridgeConfig, ConnectionState, ProfileEvent,
    };

    use crate::support::{channel_handler, wait_until};

    /// End-to-end: MockProtocolEngine -> ProfileRouter -> AudioStream -> MemorySink
    ///
    /// 验证完整的音频数据流：
    /// 1. 模拟引擎生成 PCM 包
    /// 2. 环形缓冲区准入并由写线程排空
    /// 3. Sink 收到帧对齐且顺序正确的字节
    #[test]
    fn test_e2e_mock_audio() {
        let sink = MemorySink::new("capture");
        let bridge = Bridge::new(&BridgeConfig::default(), Box::new(sink.clone()));
        bridge.start().unwrap();

        let router = Arc::new(bridge.router(ProfileHandlers::default()));
        let engine = MockProtocolEngine::new(
            MockEngineConfig {
                paced: false,
                ..MockEngineConfig::default()
            },
            Arc::clone(&router),
        );
        engine.start().unwrap();

        assert!(wait_until(Duration::from_secs(5), || sink.len() >= 64 * 1024));
        engine.stop();
        assert!(!engine.is_running());

        // drain what is still buffered before stopping the stream
        let audio = Arc::clone(bridge.audio_stream());
        assert!(wait_until(Duration::from_secs(5), || audio.buffered_len() == 0));
        let metrics = audio.metrics().snapshot();
        assert!(wait_until(Duration::from_secs(5), || {
            audio.metrics().written_bytes() == metrics.admitted_bytes
        }));
        bridge.stop();

        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.audio.written_bytes, snapshot.audio.admitted_bytes);
        assert_eq!(sink.len() as u64, snapshot.audio.written_bytes);
        assert_eq!(router.packet_count(), engine.packets_sent());
        assert_eq!(
            snapshot.audio.admitted_chunks + snapshot.audio.dropped_chunks,
            engine.packets_sent()
        );

        // whole stereo frames only, both channels carrying the same sample
        let data = sink.contents();
        assert_eq!(data.len() % 4, 0);
        for frame in data.chunks_exact(4) {
            assert_eq!(frame[..2], frame[2..]);
        }
    }

    /// Connection handshake arrives at the handlers in the order the engine
    /// raised it, and teardown follows once the engine stops
    #[test]
    fn test_e2e_event_order() {
        let (handler, rx) = channel_handler();
        let bridge = Bridge::new(&BridgeConfig::default(), Box::new(MemorySink::new("mem")));
        bridge.start().unwrap();

        let router = Arc::new(bridge.router(ProfileHandlers::uniform(handler)));
        let config = MockEngineConfig::default();
        let peer = config.peer;
        let engine = MockProtocolEngine::new(config, router);
        engine.start().unwrap();

        let wait = Duration::from_secs(5);
        let expected = [
            ProfileEvent::A2dp(A2dpEvent::ProfileState { initialized: true }),
            ProfileEvent::A2dp(A2dpEvent::ConnectionState {
                peer,
                state: ConnectionState::Connecting,
            }),
            ProfileEvent::A2dp(A2dpEvent::ConnectionState {
                peer,
                state: ConnectionState::Connected,
            }),
            ProfileEvent::AvrcController(AvrcControllerEvent::ConnectionState {
                peer,
                connected: true,
            }),
        ];
        for want in expected {
            let (id, got) = rx.recv_timeout(wait).unwrap();
            assert_eq!(id, want.code());
            assert_eq!(got, want);
        }

        // remaining handshake, up to the start of streaming
        loop {
            let (_, event) = rx.recv_timeout(wait).unwrap();
            if matches!(
                event,
                ProfileEvent::A2dp(A2dpEvent::AudioState {
                    state: AudioState::Started,
                    ..
                })
            ) {
                break;
            }
        }

        engine.stop();

        let mut saw_suspend = false;
        loop {
            let (_, event) = rx.recv_timeout(wait).unwrap();
            match event {
                ProfileEvent::A2dp(A2dpEvent::AudioState {
                    state: AudioState::Suspended,
                    ..
                }) => saw_suspend = true,
                ProfileEvent::A2dp(A2dpEvent::ConnectionState {
                    state: ConnectionState::Disconnected,
                    ..
                }) => break,
                _ => {}
            }
        }
        assert!(saw_suspend);
        bridge.stop();
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use audio_stream::MemorySink;
    use bridge::{Bridge, ProfileHandlers};
    use contracts::{A2dpEvent, AvrcTargetEvent, BridgeConfig};

    use crate::support::{channel_handler, wait_until};

    #[test]
    fn test_stopped_bridge_drops_everything() {
        let (handler, rx) = channel_handler();
        let sink = MemorySink::new("mem");
        let bridge = Bridge::new(&BridgeConfig::default(), Box::new(sink.clone()));
        let router = bridge.router(ProfileHandlers::uniform(handler));

        assert!(!router.on_a2dp_event(A2dpEvent::ProfileState { initialized: true }));
        assert_eq!(router.on_audio_data(&[1; 64]), 0);

        bridge.start().unwrap();
        bridge.start().unwrap();
        assert!(router.on_avrc_target_event(AvrcTargetEvent::SetAbsoluteVolume { volume: 1 }));
        assert_eq!(router.on_audio_data(&[1; 64]), 64);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert!(wait_until(Duration::from_secs(2), || sink.len() == 64));

        bridge.stop();
        bridge.stop();
        assert!(!router.on_a2dp_event(A2dpEvent::ProfileState { initialized: true }));
        assert_eq!(router.on_audio_data(&[1; 64]), 0);
    }

    #[test]
    fn test_restart_keeps_sink() {
        let sink = MemorySink::new("mem");
        let bridge = Bridge::new(&BridgeConfig::default(), Box::new(sink.clone()));
        let audio = Arc::clone(bridge.audio_stream());

        for round in 0..3u8 {
            bridge.start().unwrap();
            assert_eq!(audio.submit_audio(&[round; 100]), 100);
            assert!(wait_until(Duration::from_secs(2), || sink.len()
                == 100 * (usize::from(round) + 1)));
            bridge.stop();
        }

        let data = sink.contents();
        assert!(data[..100].iter().all(|&b| b == 0));
        assert!(data[200..].iter().all(|&b| b == 2));
    }
}

#[cfg(test)]
mod config_tests {
    use std::path::Path;

    use bridge::Bridge;
    use config_loader::ConfigLoader;

    const FILE_SINK_TOML: &str = r#"
version = "V1"

[dispatch]
queue_capacity = 4
send_timeout_ms = 5

[audio]
ring_capacity = 4096
max_chunk_len = 1024
max_run_len = 512

[sink]
name = "pcm_file"
sink_type = "file"
"#;

    fn write_config(dir: &Path, pcm_path: &Path) -> std::path::PathBuf {
        let content = format!(
            "{FILE_SINK_TOML}\n[sink.params]\npath = \"{}\"\n",
            pcm_path.display()
        );
        let path = dir.join("bridge.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Config file -> Bridge::from_config -> file on disk
    #[test]
    fn test_config_file_drives_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let pcm_path = dir.path().join("out").join("capture.pcm");
        let config_path = write_config(dir.path(), &pcm_path);

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        assert_eq!(config.dispatch.queue_capacity, 4);
        assert_eq!(config.audio.max_run_len, 512);

        let bridge = Bridge::from_config(&config).unwrap();
        assert_eq!(bridge.audio_stream().sink_name(), "pcm_file");
        bridge.start().unwrap();

        let audio = bridge.audio_stream();
        assert_eq!(audio.submit_audio(&[7; 1000]), 1000);
        assert_eq!(audio.submit_audio(&[1; 1025]), 0);
        assert!(crate::support::wait_until(
            std::time::Duration::from_secs(2),
            || audio.metrics().written_bytes() == 1000
        ));
        bridge.stop();

        let written = std::fs::read(&pcm_path).unwrap();
        assert_eq!(written, vec![7; 1000]);
    }

    #[test]
    fn test_invalid_config_never_builds_bridge() {
        let content = FILE_SINK_TOML.replace("max_run_len = 512", "max_run_len = 8192");
        let err = ConfigLoader::load_from_str(&content, config_loader::ConfigFormat::Toml)
            .unwrap_err();
        assert!(err.to_string().contains("max_run_len"));
    }

    #[test]
    fn test_sample_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../bridge.toml");
        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.dispatch.queue_capacity, 10);
        assert_eq!(config.audio.ring_capacity, 8192);
        assert_eq!(config.sink.paced_byte_rate, Some(176_400));
        assert_eq!(config.sink.params["path"], "out/capture.pcm");
    }
}
