//! 配置文件 + 文件数据源端到端测试

use legged_sdk::settings;
use legged_sdk::stream::{LossyPipeline, PumpExit, ReaderSource, WriterSink, pump};
use legged_sdk::tools::{ClientConfig, PcmFormat};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use tempfile::tempdir;

#[test]
fn test_config_driven_file_stream() {
    let dir = tempdir().unwrap();

    // 大容量 + 快速消费：文件内容应完整到达
    let mut config = ClientConfig::default();
    config.stream.capacity = 64;
    config.stream.chunk_ms = 20;
    config.stream.idle_backoff_ms = 1;
    let config_path = dir.path().join("legged").join("config.toml");
    config.save_to_file(&config_path).unwrap();

    let config = ClientConfig::load_from_file(&config_path).unwrap();
    let chunk_size = settings::chunk_bytes(&config, &PcmFormat::VOICE);
    assert_eq!(chunk_size, 960);

    // 10.5 块的 PCM 数据
    let input: Vec<u8> = (0..chunk_size * 10 + chunk_size / 2)
        .map(|i| (i % 251) as u8)
        .collect();
    let input_path = dir.path().join("capture.raw");
    fs::write(&input_path, &input).unwrap();

    let source = ReaderSource::new(File::open(&input_path).unwrap(), chunk_size);
    let pipeline = LossyPipeline::new(source, settings::pipeline_config(&config)).unwrap();
    pipeline.start().unwrap();

    let output_path = dir.path().join("published.raw");
    let mut sink = WriterSink::new(BufWriter::new(File::create(&output_path).unwrap()));
    let report = pump(&pipeline, &mut sink, &settings::pump_options(&config), || true).unwrap();
    pipeline.stop().unwrap();
    sink.into_inner().flush().unwrap();

    assert_eq!(report.exit, PumpExit::Finished);
    assert_eq!(report.chunks, 11);
    assert_eq!(pipeline.stats().dropped, 0);
    assert_eq!(fs::read(&output_path).unwrap(), input);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[stream]\ncapacity = 0\n").unwrap();

    let err = ClientConfig::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("capacity"));
}
