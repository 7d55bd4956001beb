//! PCM 音频格式
//!
//! 原始（无头）线性 PCM，小端，多声道交错。用于把"每块多少毫秒"换算成
//! 采集数据源每次读取的字节数。

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// PCM 格式描述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PcmFormat {
    /// 采样率（Hz）
    pub sample_rate: u32,
    /// 声道数
    pub channels: u16,
    /// 每个采样的字节数（1 / 2 / 4）
    pub bytes_per_sample: u16,
}

impl PcmFormat {
    /// 语音采集格式：24 kHz / 单声道 / 16-bit
    pub const VOICE: Self = Self {
        sample_rate: 24_000,
        channels: 1,
        bytes_per_sample: 2,
    };

    pub const fn new(sample_rate: u32, channels: u16, bytes_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bytes_per_sample,
        }
    }

    /// 一帧（所有声道各一个采样）的字节数
    pub const fn frame_size(&self) -> usize {
        self.channels as usize * self.bytes_per_sample as usize
    }

    pub const fn bytes_per_second(&self) -> usize {
        self.sample_rate as usize * self.frame_size()
    }

    /// 指定时长对应的块大小（字节）
    ///
    /// 向下取整到整帧，保证块边界不会切开一个采样。
    ///
    /// ```
    /// use legged_tools::PcmFormat;
    /// use std::time::Duration;
    ///
    /// assert_eq!(PcmFormat::VOICE.bytes_per_chunk(Duration::from_millis(100)), 4800);
    /// ```
    pub fn bytes_per_chunk(&self, duration: Duration) -> usize {
        let frame = self.frame_size();
        if frame == 0 {
            return 0;
        }
        let frames = u128::from(self.sample_rate) * duration.as_micros() / 1_000_000;
        usize::try_from(frames)
            .unwrap_or(usize::MAX / frame)
            .saturating_mul(frame)
    }

    /// 指定字节数对应的播放时长
    pub fn chunk_duration(&self, bytes: usize) -> Duration {
        let per_second = self.bytes_per_second();
        if per_second == 0 {
            return Duration::ZERO;
        }
        let micros = bytes as u128 * 1_000_000 / per_second as u128;
        Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }

    /// `arecord` 的采样格式名（不支持的位宽返回 `None`）
    pub fn alsa_format(&self) -> Option<&'static str> {
        match self.bytes_per_sample {
            1 => Some("U8"),
            2 => Some("S16_LE"),
            3 => Some("S24_3LE"),
            4 => Some("S32_LE"),
            _ => None,
        }
    }

    /// 以原始 PCM 输出到标准输出的 `arecord` 命令行
    ///
    /// ```
    /// use legged_tools::PcmFormat;
    ///
    /// assert_eq!(
    ///     PcmFormat::VOICE.capture_command().as_deref(),
    ///     Some("arecord -q -t raw -f S16_LE -c 1 -r 24000")
    /// );
    /// ```
    pub fn capture_command(&self) -> Option<String> {
        let format = self.alsa_format()?;
        Some(format!(
            "arecord -q -t raw -f {} -c {} -r {}",
            format, self.channels, self.sample_rate
        ))
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::VOICE
    }
}
