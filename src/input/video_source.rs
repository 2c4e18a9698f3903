// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/input/video_source.rs - 视频输入源
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Lukeng Project

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::{Pixel, input};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::scaling::{context::Context as ScalingContext, flag::Flags};
use ffmpeg_next::util::frame::video::Video;
use image::RgbImage;
use tracing::debug;

use super::{Frame, FrameSource};
use crate::error::Error;

/// 视频输入源
///
/// 按解码顺序逐帧产出，帧序号从 0 开始。FFmpeg 的输入上下文与
/// 解码器随本结构体一起丢弃，所有退出路径共用这一条释放路径。
pub struct VideoSource {
  /// FFmpeg 输入上下文
  input_context: ffmpeg::format::context::Input,
  /// 视频流索引
  stream_index: usize,
  /// 视频解码器
  decoder: ffmpeg::decoder::Video,
  /// 像素格式转换上下文，统一转到 RGB24
  scaler: ScalingContext,
  /// 下一帧的序号
  next_index: u64,
  /// 源路径，仅用于错误信息
  path: String,
  /// 视频宽度
  width: u32,
  /// 视频高度
  height: u32,
  /// 帧率
  fps: f64,
  /// 时间基准（秒）
  time_base: f64,
  /// 是否已向解码器送入 EOF
  eof_sent: bool,
  /// 是否结束（耗尽或出错）
  finished: bool,
}

impl VideoSource {
  /// 创建一个新的视频输入源
  ///
  /// 打开失败统一报 [`Error::SourceUnavailable`]，此时尚未产出任何帧。
  pub fn new(path: &str) -> Result<Self, Error> {
    let unavailable = |reason: String| Error::SourceUnavailable {
      path: path.to_string(),
      reason,
    };

    ffmpeg::init().map_err(|e| unavailable(format!("无法初始化 FFmpeg: {e}")))?;

    let input_context = input(&path).map_err(|e| unavailable(format!("无法打开视频文件: {e}")))?;

    let stream = input_context
      .streams()
      .best(Type::Video)
      .ok_or_else(|| unavailable("找不到视频流".to_string()))?;
    let stream_index = stream.index();

    let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
      .and_then(|ctx| ctx.decoder().video())
      .map_err(|e| unavailable(format!("无法创建视频解码器: {e}")))?;

    let width = decoder.width();
    let height = decoder.height();

    let rate = stream.avg_frame_rate();
    let fps = if rate.denominator() != 0 {
      rate.numerator() as f64 / rate.denominator() as f64
    } else {
      0.0
    };

    let tb = stream.time_base();
    let time_base = if tb.denominator() != 0 {
      tb.numerator() as f64 / tb.denominator() as f64
    } else {
      0.0
    };

    let scaler = ScalingContext::get(
      decoder.format(),
      width,
      height,
      Pixel::RGB24,
      width,
      height,
      Flags::BILINEAR,
    )
    .map_err(|e| unavailable(format!("无法创建像素格式转换器: {e}")))?;

    debug!("视频源已打开: {} ({}x{} @ {:.2}fps)", path, width, height, fps);

    Ok(Self {
      input_context,
      stream_index,
      decoder,
      scaler,
      next_index: 0,
      path: path.to_string(),
      width,
      height,
      fps,
      time_base,
      eof_sent: false,
      finished: false,
    })
  }

  fn source_error(&self, reason: String) -> Error {
    Error::SourceUnavailable {
      path: self.path.clone(),
      reason,
    }
  }

  /// 解码下一帧，流自然结束时返回 `Ok(None)`
  fn decode_next(&mut self) -> Result<Option<Video>, ffmpeg::Error> {
    let mut decoded = Video::empty();
    loop {
      // 先尝试取出解码器里已经就绪的帧
      if self.decoder.receive_frame(&mut decoded).is_ok() {
        return Ok(Some(decoded));
      }
      if self.eof_sent {
        return Ok(None);
      }

      // 给解码器喂下一个属于视频流的数据包
      loop {
        match self.input_context.packets().next() {
          Some((stream, packet)) => {
            if stream.index() == self.stream_index {
              self.decoder.send_packet(&packet)?;
              break;
            }
          }
          None => {
            self.decoder.send_eof()?;
            self.eof_sent = true;
            break;
          }
        }
      }
    }
  }

  /// 把 RGB24 帧按行拷出，去掉 FFmpeg 的行对齐填充
  fn to_rgb_image(&mut self, decoded: &Video) -> Result<RgbImage, Error> {
    let mut rgb = Video::empty();
    self
      .scaler
      .run(decoded, &mut rgb)
      .map_err(|e| self.source_error(format!("像素格式转换失败: {e}")))?;

    let data = rgb.data(0);
    let row_bytes = self.width as usize * 3;
    let stride = rgb.stride(0);

    let mut pixels = Vec::with_capacity(row_bytes * self.height as usize);
    for y in 0..self.height as usize {
      let start = y * stride;
      pixels.extend_from_slice(&data[start..start + row_bytes]);
    }

    RgbImage::from_raw(self.width, self.height, pixels)
      .ok_or_else(|| self.source_error("无法构造 RGB 图像".to_string()))
  }
}

impl Iterator for VideoSource {
  type Item = Result<Frame, Error>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }

    let decoded = match self.decode_next() {
      Ok(Some(decoded)) => decoded,
      Ok(None) => {
        self.finished = true;
        return None;
      }
      Err(e) => {
        self.finished = true;
        return Some(Err(self.source_error(format!("解码失败: {e}"))));
      }
    };

    let timestamp_ms = decoded
      .timestamp()
      .map_or(0, |ts| (ts as f64 * self.time_base * 1000.0) as u64);

    let image = match self.to_rgb_image(&decoded) {
      Ok(image) => image,
      Err(e) => {
        self.finished = true;
        return Some(Err(e));
      }
    };

    let frame = Frame {
      image,
      index: self.next_index,
      timestamp_ms,
    };
    self.next_index += 1;
    Some(Ok(frame))
  }
}

impl FrameSource for VideoSource {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }

  fn fps(&self) -> Option<f64> {
    (self.fps > 0.0).then_some(self.fps)
  }
}
