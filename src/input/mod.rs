// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/input/mod.rs - 输入源模块
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

mod image_source;
#[cfg(feature = "ffmpeg_input")]
mod video_source;

use image::RgbImage;

pub use image_source::ImageSource;
#[cfg(feature = "ffmpeg_input")]
pub use video_source::VideoSource;

use crate::error::Error;

/// 帧数据
pub struct Frame {
  /// RGB 图像数据
  pub image: RgbImage,
  /// 帧在源视频中的序号，从 0 开始
  pub index: u64,
  /// 时间戳（毫秒）
  pub timestamp_ms: u64,
}

/// 输入源 trait
///
/// 顺序拉取、有限、不可重放。底层句柄（解码器、文件）在输入源
/// 被丢弃时释放，无论正常耗尽、提前终止还是出错。
pub trait FrameSource: Iterator<Item = Result<Frame, Error>> {
  /// 获取帧宽度
  fn width(&self) -> u32;

  /// 获取帧高度
  fn height(&self) -> u32;

  /// 获取帧率（如果适用）
  fn fps(&self) -> Option<f64>;
}

impl std::fmt::Debug for dyn FrameSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FrameSource")
      .field("width", &self.width())
      .field("height", &self.height())
      .field("fps", &self.fps())
      .finish()
  }
}

const IMAGE_EXTS: [&str; 6] = [".jpg", ".jpeg", ".png", ".bmp", ".gif", ".webp"];

/// 从路径创建输入源
///
/// 图片文件作为单帧输入源，其余路径视为视频文件。
/// 打开失败在产出任何帧之前返回 [`Error::SourceUnavailable`]。
pub fn open_source(path: &str) -> Result<Box<dyn FrameSource>, Error> {
  let lower = path.to_lowercase();
  if IMAGE_EXTS.iter().any(|ext| lower.ends_with(ext)) {
    return Ok(Box::new(ImageSource::new(path)?));
  }

  #[cfg(feature = "ffmpeg_input")]
  {
    Ok(Box::new(VideoSource::new(path)?) as Box<dyn FrameSource>)
  }

  #[cfg(not(feature = "ffmpeg_input"))]
  {
    Err(Error::SourceUnavailable {
      path: path.to_string(),
      reason: "视频输入未启用，请打开 ffmpeg_input 特性".to_string(),
    })
  }
}
