// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/input/image_source.rs - 图片输入源
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

use image::{ImageReader, RgbImage};

use super::{Frame, FrameSource};
use crate::error::Error;

/// 图片输入源
///
/// 把单张图片当作只有一帧的视频，覆盖单帧评估的部署场景。
#[derive(Debug)]
pub struct ImageSource {
  /// 图片数据，取走后即视为耗尽
  image: Option<RgbImage>,
  /// 图片宽度
  width: u32,
  /// 图片高度
  height: u32,
}

impl ImageSource {
  /// 创建一个新的图片输入源
  pub fn new(path: &str) -> Result<Self, Error> {
    let image = ImageReader::open(path)
      .map_err(|e| Error::SourceUnavailable {
        path: path.to_string(),
        reason: format!("无法打开图片文件: {e}"),
      })?
      .decode()
      .map_err(|e| Error::SourceUnavailable {
        path: path.to_string(),
        reason: format!("无法解码图片文件: {e}"),
      })?
      .to_rgb8();

    let width = image.width();
    let height = image.height();

    Ok(Self {
      image: Some(image),
      width,
      height,
    })
  }
}

impl Iterator for ImageSource {
  type Item = Result<Frame, Error>;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take().map(|image| {
      Ok(Frame {
        image,
        index: 0,
        timestamp_ms: 0,
      })
    })
  }
}

impl FrameSource for ImageSource {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }

  fn fps(&self) -> Option<f64> {
    None
  }
}
