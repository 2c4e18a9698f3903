// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/preprocess.rs - 帧预处理
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

use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;

use crate::error::Error;

/// 模型输入边长
pub const INPUT_SIZE: u32 = 640;

const CHANNELS: usize = 3;

/// 把一帧 RGB 图像转换为模型输入张量
///
/// 步骤：拉伸缩放到 640×640（不保持宽高比）；像素值除以 255 归一
/// 化到 [0,1]；HWC 转 CHW；最后加上大小为 1 的 batch 维，得到
/// (1, 3, 640, 640) 的 f32 张量。输入源已统一产出 RGB 顺序，无需
/// 再做通道交换。
pub fn preprocess(image: &RgbImage) -> Result<Array4<f32>, Error> {
  let resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

  let side = INPUT_SIZE as usize;
  let plane = side * side;
  let mut data = vec![0f32; CHANNELS * plane];

  // pixels() 按行优先遍历，正好对应 HWC 的展平顺序
  for (idx, pixel) in resized.pixels().enumerate() {
    data[idx] = f32::from(pixel[0]) / 255.0;
    data[plane + idx] = f32::from(pixel[1]) / 255.0;
    data[2 * plane + idx] = f32::from(pixel[2]) / 255.0;
  }

  Array4::from_shape_vec((1, CHANNELS, side, side), data).map_err(|e| Error::Preprocess {
    reason: format!("张量形状构造失败: {e}"),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn output_shape_is_nchw() {
    let image = RgbImage::new(320, 240);
    let tensor = preprocess(&image).unwrap();
    assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
  }

  #[test]
  fn uniform_red_maps_to_first_channel() {
    let image = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
    let tensor = preprocess(&image).unwrap();

    for value in tensor.index_axis(ndarray::Axis(1), 0).iter() {
      assert!(*value > 0.95, "R 通道应接近 1.0，实际 {value}");
    }
    for channel in 1..3 {
      for value in tensor.index_axis(ndarray::Axis(1), channel).iter() {
        assert!(*value < 0.05, "非 R 通道应接近 0.0，实际 {value}");
      }
    }
  }

  #[test]
  fn values_stay_in_unit_interval() {
    let mut image = RgbImage::new(13, 7);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
      *pixel = Rgb([(x * 19) as u8, (y * 37) as u8, 255]);
    }

    let tensor = preprocess(&image).unwrap();
    assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
  }
}
