// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/detector.rs - 检测输出解码器
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

use ndarray::{Array2, ArrayView2};

use crate::error::Error;

/// 每个候选框前 4 列是边界框几何值，本核心不使用
pub const BOX_ATTRS: usize = 4;

/// 候选框最少属性数：4 框 + 1 目标置信度 + 至少 1 个类别
pub const MIN_ATTRS: usize = BOX_ATTRS + 2;

/// 逻辑斯蒂激活，把原始 logit 映射到 (0,1)
///
/// 符号固定为 σ(x) = 1/(1+e^(−x))，取反会整体颠倒置信度刻度。
pub fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

/// 解码原始输出张量，产出逐候选框的检测置信度
///
/// 先做方向归一化：第一维小于第二维时转置，使行恒为候选框、列恒
/// 为属性。对目标置信度列和各类别列套用 sigmoid，类别概率取各列
/// 最大值（单类别时即该列本身），最终置信度为两者乘积，必然落在
/// [0,1]。零候选框产出空序列，不是错误。
pub fn decode_confidences(raw: &Array2<f32>) -> Result<Vec<f32>, Error> {
  if raw.is_empty() {
    return Ok(Vec::new());
  }

  let candidates: ArrayView2<'_, f32> = if raw.nrows() < raw.ncols() {
    raw.t()
  } else {
    raw.view()
  };

  if candidates.ncols() < MIN_ATTRS {
    return Err(Error::Decode {
      reason: format!(
        "候选框属性数不足: 期望至少 {MIN_ATTRS}, 实际 {}",
        candidates.ncols()
      ),
    });
  }

  let mut confidences = Vec::with_capacity(candidates.nrows());
  for row in candidates.rows() {
    let objectness = sigmoid(row[BOX_ATTRS]);
    let class_prob = row
      .iter()
      .skip(BOX_ATTRS + 1)
      .map(|&logit| sigmoid(logit))
      .fold(0.0f32, f32::max);
    confidences.push(objectness * class_prob);
  }

  Ok(confidences)
}

/// 单帧最大检测置信度，空输出按 0.0 处理
pub fn frame_confidence(raw: &Array2<f32>) -> Result<f32, Error> {
  Ok(decode_confidences(raw)?.into_iter().fold(0.0f32, f32::max))
}
