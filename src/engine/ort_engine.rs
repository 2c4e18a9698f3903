// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/engine/ort_engine.rs - onnxruntime 推理引擎
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

use ndarray::{Array2, Array4};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use tracing::info;

use super::InferenceEngine;

/// onnxruntime 引擎错误
#[derive(Debug, thiserror::Error)]
pub enum OrtEngineError {
  #[error(transparent)]
  Ort(#[from] ort::Error),

  #[error("输入张量内存布局不连续")]
  NonContiguousInput,

  #[error("输出张量维度非法: {0:?}")]
  BadOutputShape(Vec<i64>),
}

/// onnxruntime 推理引擎
///
/// 封装一个 ONNX Runtime 会话。会话在 [`OrtEngine::load`] 时创建
/// 一次，之后跨请求复用；`Session::run` 需要独占借用，本身不保证
/// 跨线程共享。
pub struct OrtEngine {
  session: Session,
}

impl OrtEngine {
  /// 从模型文件加载推理会话
  pub fn load(model_path: &str) -> Result<Self, OrtEngineError> {
    let session = Session::builder()?
      .with_optimization_level(GraphOptimizationLevel::Level3)?
      .with_intra_threads(4)?
      .commit_from_file(model_path)?;

    info!("模型加载完成: {}", model_path);

    Ok(Self { session })
  }
}

impl InferenceEngine for OrtEngine {
  type Error = OrtEngineError;

  fn run(&mut self, input: &Array4<f32>) -> Result<Array2<f32>, Self::Error> {
    let (batch, channels, height, width) = input.dim();
    let data = input
      .as_slice()
      .ok_or(OrtEngineError::NonContiguousInput)?
      .to_vec()
      .into_boxed_slice();
    let value = Tensor::from_array(([batch, channels, height, width], data))?;

    let outputs = self.session.run(ort::inputs![value])?;
    let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;

    // 去掉前导的大小为 1 的 batch 维，剩余两维的方向交由解码器判定
    let raw_dims: Vec<i64> = shape.iter().copied().collect();
    let mut dims: Vec<usize> = raw_dims.iter().map(|&d| d.max(0) as usize).collect();
    while dims.len() > 2 && dims[0] == 1 {
      dims.remove(0);
    }

    match dims.as_slice() {
      [rows, cols] => Array2::from_shape_vec((*rows, *cols), data.to_vec())
        .map_err(|_| OrtEngineError::BadOutputShape(raw_dims)),
      _ => Err(OrtEngineError::BadOutputShape(raw_dims)),
    }
  }
}
