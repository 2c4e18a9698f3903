// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/pipeline.rs - 逐帧评估流水线
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

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::detector::frame_confidence;
use crate::engine::InferenceEngine;
use crate::error::Error;
use crate::input::{Frame, open_source};
use crate::preprocess::preprocess;
use crate::sampler::SampledFrames;

/// 流水线配置
///
/// 两种已知部署形态都通过配置表达：逐帧采样（步长 5、阈值 0.6）
/// 与单帧评估（步长 1、阈值 0.5）。
#[derive(Debug, Clone)]
pub struct PipelineConfig {
  /// 帧采样步长，每 S 帧处理一帧
  pub stride: u32,
  /// 判定阈值，最大置信度严格大于该值即判定检出
  pub threshold: f32,
  /// 最大处理帧数，0 表示无限制
  pub max_frames: u64,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      stride: 5,
      threshold: 0.6,
      max_frames: 0,
    }
  }
}

/// 整段视频的判定结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
  Detected,
  Clear,
}

/// 整段视频的评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoResult {
  pub verdict: Verdict,
  /// 全片最大检测置信度，序列化时保留 4 位小数
  #[serde(serialize_with = "round_to_4dp")]
  pub max_confidence: f32,
  /// 取得最大置信度的帧序号；没有任何帧给出有效结果时为 None
  #[serde(skip_serializing_if = "Option::is_none")]
  pub frame_index: Option<u64>,
}

fn round_to_4dp<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_f32((value * 10_000.0).round() / 10_000.0)
}

/// 置信度聚合器
///
/// 一段视频处理期间唯一的可变状态：运行中的最大置信度及其帧序号。
#[derive(Debug, Default)]
pub struct Aggregator {
  max_confidence: f32,
  frame_index: Option<u64>,
}

impl Aggregator {
  pub fn new() -> Self {
    Self::default()
  }

  /// 记录一帧的最大置信度
  ///
  /// 严格大于当前最大值才替换，打平时保留最早出现的帧。
  pub fn observe(&mut self, index: u64, confidence: f32) {
    if confidence > self.max_confidence {
      self.max_confidence = confidence;
      self.frame_index = Some(index);
    }
  }

  pub fn max_confidence(&self) -> f32 {
    self.max_confidence
  }

  pub fn frame_index(&self) -> Option<u64> {
    self.frame_index
  }
}

/// 判定：最大置信度严格大于阈值即为检出
pub fn decide(max_confidence: f32, threshold: f32) -> Verdict {
  if max_confidence > threshold {
    Verdict::Detected
  } else {
    Verdict::Clear
  }
}

/// 对一段帧序列运行完整流水线
///
/// 单线程同步循环：采样 → 预处理 → 推理 → 解码 → 聚合，帧序列
/// 耗尽后做一次判定。除流结束之外的任何逐帧失败都终止整段视频的
/// 评估。帧与张量逐次创建、逐次丢弃。
pub fn run_pipeline<I, E>(
  frames: I,
  engine: &mut E,
  config: &PipelineConfig,
) -> Result<VideoResult, Error>
where
  I: Iterator<Item = Result<Frame, Error>>,
  E: InferenceEngine,
{
  let mut aggregator = Aggregator::new();
  let mut processed = 0u64;

  for frame in SampledFrames::new(frames, config.stride) {
    if config.max_frames > 0 && processed >= config.max_frames {
      info!("已达到最大帧数限制: {}", config.max_frames);
      break;
    }

    let frame = frame?;
    let input = preprocess(&frame.image)?;
    let raw = engine.run(&input).map_err(|e| Error::Inference {
      source: Box::new(e),
    })?;
    let confidence = frame_confidence(&raw)?;

    debug!("帧 {} 最大置信度: {:.4}", frame.index, confidence);
    aggregator.observe(frame.index, confidence);
    processed += 1;
  }

  let max_confidence = aggregator.max_confidence();
  let verdict = decide(max_confidence, config.threshold);
  info!(
    "评估完成: 处理 {} 帧, 最大置信度 {:.4}, 结论 {:?}",
    processed, max_confidence, verdict
  );

  Ok(VideoResult {
    verdict,
    max_confidence,
    frame_index: aggregator.frame_index(),
  })
}

/// 评估一个视频或图片文件
///
/// 打开输入源后交给 [`run_pipeline`]；输入源在本函数返回时随作用
/// 域释放，出错提前返回也走同一条释放路径。
pub fn evaluate<E: InferenceEngine>(
  path: &str,
  engine: &mut E,
  config: &PipelineConfig,
) -> Result<VideoResult, Error> {
  let source = open_source(path)?;
  run_pipeline(source, engine, config)
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::RgbImage;
  use ndarray::{Array2, Array4};
  use std::collections::VecDeque;

  fn logit(p: f32) -> f32 {
    (p / (1.0 - p)).ln()
  }

  fn frames(count: u64) -> impl Iterator<Item = Result<Frame, Error>> {
    (0..count).map(|index| {
      Ok(Frame {
        image: RgbImage::new(4, 4),
        index,
        timestamp_ms: index * 40,
      })
    })
  }

  /// 每个候选框 6 列：4 框 + 1 目标 + 1 类别
  fn output_with_confidence(p: f32) -> Array2<f32> {
    let mut raw = Array2::from_elem((8, 6), -40.0f32);
    raw[[0, 4]] = 40.0;
    raw[[0, 5]] = logit(p);
    raw
  }

  /// 按预设顺序逐帧吐出输出张量的确定性假引擎
  struct FakeEngine {
    outputs: VecDeque<Array2<f32>>,
  }

  impl FakeEngine {
    fn new(outputs: Vec<Array2<f32>>) -> Self {
      Self {
        outputs: outputs.into(),
      }
    }
  }

  impl InferenceEngine for FakeEngine {
    type Error = std::convert::Infallible;

    fn run(&mut self, _input: &Array4<f32>) -> Result<Array2<f32>, Self::Error> {
      Ok(self.outputs.pop_front().unwrap_or_else(|| Array2::zeros((0, 6))))
    }
  }

  /// 一调用就失败的假引擎
  struct FailingEngine;

  impl InferenceEngine for FailingEngine {
    type Error = std::io::Error;

    fn run(&mut self, _input: &Array4<f32>) -> Result<Array2<f32>, Self::Error> {
      Err(std::io::Error::other("会话崩溃"))
    }
  }

  #[test]
  fn stride_five_detects_frame_ten() {
    // 12 帧、步长 5 → 采样 {0, 5, 10}，帧 10 给出 0.8
    let mut engine = FakeEngine::new(vec![
      output_with_confidence(0.3),
      output_with_confidence(0.3),
      output_with_confidence(0.8),
    ]);
    let config = PipelineConfig {
      stride: 5,
      threshold: 0.6,
      max_frames: 0,
    };

    let result = run_pipeline(frames(12), &mut engine, &config).unwrap();
    assert_eq!(result.verdict, Verdict::Detected);
    assert_eq!(result.frame_index, Some(10));
    assert!((result.max_confidence - 0.8).abs() < 1e-3);
  }

  #[test]
  fn all_empty_outputs_stay_clear_with_sentinel() {
    let mut engine = FakeEngine::new(vec![]);
    let result = run_pipeline(frames(12), &mut engine, &PipelineConfig::default()).unwrap();

    assert_eq!(result.verdict, Verdict::Clear);
    assert_eq!(result.max_confidence, 0.0);
    assert_eq!(result.frame_index, None);
  }

  #[test]
  fn zero_frames_stay_clear_with_sentinel() {
    let mut engine = FakeEngine::new(vec![]);
    let result = run_pipeline(frames(0), &mut engine, &PipelineConfig::default()).unwrap();

    assert_eq!(result.max_confidence, 0.0);
    assert_eq!(result.frame_index, None);
    assert_eq!(result.verdict, Verdict::Clear);
  }

  #[test]
  fn tie_keeps_earliest_frame() {
    let mut engine = FakeEngine::new(vec![
      output_with_confidence(0.7),
      output_with_confidence(0.7),
    ]);
    let config = PipelineConfig {
      stride: 5,
      threshold: 0.6,
      max_frames: 0,
    };

    let result = run_pipeline(frames(10), &mut engine, &config).unwrap();
    assert_eq!(result.frame_index, Some(0));
  }

  #[test]
  fn confidence_equal_to_threshold_is_clear() {
    assert_eq!(decide(0.6, 0.6), Verdict::Clear);
    assert_eq!(decide(0.6000001, 0.6), Verdict::Detected);
    assert_eq!(decide(0.5, 0.6), Verdict::Clear);
  }

  #[test]
  fn aggregator_running_max_is_monotonic() {
    let mut aggregator = Aggregator::new();
    let mut last = aggregator.max_confidence();

    for (index, confidence) in [0.2, 0.5, 0.3, 0.5, 0.9, 0.1].into_iter().enumerate() {
      aggregator.observe(index as u64, confidence);
      assert!(aggregator.max_confidence() >= last);
      last = aggregator.max_confidence();
    }

    assert_eq!(aggregator.frame_index(), Some(4));
  }

  #[test]
  fn aggregator_sentinel_before_first_frame() {
    let aggregator = Aggregator::new();
    assert_eq!(aggregator.max_confidence(), 0.0);
    assert_eq!(aggregator.frame_index(), None);
  }

  #[test]
  fn deterministic_rerun_yields_identical_result() {
    let outputs = || {
      vec![
        output_with_confidence(0.4),
        output_with_confidence(0.65),
        output_with_confidence(0.2),
      ]
    };
    let config = PipelineConfig::default();

    let first =
      run_pipeline(frames(12), &mut FakeEngine::new(outputs()), &config).unwrap();
    let second =
      run_pipeline(frames(12), &mut FakeEngine::new(outputs()), &config).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn engine_failure_aborts_evaluation() {
    let mut engine = FailingEngine;
    let err = run_pipeline(frames(3), &mut engine, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Inference { .. }));
    assert!(err.to_string().contains("会话崩溃"));
  }

  #[test]
  fn max_frames_caps_processing() {
    let mut engine = FakeEngine::new(vec![
      output_with_confidence(0.3),
      output_with_confidence(0.9),
    ]);
    let config = PipelineConfig {
      stride: 1,
      threshold: 0.6,
      max_frames: 1,
    };

    let result = run_pipeline(frames(10), &mut engine, &config).unwrap();
    assert_eq!(result.verdict, Verdict::Clear);
    assert_eq!(result.frame_index, Some(0));
    assert!((result.max_confidence - 0.3).abs() < 1e-3);
  }

  #[test]
  fn result_serializes_as_flat_record() {
    let detected = VideoResult {
      verdict: Verdict::Detected,
      max_confidence: 0.812_345_6,
      frame_index: Some(10),
    };
    let json = serde_json::to_string(&detected).unwrap();
    assert!(json.contains("\"verdict\":\"DETECTED\""));
    assert!(json.contains("\"max_confidence\":0.8123"));
    assert!(json.contains("\"frame_index\":10"));

    let clear = VideoResult {
      verdict: Verdict::Clear,
      max_confidence: 0.0,
      frame_index: None,
    };
    let json = serde_json::to_string(&clear).unwrap();
    assert!(json.contains("\"verdict\":\"CLEAR\""));
    assert!(!json.contains("frame_index"));
  }

  #[test]
  fn single_frame_variant_uses_lower_threshold() {
    // 单帧部署形态：步长 1、阈值 0.5
    let mut engine = FakeEngine::new(vec![output_with_confidence(0.55)]);
    let config = PipelineConfig {
      stride: 1,
      threshold: 0.5,
      max_frames: 1,
    };

    let result = run_pipeline(frames(1), &mut engine, &config).unwrap();
    assert_eq!(result.verdict, Verdict::Detected);
    assert_eq!(result.frame_index, Some(0));
  }
}
