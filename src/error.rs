// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/error.rs - 错误类型定义
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

/// 检测流水线错误
///
/// 任何一种错误都会中止当前视频的评估，不返回逐帧的部分结果。
/// 空输出（零候选框或零处理帧）不是错误，按最大置信度 0.0 处理。
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// 输入源无法打开或中途解码失败
  #[error("无法打开或解码输入源 {path}: {reason}")]
  SourceUnavailable { path: String, reason: String },

  /// 帧的形状或格式不符合预处理要求
  #[error("帧预处理失败: {reason}")]
  Preprocess { reason: String },

  /// 推理引擎调用失败，保留底层错误信息
  #[error("推理失败: {source}")]
  Inference {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// 原始输出张量的排布无法解码
  #[error("输出张量解码失败: {reason}")]
  Decode { reason: String },
}
