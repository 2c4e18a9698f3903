// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;

/// Lukeng 路坑检测参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径
  #[arg(long, value_name = "FILE")]
  pub model: String,

  /// 输入来源（视频文件或图片文件）
  /// 支持格式:
  /// - 视频: *.mp4, *.avi, *.mkv 等（需启用 ffmpeg_input 特性）
  /// - 图片: *.jpg, *.jpeg, *.png, *.bmp, *.gif, *.webp
  #[arg(long, value_name = "SOURCE")]
  pub input: String,

  /// 帧采样步长，每 N 帧处理一帧
  #[arg(long, default_value = "5", value_name = "STRIDE")]
  pub stride: u32,

  /// 判定阈值 (0.0 - 1.0)，最大置信度严格大于该值即判定检出
  #[arg(long, default_value = "0.6", value_name = "THRESHOLD")]
  pub threshold: f32,

  /// 最大处理帧数（0 表示无限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_frames: u64,
}
