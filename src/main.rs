// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use lukeng::engine::OrtEngine;
use lukeng::pipeline::{PipelineConfig, Verdict, evaluate};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("采样步长: {}", args.stride);
  info!("判定阈值: {}", args.threshold);

  // 引擎在进程启动时加载一次，加载失败直接退出
  let mut engine =
    OrtEngine::load(&args.model).with_context(|| format!("无法加载模型: {}", args.model))?;

  let config = PipelineConfig {
    stride: args.stride,
    threshold: args.threshold,
    max_frames: args.max_frames,
  };

  let result = evaluate(&args.input, &mut engine, &config)?;

  match result.verdict {
    Verdict::Detected => warn!(
      "检测到坑洼 (帧 {}, 置信度 {:.4})",
      result.frame_index.unwrap_or(0),
      result.max_confidence
    ),
    Verdict::Clear => info!("未检测到坑洼 (最大置信度 {:.4})", result.max_confidence),
  }

  println!("{}", serde_json::to_string(&result)?);

  Ok(())
}
