// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/engine/mod.rs - 推理引擎模块
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

#[cfg(feature = "ort_model")]
mod ort_engine;

#[cfg(feature = "ort_model")]
pub use ort_engine::{OrtEngine, OrtEngineError};

use std::sync::{Arc, Mutex, MutexGuard};

use ndarray::{Array2, Array4};

/// 推理引擎 trait
///
/// 对流水线而言引擎是一个黑盒：输入 (1,3,H,W) 张量，同步返回原始
/// 输出张量。输出保持模型自身的二维排布，方向交由解码器判定。
/// 引擎在进程启动时加载一次；加载失败是启动期致命错误，而不是
/// 单次请求错误。
pub trait InferenceEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn run(&mut self, input: &Array4<f32>) -> Result<Array2<f32>, Self::Error>;
}

/// 共享所有权的引擎句柄
///
/// 会话对象未声明线程安全时，并发处理多个视频要么各自持有独立
/// 引擎实例，要么通过本句柄串行访问同一个会话。克隆只复制句柄，
/// 不复制底层会话。
pub struct SharedEngine<E>(Arc<Mutex<E>>);

impl<E> SharedEngine<E> {
  pub fn new(engine: E) -> Self {
    Self(Arc::new(Mutex::new(engine)))
  }

  /// 独占借出底层引擎，锁中毒时直接接管内部值
  pub fn lock(&self) -> MutexGuard<'_, E> {
    self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl<E> Clone for SharedEngine<E> {
  fn clone(&self) -> Self {
    Self(Arc::clone(&self.0))
  }
}
