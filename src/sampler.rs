// 该文件是 Lukeng （路坑快查） 项目的一部分。
// src/sampler.rs - 帧采样器
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

use crate::error::Error;
use crate::input::Frame;

/// 帧采样器
///
/// 包装任意帧迭代器，只产出序号为步长整数倍的帧（0, S, 2S, …），
/// 以降低推理开销。惰性逐帧拉取，不缓存整段视频；底层错误原样
/// 透传并终止序列。
pub struct SampledFrames<I> {
  inner: I,
  stride: u64,
  done: bool,
}

impl<I> SampledFrames<I> {
  /// 创建一个新的帧采样器，步长 0 按 1 处理
  pub fn new(inner: I, stride: u32) -> Self {
    Self {
      inner,
      stride: u64::from(stride.max(1)),
      done: false,
    }
  }
}

impl<I> Iterator for SampledFrames<I>
where
  I: Iterator<Item = Result<Frame, Error>>,
{
  type Item = Result<Frame, Error>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }

    loop {
      match self.inner.next() {
        Some(Ok(frame)) => {
          if frame.index % self.stride == 0 {
            return Some(Ok(frame));
          }
        }
        Some(Err(e)) => {
          self.done = true;
          return Some(Err(e));
        }
        None => {
          self.done = true;
          return None;
        }
      }
    }
  }
}
