/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : 扁平化参数缓存及其交给后端的布局描述
 *
 * 缓存带有“代数”（generation）：参数身份每变化一次，模块的代数加一，
 * 与缓存记录的代数不等即视为过期，直到下一次`flatten_parameters()`重建。
 */

use super::BackendMode;
use crate::tensor::{DType, Device, Tensor};

/// 扁平化参数在（概念上的）一整块连续缓冲区中的布局
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatLayout {
    pub mode: BackendMode,
    /// `mode`对应的后端数字编码
    pub mode_code: i32,
    pub device: Device,
    pub dtype: DType,
    /// 每个参数在缓冲区中的`(起始偏移, 元素个数)`，顺序同扁平化参数
    pub spans: Vec<(usize, usize)>,
    pub total_elements: usize,
    /// 所有参数是否已按顺序首尾相接地存放在同一块存储中（后端可直接使用，无需再拷贝）
    pub packed: bool,
}

impl FlatLayout {
    /// 为一组扁平化参数生成布局；参数分散在不同设备或数据类型上时返回`None`
    pub fn describe(mode: BackendMode, weights: &[Tensor]) -> Option<Self> {
        let first = weights.first()?;
        let (device, dtype) = (first.device(), first.dtype());
        if weights
            .iter()
            .any(|w| w.device() != device || w.dtype() != dtype)
        {
            return None;
        }

        let mut spans = Vec::with_capacity(weights.len());
        let mut total_elements = 0;
        for weight in weights {
            spans.push((total_elements, weight.size()));
            total_elements += weight.size();
        }

        let packed = weights.iter().zip(&spans).all(|(weight, &(offset, _))| {
            weight.same_storage(first) && weight.offset() == first.offset() + offset
        });

        Some(Self {
            mode,
            mode_code: mode.cudnn_code(),
            device,
            dtype,
            spans,
            total_elements,
            packed,
        })
    }
}

/// 扁平化参数缓存：持有参数的共享句柄（不拷贝数值）
#[derive(Debug, Clone, Default)]
pub(crate) struct FlatWeightsCache {
    pub(crate) weights: Vec<Tensor>,
    pub(crate) layout: Option<FlatLayout>,
    pub(crate) generation: u64,
}

impl FlatWeightsCache {
    pub(crate) fn clear(&mut self) {
        self.weights.clear();
        self.layout = None;
    }

    /// 缓存存在且与给定代数一致
    pub(crate) fn is_fresh(&self, generation: u64) -> bool {
        self.layout.is_some() && self.generation == generation
    }
}
