/*
 * @Author       : 老董
 * @Date         : 2026-02-07
 * @Description  : Module trait 定义（模块生命周期：参数、重置、迁移、训练模式、保存加载）
 */

use std::path::Path;

use super::layer::Recurrent;
use super::{RnnError, StateDict};
use crate::tensor::{DType, Device, Tensor};

/// 模块 trait
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（各变体的状态类型不同）
/// - `new()` **不是** trait 方法（参数各异）
/// - 迁移（`to`系列）之后参数身份改变，实现方须在迁移后重新扁平化参数
pub trait Module {
    /// 获取所有可训练参数（共享句柄）
    fn parameters(&self) -> Vec<Tensor>;

    /// 带名字的参数
    fn named_parameters(&self) -> Vec<(String, Tensor)>;

    /// 获取参数数量
    fn num_params(&self) -> usize {
        self.parameters().len()
    }

    /// 所有参数的元素总数
    fn num_elements(&self) -> usize {
        self.parameters().iter().map(Tensor::size).sum()
    }

    /// 重新初始化全部参数
    fn reset(&mut self);

    fn to(&mut self, device: Device, dtype: DType);

    fn to_device(&mut self, device: Device);

    fn to_dtype(&mut self, dtype: DType);

    /// 切换训练/推理模式（影响后端是否启用dropout）
    fn train(&mut self, on: bool);

    fn eval(&mut self) {
        self.train(false);
    }

    fn is_training(&self) -> bool;

    fn state_dict(&self) -> StateDict {
        StateDict::from_named(&self.named_parameters())
    }

    /// 把字典中的数值原地拷进同名参数。
    /// 先检查全部参数（缺键、形状不符即报错且不修改任何参数），再统一拷贝。
    fn load_state_dict(&mut self, dict: &StateDict) -> Result<(), RnnError> {
        let named = self.named_parameters();
        let mut values = Vec::with_capacity(named.len());
        for (name, tensor) in &named {
            let record = dict
                .get(name)
                .ok_or_else(|| RnnError::MissingKey(name.clone()))?;
            let value = record.to_tensor()?;
            if !value.is_same_shape(tensor) {
                return Err(RnnError::ShapeMismatch {
                    name: name.clone(),
                    expected: tensor.shape().to_vec(),
                    got: value.shape().to_vec(),
                });
            }
            values.push(value);
        }
        for ((_, tensor), value) in named.iter().zip(&values) {
            tensor.copy_from(value)?;
        }
        Ok(())
    }

    fn save_parameters(&self, path: &Path) -> Result<(), RnnError> {
        self.state_dict().save(path)
    }

    fn load_parameters(&mut self, path: &Path) -> Result<(), RnnError> {
        let dict = StateDict::load(path)?;
        self.load_state_dict(&dict)
    }
}

impl<T: Recurrent> Module for T {
    fn parameters(&self) -> Vec<Tensor> {
        self.base().flat_weights()
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        self.base().named_parameters()
    }

    fn reset(&mut self) {
        self.base_mut().reset();
    }

    fn to(&mut self, device: Device, dtype: DType) {
        self.base_mut().to(device, dtype);
    }

    fn to_device(&mut self, device: Device) {
        self.base_mut().to_device(device);
    }

    fn to_dtype(&mut self, dtype: DType) {
        self.base_mut().to_dtype(dtype);
    }

    fn train(&mut self, on: bool) {
        self.base_mut().set_training(on);
    }

    fn is_training(&self) -> bool {
        self.base().is_training()
    }
}
