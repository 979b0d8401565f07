/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 宿主端张量句柄：共享存储（storage）、设备与数据类型标记
 *
 * 与PyTorch一致，`clone()`得到的是指向**同一存储**的新句柄（浅拷贝），
 * 深拷贝请用`deep_clone()`。循环网络的参数管理正是依赖这一点来判断
 * 参数之间是否存在别名（aliasing）。
 *
 * 本模块不负责任何张量运算，运算交由外部后端（见`nn::RecurrentBackend`）。
 */

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array, ArrayD, IxDyn};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};

use crate::errors::TensorError;

mod device;
mod print;
mod property;

pub use device::{DType, Device};

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：数据始终以行主序（row-major）连续存放在`storage`的`[offset, offset+size)`区间内。
#[derive(Clone)]
pub struct Tensor {
    storage: Rc<RefCell<Vec<f32>>>,
    offset: usize,
    shape: Vec<usize>,
    device: Device,
    dtype: DType,
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]、[1,1,1]...
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]；
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则会panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        let expected = shape.iter().product::<usize>();
        assert!(
            data.len() == expected,
            "{}",
            TensorError::DataLengthMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
                expected,
            }
        );
        Self::from_storage(data.to_vec(), shape, Device::Cpu, DType::F32)
    }

    /// 创建一个全零张量
    pub fn zeros(shape: &[usize]) -> Tensor {
        Self::full(0., shape)
    }

    /// 创建一个全一张量
    pub fn ones(shape: &[usize]) -> Tensor {
        Self::full(1., shape)
    }

    /// 创建一个所有元素均为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Tensor {
        let data = vec![value; shape.iter().product::<usize>()];
        Self::from_storage(data, shape, Device::Cpu, DType::F32)
    }

    /// 在指定设备和数据类型上创建全零张量（如：循环网络缺省的初始隐藏状态）
    pub fn zeros_on(shape: &[usize], device: Device, dtype: DType) -> Tensor {
        let data = vec![0.; shape.iter().product::<usize>()];
        Self::from_storage(data, shape, device, dtype)
    }

    /// 创建一个随机张量，其值服从[min, max)上的均匀分布
    pub fn uniform<R: Rng + ?Sized>(min: f32, max: f32, shape: &[usize], rng: &mut R) -> Tensor {
        let tensor = Self::zeros(shape);
        tensor.uniform_(min, max, rng);
        tensor
    }

    pub fn from_array(array: &ArrayD<f32>) -> Tensor {
        let data = array.iter().copied().collect::<Vec<_>>();
        Self::from_storage(data, array.shape(), Device::Cpu, DType::F32)
    }

    /// 拷贝出一份`ndarray`数组，便于（后端或测试中）做数值运算
    pub fn to_array(&self) -> ArrayD<f32> {
        Array::from_shape_vec(IxDyn(&self.shape), self.to_vec())
            .expect("张量的形状与其存储区间长度始终一致")
    }

    /// 按行主序拷贝出本张量覆盖的全部数值
    pub fn to_vec(&self) -> Vec<f32> {
        self.storage.borrow()[self.element_range()].to_vec()
    }

    /// 深拷贝：分配新的存储，因而与原张量不再共享存储
    pub fn deep_clone(&self) -> Tensor {
        Self::from_storage(self.to_vec(), &self.shape, self.device, self.dtype)
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓原地修改（存储身份不变）↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 用[low, high)上的均匀分布原地填充。只改数值，不改存储身份。
    pub fn uniform_<R: Rng + ?Sized>(&self, low: f32, high: f32, rng: &mut R) {
        assert!(low < high, "均匀分布的下界{low}须小于上界{high}");
        let distribution = Uniform::new(low, high);
        let range = self.element_range();
        let mut storage = self.storage.borrow_mut();
        for value in storage[range].iter_mut() {
            *value = distribution.sample(rng);
        }
    }

    /// 用常数原地填充
    pub fn fill_(&self, value: f32) {
        let range = self.element_range();
        self.storage.borrow_mut()[range].fill(value);
    }

    /// 将`other`的数值原地拷贝进来，两者形状须严格一致
    pub fn copy_from(&self, other: &Tensor) -> Result<(), TensorError> {
        if self.shape != other.shape {
            return Err(TensorError::InconsitentShape {
                expected: self.shape.clone(),
                got: other.shape.clone(),
            });
        }
        // 先拷出数值，避免二者共享存储时同时借用
        let values = other.to_vec();
        let range = self.element_range();
        self.storage.borrow_mut()[range].copy_from_slice(&values);
        Ok(())
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑原地修改（存储身份不变）↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /// 沿第0维截取`[start, start+len)`，返回与本张量**共享存储**的视图
    pub fn narrow(&self, start: usize, len: usize) -> Result<Tensor, TensorError> {
        let Some(&dim0) = self.shape.first() else {
            return Err(TensorError::NarrowOnScalar);
        };
        if start + len > dim0 {
            return Err(TensorError::NarrowOutOfRange {
                start,
                end: start + len,
                len: dim0,
            });
        }
        let row_size = self.shape[1..].iter().product::<usize>();
        let mut shape = self.shape.clone();
        shape[0] = len;
        Ok(Tensor {
            storage: Rc::clone(&self.storage),
            offset: self.offset + start * row_size,
            shape,
            device: self.device,
            dtype: self.dtype,
        })
    }

    /// 将若干张量按顺序打包进一块新分配的连续存储，并返回各自在其中的视图。
    /// 返回的视图两两不重叠，且首尾相接。
    pub fn pack(tensors: &[Tensor]) -> Vec<Tensor> {
        let total = tensors.iter().map(Tensor::size).sum::<usize>();
        let mut data = Vec::with_capacity(total);
        for tensor in tensors {
            data.extend(tensor.to_vec());
        }
        let storage = Rc::new(RefCell::new(data));

        let mut offset = 0;
        tensors
            .iter()
            .map(|tensor| {
                let view = Tensor {
                    storage: Rc::clone(&storage),
                    offset,
                    shape: tensor.shape.clone(),
                    device: tensor.device,
                    dtype: tensor.dtype,
                };
                offset += tensor.size();
                view
            })
            .collect()
    }
}

// 私有方法
impl Tensor {
    fn from_storage(data: Vec<f32>, shape: &[usize], device: Device, dtype: DType) -> Tensor {
        Tensor {
            storage: Rc::new(RefCell::new(data)),
            offset: 0,
            shape: shape.to_vec(),
            device,
            dtype,
        }
    }

    fn element_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.size()
    }
}
