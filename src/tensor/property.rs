/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 本类仅包含一些属性方法（形状、存储身份等），不包含任何运算方法
 */

use std::rc::Rc;

use super::Tensor;

impl Tensor {
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]。
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// 张量的维（dim）数、阶（rank）数
    pub fn dimension(&self) -> usize {
        self.shape.len()
    }

    /// 计算张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// 本张量在其存储中的起始偏移（以元素计）
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 判断两个张量的形状是否严格一致。如：形状为 [1, 4]，[1, 4]和[4]是不一致的，会返回false
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓存储身份↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 存储的身份标识。仅在存储存活期间有意义，不可持久化。
    pub fn storage_id(&self) -> usize {
        Rc::as_ptr(&self.storage) as *const () as usize
    }

    /// 是否与`other`共享同一块存储（不论区间是否重叠）
    pub fn same_storage(&self, other: &Tensor) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }

    /// 是否与`other`共享存储且所覆盖的元素区间有交集。
    /// 空张量不与任何张量重叠。
    pub fn overlaps(&self, other: &Tensor) -> bool {
        if !self.same_storage(other) || self.size() == 0 || other.size() == 0 {
            return false;
        }
        let (a, b) = (self.element_range(), other.element_range());
        a.start < b.end && b.start < a.end
    }

    /// 当前有多少个句柄共享这块存储
    pub fn storage_handle_count(&self) -> usize {
        Rc::strong_count(&self.storage)
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑存储身份↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
}
