use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    #[error("数据长度{data_len}与形状{shape:?}所需的元素个数{expected}不一致")]
    DataLengthMismatch {
        data_len: usize,
        shape: Vec<usize>,
        expected: usize,
    },
    #[error("张量形状不一致：期望{expected:?}，实际{got:?}")]
    InconsitentShape { expected: Vec<usize>, got: Vec<usize> },
    #[error("标量张量无法沿第0维截取")]
    NarrowOnScalar,
    #[error("截取范围[{start}, {end})超出第0维长度{len}")]
    NarrowOutOfRange { start: usize, end: usize, len: usize },
}
