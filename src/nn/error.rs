/*
 * @Author       : 老董
 * @Date         : 2026-02-04
 * @Description  : 循环网络模块的错误类型
 */

use thiserror::Error;

use crate::errors::{ComparisonOperator, TensorError};

/// 循环网络相关操作的错误类型
#[derive(Error, Debug)]
pub enum RnnError {
    /// 构造参数超出合法范围（层数、尺寸、dropout概率、门数量等）
    #[error("配置项{option}须{operator}{threshold}，实际为{got}")]
    InvalidOption {
        option: &'static str,
        operator: ComparisonOperator,
        threshold: String,
        got: String,
    },
    /// 不支持的非线性函数/网络变体组合
    #[error("不支持的循环网络配置：{0}")]
    UnsupportedMode(String),
    #[error("{kind}的索引{index}越界（共{len}个）")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    #[error("{name}的形状不匹配：期望{expected:?}，实际{got:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("输入须为3阶张量（序列、批、特征），实际阶数为{0}")]
    InvalidInputRank(usize),
    /// 通过`AnyRecurrent`调用时，传入的状态类型与网络变体不符
    #[error("状态类型与网络变体不匹配：{0}")]
    StateMismatch(String),
    /// 外部后端报告的错误
    #[error("后端计算失败：{0}")]
    Backend(String),
    #[error("参数字典缺少键：{0}")]
    MissingKey(String),
    #[error("序列化失败：{0}")]
    Serialization(String),
    #[error(transparent)]
    Tensor(#[from] TensorError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for RnnError {
    fn from(err: bincode::Error) -> Self {
        RnnError::Serialization(err.to_string())
    }
}
