/*
 * @Author       : 老董
 * @Date         : 2026-02-04
 * @Description  : 循环网络变体、非线性函数与后端融合模式（backend mode）
 *
 * `BackendMode`与外部后端的数字编码（cuDNN 的 cudnnRNNMode_t）之间的对应关系
 * 只在`cudnn_code`/`from_cudnn_code`这一处维护，核心逻辑里只使用枚举本身。
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::nn::RnnError;

/// 循环网络变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecurrentKind {
    Rnn,
    Lstm,
    Gru,
}

impl RecurrentKind {
    /// 每层权重/偏置中堆叠的门数量
    pub const fn number_of_gates(self) -> usize {
        match self {
            RecurrentKind::Rnn => 1,
            RecurrentKind::Lstm => 4,
            RecurrentKind::Gru => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RecurrentKind::Rnn => "Rnn",
            RecurrentKind::Lstm => "Lstm",
            RecurrentKind::Gru => "Gru",
        }
    }
}

impl fmt::Display for RecurrentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 普通 RNN 的非线性函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nonlinearity {
    #[default]
    Tanh,
    Relu,
}

impl fmt::Display for Nonlinearity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nonlinearity::Tanh => write!(f, "tanh"),
            Nonlinearity::Relu => write!(f, "relu"),
        }
    }
}

/// 与 serde 的规则一致：只接受全小写的`tanh`/`relu`
impl FromStr for Nonlinearity {
    type Err = RnnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tanh" => Ok(Nonlinearity::Tanh),
            "relu" => Ok(Nonlinearity::Relu),
            other => Err(RnnError::UnsupportedMode(format!(
                "未知的非线性函数`{other}`，仅支持`tanh`和`relu`"
            ))),
        }
    }
}

/// 后端融合实现的模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendMode {
    RnnRelu,
    RnnTanh,
    Lstm,
    Gru,
}

impl BackendMode {
    /// 根据网络变体与非线性函数选出融合模式。
    /// 普通RNN必须指定非线性函数；LSTM/GRU则不接受非线性函数。
    pub fn for_variant(
        kind: RecurrentKind,
        nonlinearity: Option<Nonlinearity>,
    ) -> Result<Self, RnnError> {
        match (kind, nonlinearity) {
            (RecurrentKind::Rnn, Some(Nonlinearity::Tanh)) => Ok(BackendMode::RnnTanh),
            (RecurrentKind::Rnn, Some(Nonlinearity::Relu)) => Ok(BackendMode::RnnRelu),
            (RecurrentKind::Lstm, None) => Ok(BackendMode::Lstm),
            (RecurrentKind::Gru, None) => Ok(BackendMode::Gru),
            (RecurrentKind::Rnn, None) => Err(RnnError::UnsupportedMode(
                "Rnn须指定非线性函数（tanh或relu）".to_string(),
            )),
            (kind, Some(nonlinearity)) => Err(RnnError::UnsupportedMode(format!(
                "{kind}不支持非线性函数`{nonlinearity}`"
            ))),
        }
    }

    /// 对应 cudnnRNNMode_t 的编码
    pub const fn cudnn_code(self) -> i32 {
        match self {
            BackendMode::RnnRelu => 0,
            BackendMode::RnnTanh => 1,
            BackendMode::Lstm => 2,
            BackendMode::Gru => 3,
        }
    }

    pub fn from_cudnn_code(code: i32) -> Result<Self, RnnError> {
        match code {
            0 => Ok(BackendMode::RnnRelu),
            1 => Ok(BackendMode::RnnTanh),
            2 => Ok(BackendMode::Lstm),
            3 => Ok(BackendMode::Gru),
            _ => Err(RnnError::UnsupportedMode(format!(
                "{code}不是合法的后端模式编码"
            ))),
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendMode::RnnRelu => "RNN_RELU",
            BackendMode::RnnTanh => "RNN_TANH",
            BackendMode::Lstm => "LSTM",
            BackendMode::Gru => "GRU",
        };
        write!(f, "{name}")
    }
}
