/*
 * @Author       : 老董
 * @Date         : 2026-02-04
 * @Description  : 循环网络的构造选项（与 PyTorch 的 RNNOptions/LSTMOptions/GRUOptions 对齐）
 *
 * 选项可序列化为 JSON，便于和模型参数一起保存。
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use super::mode::Nonlinearity;
use crate::errors::ComparisonOperator;
use crate::nn::RnnError;

/// 三种循环网络共用的选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnOptionsBase {
    /// 输入特征维度
    pub input_size: usize,
    /// 隐藏状态维度
    pub hidden_size: usize,
    /// 堆叠层数
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,
    #[serde(default = "default_bias")]
    pub bias: bool,
    /// 为true时输入/输出布局为(batch, seq, feature)，否则为(seq, batch, feature)
    #[serde(default)]
    pub batch_first: bool,
    /// 除最后一层外，每层输出上的dropout概率
    #[serde(default)]
    pub dropout: f64,
    #[serde(default)]
    pub bidirectional: bool,
}

fn default_num_layers() -> usize {
    1
}

fn default_bias() -> bool {
    true
}

/// LSTM的选项
pub type LstmOptions = RnnOptionsBase;
/// GRU的选项
pub type GruOptions = RnnOptionsBase;

impl RnnOptionsBase {
    pub fn new(input_size: usize, hidden_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            num_layers: default_num_layers(),
            bias: default_bias(),
            batch_first: false,
            dropout: 0.,
            bidirectional: false,
        }
    }

    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// 方向数：双向为2，否则为1
    pub fn num_directions(&self) -> usize {
        if self.bidirectional { 2 } else { 1 }
    }

    /// 检查各配置项是否在合法范围内
    pub fn validate(&self) -> Result<(), RnnError> {
        check_positive("input_size", self.input_size)?;
        check_positive("hidden_size", self.hidden_size)?;
        if self.num_layers < 1 {
            return Err(RnnError::InvalidOption {
                option: "num_layers",
                operator: ComparisonOperator::GreaterOrEqual,
                threshold: "1".to_string(),
                got: self.num_layers.to_string(),
            });
        }
        // NaN 也会落入此分支
        if !(self.dropout >= 0.) {
            return Err(RnnError::InvalidOption {
                option: "dropout",
                operator: ComparisonOperator::GreaterOrEqual,
                threshold: "0".to_string(),
                got: self.dropout.to_string(),
            });
        }
        if self.dropout >= 1. {
            return Err(RnnError::InvalidOption {
                option: "dropout",
                operator: ComparisonOperator::LessThan,
                threshold: "1".to_string(),
                got: self.dropout.to_string(),
            });
        }
        Ok(())
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析（不做合法性检查，构造网络时才检查）
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for RnnOptionsBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input_size={}, hidden_size={}, num_layers={}, bias={}, batch_first={}, dropout={}, bidirectional={}",
            self.input_size,
            self.hidden_size,
            self.num_layers,
            self.bias,
            self.batch_first,
            self.dropout,
            self.bidirectional
        )
    }
}

fn check_positive(option: &'static str, value: usize) -> Result<(), RnnError> {
    if value == 0 {
        return Err(RnnError::InvalidOption {
            option,
            operator: ComparisonOperator::GreaterThan,
            threshold: "0".to_string(),
            got: value.to_string(),
        });
    }
    Ok(())
}

/// 普通（Elman）RNN的选项：在公共选项之外多一个非线性函数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnOptions {
    #[serde(flatten)]
    pub base: RnnOptionsBase,
    #[serde(default)]
    pub nonlinearity: Nonlinearity,
}

impl RnnOptions {
    pub fn new(input_size: usize, hidden_size: usize) -> Self {
        Self {
            base: RnnOptionsBase::new(input_size, hidden_size),
            nonlinearity: Nonlinearity::default(),
        }
    }

    pub fn with_nonlinearity(mut self, nonlinearity: Nonlinearity) -> Self {
        self.nonlinearity = nonlinearity;
        self
    }

    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.base = self.base.with_num_layers(num_layers);
        self
    }

    pub fn with_bias(mut self, bias: bool) -> Self {
        self.base = self.base.with_bias(bias);
        self
    }

    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.base = self.base.with_batch_first(batch_first);
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.base = self.base.with_dropout(dropout);
        self
    }

    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.base = self.base.with_bidirectional(bidirectional);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<RnnOptionsBase> for RnnOptions {
    fn from(base: RnnOptionsBase) -> Self {
        Self {
            base,
            nonlinearity: Nonlinearity::default(),
        }
    }
}
