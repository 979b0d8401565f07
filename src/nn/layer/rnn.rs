/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : Rnn (多层 Elman 循环网络) - PyTorch 风格 API
 *
 * 公式: h_t = tanh/relu(x_t @ W_ih^T + b_ih + h_{t-1} @ W_hh^T + b_hh)
 *
 * 数值计算由外部后端（`RecurrentBackend::rnn_tanh`/`rnn_relu`）完成，
 * 本层只负责参数与扁平化缓存。
 *
 * 输入/输出形状：
 * - 输入：[seq_len, batch, input_size]（batch_first 时为 [batch, seq_len, input_size]）
 * - 输出：[seq_len, batch, num_directions * hidden_size]
 * - 状态：[num_layers * num_directions, batch, hidden_size]
 */

use std::fmt;

use super::mode::{BackendMode, Nonlinearity, RecurrentKind};
use super::options::RnnOptions;
use super::recurrent::Recurrent;
use super::rnn_base::{RecurrentBase, RnnOutput};
use crate::nn::{RecurrentBackend, RnnError};
use crate::tensor::Tensor;

/// 多层 Elman RNN
///
/// # 使用示例
/// ```ignore
/// let mut rnn = Rnn::new(RnnOptions::new(10, 20).with_num_layers(2))?;
/// let out = rnn.forward(&backend, &x, None)?;
/// let out2 = rnn.forward(&backend, &x_next, Some(&out.state))?;
/// ```
#[derive(Clone)]
pub struct Rnn {
    base: RecurrentBase,
    /// 构造时的完整选项（公共部分另存于`base`中，二者构造后均不再改变）
    options: RnnOptions,
}

impl Rnn {
    pub fn new(options: RnnOptions) -> Result<Self, RnnError> {
        let mode = BackendMode::for_variant(RecurrentKind::Rnn, Some(options.nonlinearity))?;
        let base = RecurrentBase::new(
            options.base.clone(),
            Some(mode),
            RecurrentKind::Rnn.number_of_gates(),
        )?;
        Ok(Self { base, options })
    }

    /// 使用固定种子初始化参数
    pub fn new_with_seed(options: RnnOptions, seed: u64) -> Result<Self, RnnError> {
        let mode = BackendMode::for_variant(RecurrentKind::Rnn, Some(options.nonlinearity))?;
        let base = RecurrentBase::new_with_seed(
            options.base.clone(),
            Some(mode),
            RecurrentKind::Rnn.number_of_gates(),
            seed,
        )?;
        Ok(Self { base, options })
    }

    /// 前向传播：按非线性函数选择后端的`rnn_tanh`或`rnn_relu`
    pub fn forward(
        &self,
        backend: &dyn RecurrentBackend,
        input: &Tensor,
        state: Option<&Tensor>,
    ) -> Result<RnnOutput, RnnError> {
        match self.options.nonlinearity {
            Nonlinearity::Tanh => self.base.generic_forward(
                |input, state, params, call| backend.rnn_tanh(input, state, params, call),
                input,
                state,
            ),
            Nonlinearity::Relu => self.base.generic_forward(
                |input, state, params, call| backend.rnn_relu(input, state, params, call),
                input,
                state,
            ),
        }
    }

    pub fn nonlinearity(&self) -> Nonlinearity {
        self.options.nonlinearity
    }

    pub fn options(&self) -> &RnnOptions {
        &self.options
    }
}

impl Recurrent for Rnn {
    fn base(&self) -> &RecurrentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RecurrentBase {
        &mut self.base
    }

    fn kind(&self) -> RecurrentKind {
        RecurrentKind::Rnn
    }
}

impl fmt::Display for Rnn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rnn({}, nonlinearity={})",
            self.options.base,
            self.options.nonlinearity
        )
    }
}
