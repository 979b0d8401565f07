/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : Lstm (多层长短期记忆网络) - PyTorch 风格 API
 *
 * 公式:
 *   i_t = σ(x_t @ W_ii + b_ii + h_{t-1} @ W_hi + b_hi)   # 输入门
 *   f_t = σ(x_t @ W_if + b_if + h_{t-1} @ W_hf + b_hf)   # 遗忘门
 *   g_t = tanh(x_t @ W_ig + b_ig + h_{t-1} @ W_hg + b_hg) # 候选细胞
 *   o_t = σ(x_t @ W_io + b_io + h_{t-1} @ W_ho + b_ho)   # 输出门
 *   c_t = f_t ⊙ c_{t-1} + i_t ⊙ g_t
 *   h_t = o_t ⊙ tanh(c_t)
 *
 * 四个门的权重沿第0维堆叠，顺序为 (i, f, g, o)，故 gate_size = 4 * hidden_size。
 * 与 Rnn/Gru 不同，LSTM 的状态是 (hidden, cell) 二元组，因此不走`generic_forward`。
 */

use std::fmt;

use super::mode::{BackendMode, RecurrentKind};
use super::options::LstmOptions;
use super::recurrent::Recurrent;
use super::rnn_base::RecurrentBase;
use crate::nn::{RecurrentBackend, RnnError};
use crate::tensor::Tensor;

/// LSTM 的状态，二者形状均为 [num_layers * num_directions, batch, hidden_size]
#[derive(Debug, Clone)]
pub struct LstmState {
    pub hidden: Tensor,
    pub cell: Tensor,
}

/// LSTM 单次前向传播的结果
#[derive(Debug, Clone)]
pub struct LstmOutput {
    /// 所有时间步的输出
    pub output: Tensor,
    /// 最后一个时间步的 (hidden, cell)
    pub state: LstmState,
}

#[derive(Clone)]
pub struct Lstm {
    base: RecurrentBase,
}

impl Lstm {
    pub fn new(options: LstmOptions) -> Result<Self, RnnError> {
        let mode = BackendMode::for_variant(RecurrentKind::Lstm, None)?;
        let base = RecurrentBase::new(options, Some(mode), RecurrentKind::Lstm.number_of_gates())?;
        Ok(Self { base })
    }

    pub fn new_with_seed(options: LstmOptions, seed: u64) -> Result<Self, RnnError> {
        let mode = BackendMode::for_variant(RecurrentKind::Lstm, None)?;
        let base = RecurrentBase::new_with_seed(
            options,
            Some(mode),
            RecurrentKind::Lstm.number_of_gates(),
            seed,
        )?;
        Ok(Self { base })
    }

    /// 前向传播
    ///
    /// `state`为`None`时 hidden 与 cell 均为（各自分配的）全零张量。
    pub fn forward(
        &self,
        backend: &dyn RecurrentBackend,
        input: &Tensor,
        state: Option<&LstmState>,
    ) -> Result<LstmOutput, RnnError> {
        self.base.check_input(input)?;
        let (hidden, cell) = match state {
            Some(state) => (state.hidden.clone(), state.cell.clone()),
            None => (self.base.zero_state(input)?, self.base.zero_state(input)?),
        };
        let (output, (hidden, cell)) = self.base.with_forward_parameters(|params, call| {
            backend.lstm(input, (&hidden, &cell), params, call)
        })?;
        Ok(LstmOutput {
            output,
            state: LstmState { hidden, cell },
        })
    }

    pub fn options(&self) -> &LstmOptions {
        self.base.options()
    }
}

impl Recurrent for Lstm {
    fn base(&self) -> &RecurrentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RecurrentBase {
        &mut self.base
    }

    fn kind(&self) -> RecurrentKind {
        RecurrentKind::Lstm
    }
}

impl fmt::Display for Lstm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lstm({})", self.base.options())
    }
}
