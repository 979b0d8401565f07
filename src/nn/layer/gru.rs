/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : Gru (多层门控循环单元) - PyTorch 风格 API
 *
 * 公式:
 *   r_t = σ(x_t @ W_ir + b_ir + h_{t-1} @ W_hr + b_hr)     # 重置门
 *   z_t = σ(x_t @ W_iz + b_iz + h_{t-1} @ W_hz + b_hz)     # 更新门
 *   n_t = tanh(x_t @ W_in + b_in + r_t ⊙ (h_{t-1} @ W_hn + b_hn))  # 候选状态
 *   h_t = (1 - z_t) ⊙ n_t + z_t ⊙ h_{t-1}
 *
 * 三个门的权重沿第0维堆叠，顺序为 (r, z, n)，故 gate_size = 3 * hidden_size。
 */

use std::fmt;

use super::mode::{BackendMode, RecurrentKind};
use super::options::GruOptions;
use super::recurrent::Recurrent;
use super::rnn_base::{RecurrentBase, RnnOutput};
use crate::nn::{RecurrentBackend, RnnError};
use crate::tensor::Tensor;

/// 多层 GRU，状态为单个张量 [num_layers * num_directions, batch, hidden_size]
#[derive(Clone)]
pub struct Gru {
    base: RecurrentBase,
}

impl Gru {
    pub fn new(options: GruOptions) -> Result<Self, RnnError> {
        let mode = BackendMode::for_variant(RecurrentKind::Gru, None)?;
        let base = RecurrentBase::new(options, Some(mode), RecurrentKind::Gru.number_of_gates())?;
        Ok(Self { base })
    }

    pub fn new_with_seed(options: GruOptions, seed: u64) -> Result<Self, RnnError> {
        let mode = BackendMode::for_variant(RecurrentKind::Gru, None)?;
        let base = RecurrentBase::new_with_seed(
            options,
            Some(mode),
            RecurrentKind::Gru.number_of_gates(),
            seed,
        )?;
        Ok(Self { base })
    }

    pub fn forward(
        &self,
        backend: &dyn RecurrentBackend,
        input: &Tensor,
        state: Option<&Tensor>,
    ) -> Result<RnnOutput, RnnError> {
        self.base.generic_forward(
            |input, state, params, call| backend.gru(input, state, params, call),
            input,
            state,
        )
    }

    pub fn options(&self) -> &GruOptions {
        self.base.options()
    }
}

impl Recurrent for Gru {
    fn base(&self) -> &RecurrentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RecurrentBase {
        &mut self.base
    }

    fn kind(&self) -> RecurrentKind {
        RecurrentKind::Gru
    }
}

impl fmt::Display for Gru {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gru({})", self.base.options())
    }
}
