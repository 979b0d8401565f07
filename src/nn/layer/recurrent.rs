/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 循环网络的能力接口（Recurrent trait）以及可容纳任一变体的 AnyRecurrent
 *
 * 三种变体并不继承公共基类，而是各自持有一个`RecurrentBase`，
 * 通过`Recurrent`把它暴露出来；`Module`对所有`Recurrent`统一实现。
 */

use std::fmt;

use enum_dispatch::enum_dispatch;

use super::gru::Gru;
use super::lstm::{Lstm, LstmState};
use super::mode::RecurrentKind;
use super::rnn::Rnn;
use super::rnn_base::RecurrentBase;
use crate::nn::{RecurrentBackend, RnnError};
use crate::tensor::Tensor;

#[enum_dispatch]
pub trait Recurrent {
    fn base(&self) -> &RecurrentBase;

    fn base_mut(&mut self) -> &mut RecurrentBase;

    fn kind(&self) -> RecurrentKind;

    /// 见`RecurrentBase::flatten_parameters`
    fn flatten_parameters(&mut self) {
        self.base_mut().flatten_parameters();
    }

    fn any_parameters_alias(&self) -> bool {
        self.base().any_parameters_alias()
    }

    fn compact_parameters(&mut self) {
        self.base_mut().compact_parameters();
    }
}

/// 任一循环网络变体
#[enum_dispatch(Recurrent)]
#[derive(Clone)]
pub enum AnyRecurrent {
    Rnn,
    Lstm,
    Gru,
}

/// `AnyRecurrent`前向传播的状态：Rnn/Gru 为单个张量，Lstm 为 (hidden, cell)
#[derive(Debug, Clone)]
pub enum RecurrentState {
    Single(Tensor),
    Lstm(LstmState),
}

impl AnyRecurrent {
    /// 按变体分派前向传播，状态类型须与变体相符，否则返回`RnnError::StateMismatch`
    pub fn forward(
        &self,
        backend: &dyn RecurrentBackend,
        input: &Tensor,
        state: Option<&RecurrentState>,
    ) -> Result<(Tensor, RecurrentState), RnnError> {
        match self {
            AnyRecurrent::Lstm(lstm) => {
                let state = match state {
                    None => None,
                    Some(RecurrentState::Lstm(state)) => Some(state),
                    Some(RecurrentState::Single(_)) => {
                        return Err(RnnError::StateMismatch(
                            "Lstm需要(hidden, cell)二元组状态".to_string(),
                        ));
                    }
                };
                let out = lstm.forward(backend, input, state)?;
                Ok((out.output, RecurrentState::Lstm(out.state)))
            }
            AnyRecurrent::Rnn(rnn) => {
                let state = single_state(RecurrentKind::Rnn, state)?;
                let out = rnn.forward(backend, input, state)?;
                Ok((out.output, RecurrentState::Single(out.state)))
            }
            AnyRecurrent::Gru(gru) => {
                let state = single_state(RecurrentKind::Gru, state)?;
                let out = gru.forward(backend, input, state)?;
                Ok((out.output, RecurrentState::Single(out.state)))
            }
        }
    }
}

fn single_state(
    kind: RecurrentKind,
    state: Option<&RecurrentState>,
) -> Result<Option<&Tensor>, RnnError> {
    match state {
        None => Ok(None),
        Some(RecurrentState::Single(state)) => Ok(Some(state)),
        Some(RecurrentState::Lstm(_)) => Err(RnnError::StateMismatch(format!(
            "{kind}需要单个张量状态"
        ))),
    }
}

impl fmt::Display for AnyRecurrent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyRecurrent::Rnn(rnn) => fmt::Display::fmt(rnn, f),
            AnyRecurrent::Lstm(lstm) => fmt::Display::fmt(lstm, f),
            AnyRecurrent::Gru(gru) => fmt::Display::fmt(gru, f),
        }
    }
}
