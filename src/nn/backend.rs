/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : 外部循环计算后端的接口
 *
 * 本库只管理参数，不做任何递推运算：RNN/LSTM/GRU 的数值计算（以及在 GPU 上的融合内核）
 * 都由实现`RecurrentBackend`的外部后端完成。
 */

use crate::nn::RnnError;
use crate::nn::layer::{BackendMode, FlatLayout};
use crate::tensor::Tensor;

/// 递推计算函数除张量之外的参数
#[derive(Debug, Clone, Copy)]
pub struct RecurrentCall<'a> {
    pub has_biases: bool,
    pub num_layers: usize,
    pub dropout: f64,
    pub train: bool,
    pub bidirectional: bool,
    pub batch_first: bool,
    /// 扁平化缓存有效时携带其布局，后端可据此走融合快速路径；否则为`None`（慢路径）
    pub fused: Option<&'a FlatLayout>,
}

/// 外部循环计算后端
///
/// `params`按层依次排列，每层顺序为`(w_ih, w_hh, b_ih, b_hh)`，无偏置时只有前两项。
/// 对于普通RNN和GRU，`state`形状为`[num_layers*num_directions, batch, hidden_size]`；
/// LSTM的状态为`(hidden, cell)`二元组，二者形状相同。
///
/// 未实现的变体默认返回`RnnError::Backend`。
pub trait RecurrentBackend {
    fn rnn_tanh(
        &self,
        _input: &Tensor,
        _state: &Tensor,
        _params: &[Tensor],
        _call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, Tensor), RnnError> {
        Err(unimplemented_mode(BackendMode::RnnTanh))
    }

    fn rnn_relu(
        &self,
        _input: &Tensor,
        _state: &Tensor,
        _params: &[Tensor],
        _call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, Tensor), RnnError> {
        Err(unimplemented_mode(BackendMode::RnnRelu))
    }

    fn gru(
        &self,
        _input: &Tensor,
        _state: &Tensor,
        _params: &[Tensor],
        _call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, Tensor), RnnError> {
        Err(unimplemented_mode(BackendMode::Gru))
    }

    fn lstm(
        &self,
        _input: &Tensor,
        _state: (&Tensor, &Tensor),
        _params: &[Tensor],
        _call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, (Tensor, Tensor)), RnnError> {
        Err(unimplemented_mode(BackendMode::Lstm))
    }
}

fn unimplemented_mode(mode: BackendMode) -> RnnError {
    RnnError::Backend(format!("后端未实现{mode}"))
}
