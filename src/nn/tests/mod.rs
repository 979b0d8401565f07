/*
 * @Author       : 老董
 * @Date         : 2026-02-08
 * @Description  : nn 模块单元测试，以及测试共用的模拟后端
 *
 * 模拟后端不做真实的 RNN 运算，只做一个依赖输入与初始状态的简单递推：
 *   c_t = c_{t-1} + 0.1 * sum(x_t)（仅 LSTM）
 *   h_t = tanh(0.1 * sum(x_t) + h_{t-1})（Rnn/Gru），LSTM 为 h_t = tanh(c_t)
 * 所有层/方向的状态行同步更新，输出取最后一层各方向的隐藏状态。
 * 每次调用都会记录收到的参数，便于检查扁平化缓存是否被使用。
 */

mod layer_rnn;

use std::cell::RefCell;

use ndarray::{ArrayD, IxDyn};

use crate::nn::{BackendMode, FlatLayout, RecurrentBackend, RecurrentCall, RnnError};
use crate::tensor::Tensor;

/// 模拟后端收到的一次调用
#[derive(Debug, Clone)]
pub(super) struct CallRecord {
    pub mode: BackendMode,
    pub param_storage_ids: Vec<usize>,
    pub param_shapes: Vec<Vec<usize>>,
    pub has_biases: bool,
    pub num_layers: usize,
    pub train: bool,
    pub bidirectional: bool,
    pub batch_first: bool,
    pub fused: Option<FlatLayout>,
}

#[derive(Default)]
pub(super) struct MockBackend {
    calls: RefCell<Vec<CallRecord>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.borrow().clone()
    }

    pub fn last_call(&self) -> CallRecord {
        self.calls
            .borrow()
            .last()
            .cloned()
            .expect("后端尚未被调用")
    }

    fn record(&self, mode: BackendMode, params: &[Tensor], call: &RecurrentCall<'_>) {
        self.calls.borrow_mut().push(CallRecord {
            mode,
            param_storage_ids: params.iter().map(Tensor::storage_id).collect(),
            param_shapes: params.iter().map(|p| p.shape().to_vec()).collect(),
            has_biases: call.has_biases,
            num_layers: call.num_layers,
            train: call.train,
            bidirectional: call.bidirectional,
            batch_first: call.batch_first,
            fused: call.fused.cloned(),
        });
    }
}

/// 按输入布局取(t, b, k)处的下标
fn index(batch_first: bool, t: usize, b: usize, k: usize) -> [usize; 3] {
    if batch_first { [b, t, k] } else { [t, b, k] }
}

/// 模拟递推；`cell`为Some时按LSTM方式更新
fn run(
    input: &Tensor,
    hidden: &Tensor,
    mut cell: Option<ArrayD<f32>>,
    call: &RecurrentCall<'_>,
) -> (Tensor, ArrayD<f32>, Option<ArrayD<f32>>) {
    let x = input.to_array();
    let mut h = hidden.to_array();
    let (seq_len, batch) = if call.batch_first {
        (x.shape()[1], x.shape()[0])
    } else {
        (x.shape()[0], x.shape()[1])
    };
    let features = x.shape()[2];
    let (rows, hidden_size) = (h.shape()[0], h.shape()[2]);
    let num_directions = if call.bidirectional { 2 } else { 1 };

    let out_shape = if call.batch_first {
        [batch, seq_len, num_directions * hidden_size]
    } else {
        [seq_len, batch, num_directions * hidden_size]
    };
    let mut out = ArrayD::<f32>::zeros(IxDyn(&out_shape));

    for t in 0..seq_len {
        for b in 0..batch {
            let drive = 0.1
                * (0..features)
                    .map(|k| x[&index(call.batch_first, t, b, k)[..]])
                    .sum::<f32>();
            for r in 0..rows {
                for j in 0..hidden_size {
                    let at = [r, b, j];
                    let value = match cell.as_mut() {
                        Some(c) => {
                            c[&at[..]] += drive;
                            c[&at[..]].tanh()
                        }
                        None => (drive + h[&at[..]]).tanh(),
                    };
                    h[&at[..]] = value;
                }
            }
            for d in 0..num_directions {
                for j in 0..hidden_size {
                    let value = h[&[rows - num_directions + d, b, j][..]];
                    out[&index(call.batch_first, t, b, d * hidden_size + j)[..]] = value;
                }
            }
        }
    }
    (Tensor::from_array(&out), h, cell)
}

impl RecurrentBackend for MockBackend {
    fn rnn_tanh(
        &self,
        input: &Tensor,
        state: &Tensor,
        params: &[Tensor],
        call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, Tensor), RnnError> {
        self.record(BackendMode::RnnTanh, params, call);
        let (output, h, _) = run(input, state, None, call);
        Ok((output, Tensor::from_array(&h)))
    }

    fn rnn_relu(
        &self,
        input: &Tensor,
        state: &Tensor,
        params: &[Tensor],
        call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, Tensor), RnnError> {
        self.record(BackendMode::RnnRelu, params, call);
        let (output, h, _) = run(input, state, None, call);
        Ok((output, Tensor::from_array(&h)))
    }

    fn gru(
        &self,
        input: &Tensor,
        state: &Tensor,
        params: &[Tensor],
        call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, Tensor), RnnError> {
        self.record(BackendMode::Gru, params, call);
        let (output, h, _) = run(input, state, None, call);
        Ok((output, Tensor::from_array(&h)))
    }

    fn lstm(
        &self,
        input: &Tensor,
        state: (&Tensor, &Tensor),
        params: &[Tensor],
        call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, (Tensor, Tensor)), RnnError> {
        self.record(BackendMode::Lstm, params, call);
        let (output, h, c) = run(input, state.0, Some(state.1.to_array()), call);
        let c = c.expect("LSTM 模拟一定带有细胞状态");
        Ok((output, (Tensor::from_array(&h), Tensor::from_array(&c))))
    }
}

/// 只实现了 GRU 的后端，用于检查默认实现的报错
pub(super) struct GruOnlyBackend;

impl RecurrentBackend for GruOnlyBackend {
    fn gru(
        &self,
        input: &Tensor,
        state: &Tensor,
        _params: &[Tensor],
        _call: &RecurrentCall<'_>,
    ) -> Result<(Tensor, Tensor), RnnError> {
        Ok((input.clone(), state.clone()))
    }
}

/// 生成形状为`shape`、数值为 0.1, 0.2, ... 的输入
pub(super) fn ramp(shape: &[usize]) -> Tensor {
    let size = shape.iter().product::<usize>();
    let data = (1..=size).map(|i| i as f32 * 0.1).collect::<Vec<_>>();
    Tensor::new(&data, shape)
}
