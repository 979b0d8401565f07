/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : 循环网络参数管理器（RNN/LSTM/GRU 共用）
 *
 * 负责：
 * - 按层（及方向）创建并持有 w_ih / w_hh / b_ih / b_hh；
 * - `reset()`批量重新初始化；
 * - 维护供后端快速路径使用的扁平化参数缓存，并在参数身份变化后判定其过期。
 *
 * 形状（gate_size = number_of_gates * hidden_size）：
 * - w_ih: [gate_size, input_size]（第0层）或 [gate_size, hidden_size * num_directions]（其余层）
 * - w_hh: [gate_size, hidden_size]
 * - b_ih / b_hh: [gate_size]
 *
 * # 扁平化缓存的约定
 * 替换参数（`set_w_ih`等）会使缓存过期并清空之，但**不会**自动重新扁平化；
 * 替换完毕后须由调用方调用`flatten_parameters()`。
 * `reset()`、`to()`、`compact_parameters()`会自行调用。
 * 缓存过期期间前向传播照常进行，只是退回慢路径。
 */

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::flat_weights::{FlatLayout, FlatWeightsCache};
use super::options::RnnOptionsBase;
use super::BackendMode;
use crate::errors::ComparisonOperator;
use crate::nn::{RecurrentCall, RnnError};
use crate::tensor::{DType, Device, Tensor};

/// 单次前向传播的结果
#[derive(Debug, Clone)]
pub struct RnnOutput {
    /// 所有时间步的输出
    pub output: Tensor,
    /// 最后一个时间步的状态，可作为下一次调用的初始状态
    pub state: Tensor,
}

/// 为`set_w_ih`等生成替换方法：替换改变参数身份，因而推进代数，
/// 并清空缓存（不再持有被替换下来的张量）
macro_rules! parameter_setters {
    ($($field:ident),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = "替换第`index`个`" $field "`（索引为`layer * num_directions + direction`）。"]
                #[doc = ""]
                #[doc = "新张量形状须与原参数一致。替换后扁平化缓存过期，须调用`flatten_parameters()`。"]
                pub fn [<set_ $field>](&mut self, index: usize, tensor: Tensor) -> Result<(), RnnError> {
                    Self::replace(&mut self.$field, stringify!($field), index, tensor)?;
                    self.generation += 1;
                    self.flat_weights.clear();
                    Ok(())
                }
            )*
        }
    };
}

pub struct RecurrentBase {
    options: RnnOptionsBase,
    number_of_gates: usize,
    backend_mode: Option<BackendMode>,
    w_ih: Vec<Tensor>,
    w_hh: Vec<Tensor>,
    b_ih: Vec<Tensor>,
    b_hh: Vec<Tensor>,
    flat_weights: FlatWeightsCache,
    /// 参数身份每变化一次加一
    generation: u64,
    training: bool,
    rng: StdRng,
}

/// 深拷贝：每个参数都复制到新分配的存储上（与原模块互不共享），
/// 选项、后端模式、训练标志与随机数状态照搬，然后重新扁平化。
/// 原模块已紧凑化（布局`packed`）时，拷贝同样紧凑化。
impl Clone for RecurrentBase {
    fn clone(&self) -> Self {
        let copy = |tensors: &[Tensor]| -> Vec<Tensor> { tensors.iter().map(Tensor::deep_clone).collect() };
        let mut base = Self {
            options: self.options.clone(),
            number_of_gates: self.number_of_gates,
            backend_mode: self.backend_mode,
            w_ih: copy(&self.w_ih),
            w_hh: copy(&self.w_hh),
            b_ih: copy(&self.b_ih),
            b_hh: copy(&self.b_hh),
            flat_weights: FlatWeightsCache::default(),
            generation: 0,
            training: self.training,
            rng: self.rng.clone(),
        };
        if self.flat_layout().is_some_and(|layout| layout.packed) {
            base.compact_parameters();
        } else {
            base.flatten_parameters();
        }
        base
    }
}

impl RecurrentBase {
    /// 创建参数管理器，随机数种子取自系统熵
    pub fn new(
        options: RnnOptionsBase,
        backend_mode: Option<BackendMode>,
        number_of_gates: usize,
    ) -> Result<Self, RnnError> {
        Self::build(options, backend_mode, number_of_gates, StdRng::from_entropy())
    }

    /// 创建参数管理器，使用固定种子（初始化可复现）
    pub fn new_with_seed(
        options: RnnOptionsBase,
        backend_mode: Option<BackendMode>,
        number_of_gates: usize,
        seed: u64,
    ) -> Result<Self, RnnError> {
        Self::build(
            options,
            backend_mode,
            number_of_gates,
            StdRng::seed_from_u64(seed),
        )
    }

    fn build(
        options: RnnOptionsBase,
        backend_mode: Option<BackendMode>,
        number_of_gates: usize,
        rng: StdRng,
    ) -> Result<Self, RnnError> {
        options.validate()?;
        if number_of_gates < 1 {
            return Err(RnnError::InvalidOption {
                option: "number_of_gates",
                operator: ComparisonOperator::GreaterOrEqual,
                threshold: "1".to_string(),
                got: number_of_gates.to_string(),
            });
        }
        if options.dropout > 0. && options.num_layers == 1 {
            log::warn!(
                "dropout={}只作用于除最后一层外的各层，而当前只有1层，故不会生效",
                options.dropout
            );
        }

        let gate_size = number_of_gates * options.hidden_size;
        let num_directions = options.num_directions();
        let count = options.num_layers * num_directions;
        let mut w_ih = Vec::with_capacity(count);
        let mut w_hh = Vec::with_capacity(count);
        let mut b_ih = Vec::with_capacity(count);
        let mut b_hh = Vec::with_capacity(count);
        for layer in 0..options.num_layers {
            let layer_input_size = if layer == 0 {
                options.input_size
            } else {
                options.hidden_size * num_directions
            };
            for _ in 0..num_directions {
                w_ih.push(Tensor::zeros(&[gate_size, layer_input_size]));
                w_hh.push(Tensor::zeros(&[gate_size, options.hidden_size]));
                if options.bias {
                    b_ih.push(Tensor::zeros(&[gate_size]));
                    b_hh.push(Tensor::zeros(&[gate_size]));
                }
            }
        }

        let mut base = Self {
            options,
            number_of_gates,
            backend_mode,
            w_ih,
            w_hh,
            b_ih,
            b_hh,
            flat_weights: FlatWeightsCache::default(),
            generation: 0,
            training: true,
            rng,
        };
        base.reset();
        log::debug!(
            "创建循环网络参数：{}组参数，{}个门，后端模式{:?}",
            count,
            number_of_gates,
            backend_mode
        );
        Ok(base)
    }

    /// 以U(-1/sqrt(hidden_size), 1/sqrt(hidden_size))原地重新初始化全部参数，然后重新扁平化
    pub fn reset(&mut self) {
        let stdv = 1. / (self.options.hidden_size as f32).sqrt();
        let rng = &mut self.rng;
        for tensor in self
            .w_ih
            .iter()
            .chain(&self.w_hh)
            .chain(&self.b_ih)
            .chain(&self.b_hh)
        {
            tensor.uniform_(-stdv, stdv, rng);
        }
        self.flatten_parameters();
    }

    /// 重建扁平化缓存。
    ///
    /// 此方法从不报错：参数间存在别名、没有后端模式、或参数分散在不同设备/数据类型上时，
    /// 只是清空缓存（前向传播退回慢路径）。
    pub fn flatten_parameters(&mut self) {
        self.flat_weights.clear();

        if self.any_parameters_alias() {
            log::debug!("参数之间存在别名，跳过扁平化");
            return;
        }
        let Some(mode) = self.backend_mode else {
            log::debug!("没有可用的后端模式，跳过扁平化");
            return;
        };
        let weights = self.flat_weights();
        let Some(layout) = FlatLayout::describe(mode, &weights) else {
            log::debug!("参数分散在不同的设备或数据类型上，跳过扁平化");
            return;
        };

        log::debug!(
            "扁平化{}个参数（共{}个元素，packed={}）",
            weights.len(),
            layout.total_elements,
            layout.packed
        );
        self.flat_weights = FlatWeightsCache {
            weights,
            layout: Some(layout),
            generation: self.generation,
        };
    }

    /// 是否有两个不同的参数共享存储且区间重叠
    pub fn any_parameters_alias(&self) -> bool {
        let params = self.flat_weights();
        params.iter().enumerate().any(|(i, a)| {
            params[i + 1..].iter().any(|b| a.overlaps(b))
        })
    }

    /// 按层排列的全部参数，每层顺序为`(w_ih, w_hh, b_ih, b_hh)`。
    /// 每次调用都现场生成，不经过缓存。
    pub fn flat_weights(&self) -> Vec<Tensor> {
        let mut weights = Vec::with_capacity(self.num_flat_weights());
        for i in 0..self.w_ih.len() {
            weights.push(self.w_ih[i].clone());
            weights.push(self.w_hh[i].clone());
            if self.options.bias {
                weights.push(self.b_ih[i].clone());
                weights.push(self.b_hh[i].clone());
            }
        }
        weights
    }

    /// 扁平化缓存有效时返回其中的参数
    pub fn cached_flat_weights(&self) -> Option<&[Tensor]> {
        self.is_flattened()
            .then_some(self.flat_weights.weights.as_slice())
    }

    /// 扁平化缓存有效时返回其布局
    pub fn flat_layout(&self) -> Option<&FlatLayout> {
        if self.is_flattened() {
            self.flat_weights.layout.as_ref()
        } else {
            None
        }
    }

    /// 扁平化缓存是否存在且未过期
    pub fn is_flattened(&self) -> bool {
        self.flat_weights.is_fresh(self.generation)
    }

    /// 当前参数身份的代数
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 把全部参数拷贝进同一块新分配的连续存储，再把各参数换成其中互不重叠的视图，
    /// 之后重新扁平化（布局的`packed`为true）。
    pub fn compact_parameters(&mut self) {
        let packed = Tensor::pack(&self.flat_weights());
        self.assign_flat(packed);
        self.generation += 1;
        self.flatten_parameters();
    }

    /// 迁移全部参数到指定设备和数据类型，然后重新扁平化
    pub fn to(&mut self, device: Device, dtype: DType) {
        self.map_parameters(|tensor| tensor.to(device, dtype));
    }

    /// 迁移全部参数到指定设备（各参数保持自身数据类型），然后重新扁平化
    pub fn to_device(&mut self, device: Device) {
        self.map_parameters(|tensor| tensor.to_device(device));
    }

    /// 转换全部参数的数据类型（各参数保持所在设备），然后重新扁平化
    pub fn to_dtype(&mut self, dtype: DType) {
        self.map_parameters(|tensor| tensor.to_dtype(dtype));
    }

    fn map_parameters<F: Fn(&Tensor) -> Tensor>(&mut self, f: F) {
        for tensors in [&mut self.w_ih, &mut self.w_hh, &mut self.b_ih, &mut self.b_hh] {
            for tensor in tensors.iter_mut() {
                *tensor = f(tensor);
            }
        }
        self.generation += 1;
        self.flatten_parameters();
    }

    parameter_setters!(w_ih, w_hh, b_ih, b_hh);

    fn replace(
        tensors: &mut [Tensor],
        kind: &'static str,
        index: usize,
        tensor: Tensor,
    ) -> Result<(), RnnError> {
        let len = tensors.len();
        let slot = tensors
            .get_mut(index)
            .ok_or(RnnError::IndexOutOfRange { kind, index, len })?;
        if !slot.is_same_shape(&tensor) {
            return Err(RnnError::ShapeMismatch {
                name: format!("{kind}[{index}]"),
                expected: slot.shape().to_vec(),
                got: tensor.shape().to_vec(),
            });
        }
        *slot = tensor;
        Ok(())
    }

    /// 按`flat_weights()`的顺序把参数写回各自的列表
    fn assign_flat(&mut self, weights: Vec<Tensor>) {
        let per_layer = if self.options.bias { 4 } else { 2 };
        for (i, chunk) in weights.chunks(per_layer).enumerate() {
            self.w_ih[i] = chunk[0].clone();
            self.w_hh[i] = chunk[1].clone();
            if self.options.bias {
                self.b_ih[i] = chunk[2].clone();
                self.b_hh[i] = chunk[3].clone();
            }
        }
    }

    /// 参数名与参数，命名同 PyTorch：`weight_ih_l{层}`，反向再加`_reverse`后缀
    pub fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let num_directions = self.options.num_directions();
        let mut named = Vec::with_capacity(self.num_flat_weights());
        for i in 0..self.w_ih.len() {
            let suffix = if i % num_directions == 1 {
                "_reverse"
            } else {
                ""
            };
            let layer = i / num_directions;
            named.push((format!("weight_ih_l{layer}{suffix}"), self.w_ih[i].clone()));
            named.push((format!("weight_hh_l{layer}{suffix}"), self.w_hh[i].clone()));
            if self.options.bias {
                named.push((format!("bias_ih_l{layer}{suffix}"), self.b_ih[i].clone()));
                named.push((format!("bias_hh_l{layer}{suffix}"), self.b_hh[i].clone()));
            }
        }
        named
    }

    fn num_flat_weights(&self) -> usize {
        self.w_ih.len() + self.w_hh.len() + self.b_ih.len() + self.b_hh.len()
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓前向传播↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 普通RNN与GRU共用的前向传播（LSTM的状态是二元组，另行处理）。
    ///
    /// `input`须为3阶张量（否则返回`RnnError::InvalidInputRank`，不调用`function`）。
    /// `state`为`None`时使用全零状态，形状为`[num_layers*num_directions, batch, hidden_size]`，
    /// 设备与数据类型同`input`。本方法不做递推运算，只把参数交给`function`。
    pub fn generic_forward<F>(
        &self,
        function: F,
        input: &Tensor,
        state: Option<&Tensor>,
    ) -> Result<RnnOutput, RnnError>
    where
        F: FnOnce(&Tensor, &Tensor, &[Tensor], &RecurrentCall<'_>) -> Result<(Tensor, Tensor), RnnError>,
    {
        self.check_input(input)?;
        let state = match state {
            Some(state) => state.clone(),
            None => self.zero_state(input)?,
        };
        let (output, state) =
            self.with_forward_parameters(|params, call| function(input, &state, params, call))?;
        Ok(RnnOutput { output, state })
    }

    /// 以当前可用的参数列表与调用参数执行`f`：缓存有效时走快速路径，否则现场生成参数列表
    pub(crate) fn with_forward_parameters<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&[Tensor], &RecurrentCall<'_>) -> T,
    {
        if self.is_flattened() {
            let call = self.call_args(self.flat_weights.layout.as_ref());
            f(&self.flat_weights.weights, &call)
        } else {
            log::debug!("扁平化缓存不可用（代数{}），走慢路径", self.generation);
            let weights = self.flat_weights();
            f(&weights, &self.call_args(None))
        }
    }

    fn call_args<'a>(&self, fused: Option<&'a FlatLayout>) -> RecurrentCall<'a> {
        RecurrentCall {
            has_biases: self.options.bias,
            num_layers: self.options.num_layers,
            dropout: self.options.dropout,
            train: self.training,
            bidirectional: self.options.bidirectional,
            batch_first: self.options.batch_first,
            fused,
        }
    }

    /// 输入须为3阶张量，无论是否显式传入初始状态
    pub(crate) fn check_input(&self, input: &Tensor) -> Result<(), RnnError> {
        if input.dimension() != 3 {
            return Err(RnnError::InvalidInputRank(input.dimension()));
        }
        Ok(())
    }

    /// 与`input`匹配的全零初始状态
    pub fn zero_state(&self, input: &Tensor) -> Result<Tensor, RnnError> {
        self.check_input(input)?;
        let batch_dim = if self.options.batch_first { 0 } else { 1 };
        let shape = self.state_shape(input.shape()[batch_dim]);
        Ok(Tensor::zeros_on(&shape, input.device(), input.dtype()))
    }

    /// 给定批大小时状态张量的形状
    pub fn state_shape(&self, batch_size: usize) -> [usize; 3] {
        [
            self.options.num_layers * self.options.num_directions(),
            batch_size,
            self.options.hidden_size,
        ]
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑前向传播↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    pub fn options(&self) -> &RnnOptionsBase {
        &self.options
    }

    pub fn number_of_gates(&self) -> usize {
        self.number_of_gates
    }

    pub fn backend_mode(&self) -> Option<BackendMode> {
        self.backend_mode
    }

    pub fn w_ih(&self) -> &[Tensor] {
        &self.w_ih
    }

    pub fn w_hh(&self) -> &[Tensor] {
        &self.w_hh
    }

    /// 无偏置时为空
    pub fn b_ih(&self) -> &[Tensor] {
        &self.b_ih
    }

    /// 无偏置时为空
    pub fn b_hh(&self) -> &[Tensor] {
        &self.b_hh
    }

    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }
}
