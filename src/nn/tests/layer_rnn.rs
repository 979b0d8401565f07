/*
 * @Author       : 老董
 * @Date         : 2026-02-08
 * @Description  : Rnn 层单元测试（参数形状、扁平化顺序、前向传播的参数转交）
 */

use super::{MockBackend, ramp};
use crate::nn::{BackendMode, Module, Nonlinearity, Recurrent, Rnn, RnnError, RnnOptions};
use crate::tensor::{DType, Device, Tensor};
use approx::assert_abs_diff_eq;

// ==================== 基础功能测试 ====================

/// 测试 Rnn 层创建
#[test]
fn test_rnn_new() -> Result<(), RnnError> {
    let rnn = Rnn::new(RnnOptions::new(4, 8))?;
    let base = rnn.base();

    assert_eq!(base.options().input_size, 4);
    assert_eq!(base.options().hidden_size, 8);
    assert_eq!(base.number_of_gates(), 1);
    assert_eq!(base.backend_mode(), Some(BackendMode::RnnTanh));
    assert_eq!(rnn.nonlinearity(), Nonlinearity::Tanh);
    assert!(base.is_flattened());
    assert!(!rnn.any_parameters_alias());
    Ok(())
}

#[test]
fn test_rnn_relu_mode() -> Result<(), RnnError> {
    let rnn = Rnn::new(RnnOptions::new(4, 8).with_nonlinearity(Nonlinearity::Relu))?;
    assert_eq!(rnn.base().backend_mode(), Some(BackendMode::RnnRelu));
    Ok(())
}

/// 测试多层、双向时的参数形状
#[test]
fn test_rnn_parameter_shapes() -> Result<(), RnnError> {
    let rnn = Rnn::new(
        RnnOptions::new(3, 5)
            .with_num_layers(2)
            .with_bidirectional(true),
    )?;
    let base = rnn.base();

    assert_eq!(base.w_ih().len(), 4);
    assert_eq!(base.w_hh().len(), 4);
    assert_eq!(base.b_ih().len(), 4);
    assert_eq!(base.b_hh().len(), 4);

    // 第0层的两个方向以原始输入为输入
    assert_eq!(base.w_ih()[0].shape(), &[5, 3]);
    assert_eq!(base.w_ih()[1].shape(), &[5, 3]);
    // 第1层以双向拼接的隐藏状态为输入
    assert_eq!(base.w_ih()[2].shape(), &[5, 10]);
    assert_eq!(base.w_ih()[3].shape(), &[5, 10]);
    for i in 0..4 {
        assert_eq!(base.w_hh()[i].shape(), &[5, 5]);
        assert_eq!(base.b_ih()[i].shape(), &[5]);
        assert_eq!(base.b_hh()[i].shape(), &[5]);
    }
    Ok(())
}

/// 测试参数初始化范围：U(-1/sqrt(hidden), 1/sqrt(hidden))
#[test]
fn test_rnn_init_range() -> Result<(), RnnError> {
    let rnn = Rnn::new_with_seed(RnnOptions::new(6, 16), 42)?;
    let bound = 1. / 16f32.sqrt();
    for param in rnn.parameters() {
        assert!(param.to_vec().iter().all(|&x| x >= -bound && x < bound));
    }
    Ok(())
}

/// 相同种子得到相同参数
#[test]
fn test_rnn_seed_reproducible() -> Result<(), RnnError> {
    let a = Rnn::new_with_seed(RnnOptions::new(3, 4), 7)?;
    let b = Rnn::new_with_seed(RnnOptions::new(3, 4), 7)?;
    for (pa, pb) in a.parameters().iter().zip(b.parameters()) {
        assert_eq!(pa.to_vec(), pb.to_vec());
    }
    Ok(())
}

// ==================== 前向传播 ====================

/// 测试前向传播的输出形状（seq=3, batch=2, hidden=4）
#[test]
fn test_rnn_forward_shapes() -> Result<(), RnnError> {
    let backend = MockBackend::new();

    let rnn = Rnn::new(RnnOptions::new(5, 4))?;
    let out = rnn.forward(&backend, &ramp(&[3, 2, 5]), None)?;
    assert_eq!(out.output.shape(), &[3, 2, 4]);
    assert_eq!(out.state.shape(), &[1, 2, 4]);

    let rnn = Rnn::new(RnnOptions::new(5, 4).with_batch_first(true))?;
    let out = rnn.forward(&backend, &ramp(&[2, 3, 5]), None)?;
    assert_eq!(out.output.shape(), &[2, 3, 4]);
    assert_eq!(out.state.shape(), &[1, 2, 4]);
    assert!(backend.last_call().batch_first);
    Ok(())
}

/// 不传初始状态 与 显式传入全零状态 的结果一致
#[test]
fn test_rnn_absent_state_equals_zero_state() -> Result<(), RnnError> {
    let backend = MockBackend::new();
    let rnn = Rnn::new(RnnOptions::new(3, 4))?;
    let input = ramp(&[3, 2, 3]);

    let implicit = rnn.forward(&backend, &input, None)?;
    let zeros = Tensor::zeros(&[1, 2, 4]);
    let explicit = rnn.forward(&backend, &input, Some(&zeros))?;

    assert_eq!(implicit.output.to_vec(), explicit.output.to_vec());
    assert_eq!(implicit.state.to_vec(), explicit.state.to_vec());
    Ok(())
}

/// 上一次的状态可作为下一次的初始状态
#[test]
fn test_rnn_state_chaining() -> Result<(), RnnError> {
    let backend = MockBackend::new();
    let rnn = Rnn::new(RnnOptions::new(1, 1))?;
    let input = Tensor::new(&[1., 2.], &[2, 1, 1]);

    let first = rnn.forward(&backend, &input, None)?;
    let h0 = (0.1f32).tanh();
    let h1 = (0.2 + h0).tanh();
    assert_abs_diff_eq!(first.output.to_vec().as_slice(), &[h0, h1][..], epsilon = 1e-6);

    let second = rnn.forward(&backend, &input, Some(&first.state))?;
    let h2 = (0.1 + h1).tanh();
    let h3 = (0.2 + h2).tanh();
    assert_abs_diff_eq!(second.state.to_vec().as_slice(), &[h3][..], epsilon = 1e-6);
    Ok(())
}

/// 零状态的设备与数据类型随输入
#[test]
fn test_rnn_zero_state_follows_input() -> Result<(), RnnError> {
    let rnn = Rnn::new(RnnOptions::new(2, 3).with_num_layers(2))?;
    let input = Tensor::zeros_on(&[4, 5, 2], Device::Cuda(0), DType::F16);
    let state = rnn.base().zero_state(&input)?;
    assert_eq!(state.shape(), &[2, 5, 3]);
    assert_eq!(state.device(), Device::Cuda(0));
    assert_eq!(state.dtype(), DType::F16);

    let bad = Tensor::zeros(&[4, 2]);
    assert!(matches!(
        rnn.base().zero_state(&bad),
        Err(RnnError::InvalidInputRank(2))
    ));
    Ok(())
}

/// 前向传播按非线性函数分派到后端的不同函数，并转交正确的调用参数
#[test]
fn test_rnn_forward_dispatch() -> Result<(), RnnError> {
    let backend = MockBackend::new();
    let input = ramp(&[3, 2, 3]);

    let mut rnn = Rnn::new(
        RnnOptions::new(3, 4)
            .with_nonlinearity(Nonlinearity::Relu)
            .with_num_layers(2)
            .with_dropout(0.5),
    )?;
    rnn.forward(&backend, &input, None)?;
    let call = backend.last_call();
    assert_eq!(call.mode, BackendMode::RnnRelu);
    assert_eq!(call.num_layers, 2);
    assert!(call.has_biases);
    assert!(call.train);
    assert_eq!(call.param_shapes.len(), 8);

    rnn.eval();
    rnn.forward(&backend, &input, None)?;
    assert!(!backend.last_call().train);

    let rnn = Rnn::new(RnnOptions::new(3, 4))?;
    rnn.forward(&backend, &input, None)?;
    assert_eq!(backend.last_call().mode, BackendMode::RnnTanh);
    assert_eq!(backend.calls().len(), 3);
    Ok(())
}

/// 测试 pretty print
#[test]
fn test_rnn_display() -> Result<(), RnnError> {
    let rnn = Rnn::new(RnnOptions::new(3, 4))?;
    assert_eq!(
        rnn.to_string(),
        "Rnn(input_size=3, hidden_size=4, num_layers=1, bias=true, batch_first=false, dropout=0, bidirectional=false, nonlinearity=tanh)"
    );
    Ok(())
}

/// 输入阶数检查不依赖是否传入初始状态，且不合法时不调用后端
#[test]
fn test_rnn_rejects_bad_input_rank() -> Result<(), RnnError> {
    let backend = MockBackend::new();
    let rnn = Rnn::new(RnnOptions::new(3, 4))?;
    let bad = Tensor::zeros(&[2, 3]);
    let state = Tensor::zeros(&[1, 2, 4]);

    assert!(matches!(
        rnn.forward(&backend, &bad, None),
        Err(RnnError::InvalidInputRank(2))
    ));
    assert!(matches!(
        rnn.forward(&backend, &bad, Some(&state)),
        Err(RnnError::InvalidInputRank(2))
    ));
    assert!(backend.calls().is_empty());
    Ok(())
}
