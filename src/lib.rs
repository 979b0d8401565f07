//! # Only RNN
//!
//! `only_rnn`用纯rust实现仿[pytorch](https://pytorch.org)风格的多层循环网络（RNN/LSTM/GRU）参数管理：
//! 按层创建和初始化权重/偏置，检测参数别名，并维护交给外部后端快速路径使用的扁平化参数缓存。
//!
//! 递推运算本身由实现`nn::RecurrentBackend`的外部后端完成。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
