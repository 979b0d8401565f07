/*
 * @Author       : 老董
 * @Date         : 2026-02-04
 * @Description  : 负责循环神经网络（RNN/LSTM/GRU）的参数管理
 */

mod backend;
mod error;
pub mod layer;
mod module;
mod state_dict;

pub use backend::{RecurrentBackend, RecurrentCall};
pub use error::RnnError;
pub use layer::{
    AnyRecurrent, BackendMode, FlatLayout, Gru, GruOptions, Lstm, LstmOptions, LstmOutput,
    LstmState, Nonlinearity, Recurrent, RecurrentBase, RecurrentKind, RecurrentState, Rnn,
    RnnOptions, RnnOptionsBase, RnnOutput,
};
pub use module::Module;
pub use state_dict::{StateDict, TensorRecord};

#[cfg(test)]
mod tests;
