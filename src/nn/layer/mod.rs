/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 循环网络层：Rnn / Lstm / Gru 及其共用的参数管理器
 */

mod flat_weights;
mod gru;
mod lstm;
mod mode;
mod options;
mod recurrent;
mod rnn;
mod rnn_base;

pub use flat_weights::FlatLayout;
pub use gru::Gru;
pub use lstm::{Lstm, LstmOutput, LstmState};
pub use mode::{BackendMode, Nonlinearity, RecurrentKind};
pub use options::{GruOptions, LstmOptions, RnnOptions, RnnOptionsBase};
pub use recurrent::{AnyRecurrent, Recurrent, RecurrentState};
pub use rnn::Rnn;
pub use rnn_base::{RecurrentBase, RnnOutput};
