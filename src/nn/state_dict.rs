/*
 * @Author       : 老董
 * @Date         : 2026-02-07
 * @Description  : 参数字典（state dict）：按名字保存/加载参数数值
 *
 * 只保存数值与形状，不保存设备与数据类型；加载时把数值原地拷进已有参数，
 * 参数身份不变，因此扁平化缓存依旧有效。
 */

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::TensorError;
use crate::nn::RnnError;
use crate::tensor::Tensor;

/// 单个张量的可序列化记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorRecord {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl TensorRecord {
    pub fn from_tensor(tensor: &Tensor) -> Self {
        Self {
            shape: tensor.shape().to_vec(),
            data: tensor.to_vec(),
        }
    }

    /// 还原为（cpu上的）张量；数据长度与形状不符时报错
    pub fn to_tensor(&self) -> Result<Tensor, RnnError> {
        let expected = self.shape.iter().product::<usize>();
        if self.data.len() != expected {
            return Err(TensorError::DataLengthMismatch {
                data_len: self.data.len(),
                shape: self.shape.clone(),
                expected,
            }
            .into());
        }
        Ok(Tensor::new(&self.data, &self.shape))
    }
}

/// 有序的参数字典
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    entries: Vec<(String, TensorRecord)>,
}

impl StateDict {
    pub fn from_named(named: &[(String, Tensor)]) -> Self {
        Self {
            entries: named
                .iter()
                .map(|(name, tensor)| (name.clone(), TensorRecord::from_tensor(tensor)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TensorRecord> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, record)| record)
    }

    /// 插入记录；同名记录已存在时替换之
    pub fn insert(&mut self, name: &str, record: TensorRecord) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some((_, old)) => *old = record,
            None => self.entries.push((name.to_string(), record)),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RnnError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RnnError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// 写入本地文件
    pub fn save(&self, path: &Path) -> Result<(), RnnError> {
        let mut file = File::create(path)?;
        file.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// 从本地文件读取
    pub fn load(path: &Path) -> Result<Self, RnnError> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}
