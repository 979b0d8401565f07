/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 张量所在设备与数据类型，以及二者之间的迁移（to）
 *
 * 宿主端统一以f32保存数值；`DType`只是交给后端解读的标记。
 * 迁移到不同设备或数据类型时总会分配新的存储，因此参数身份随之改变。
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Tensor;

/// 张量所在设备
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Device {
    #[default]
    Cpu,
    /// GPU，附带设备序号
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(index) => write!(f, "cuda:{index}"),
        }
    }
}

/// 张量的逻辑数据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DType {
    #[default]
    F32,
    F64,
    F16,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::F16 => "f16",
        };
        write!(f, "{name}")
    }
}

impl Tensor {
    pub fn device(&self) -> Device {
        self.device
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// 迁移到指定设备和数据类型。
    /// 二者都未变化时返回共享存储的句柄；否则拷贝到新分配的存储上。
    pub fn to(&self, device: Device, dtype: DType) -> Tensor {
        if self.device == device && self.dtype == dtype {
            return self.clone();
        }
        let mut moved = self.deep_clone();
        moved.device = device;
        moved.dtype = dtype;
        moved
    }

    pub fn to_device(&self, device: Device) -> Tensor {
        self.to(device, self.dtype)
    }

    pub fn to_dtype(&self, dtype: DType) -> Tensor {
        self.to(self.device, dtype)
    }
}
