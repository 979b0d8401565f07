use crate::tensor::{DType, Device, Tensor};

#[test]
fn test_to_same_device_shares_storage() {
    let a = Tensor::ones(&[2, 3]);
    let b = a.to(Device::Cpu, DType::F32);
    assert!(a.same_storage(&b));
}

#[test]
fn test_to_other_device_reallocates() {
    let a = Tensor::new(&[1., 2., 3.], &[3]);
    let b = a.to_device(Device::Cuda(0));
    assert!(!a.same_storage(&b));
    assert_eq!(b.device(), Device::Cuda(0));
    assert_eq!(b.dtype(), DType::F32);
    assert_eq!(b.to_vec(), a.to_vec());

    let c = b.to_dtype(DType::F64);
    assert!(!b.same_storage(&c));
    assert_eq!(c.device(), Device::Cuda(0));
    assert_eq!(c.dtype(), DType::F64);
}

#[test]
fn test_narrow_keeps_device() {
    let a = Tensor::zeros_on(&[4, 2], Device::Cuda(2), DType::F16);
    let view = a.narrow(1, 2).unwrap();
    assert_eq!(view.device(), Device::Cuda(2));
    assert_eq!(view.dtype(), DType::F16);
}

#[test]
fn test_device_display() {
    assert_eq!(Device::Cpu.to_string(), "cpu");
    assert_eq!(Device::Cuda(3).to_string(), "cuda:3");
    assert_eq!(DType::F16.to_string(), "f16");
}
