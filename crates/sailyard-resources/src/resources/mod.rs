//! Resource adapters, one per resource kind

pub mod alarm;
pub mod bucket;
pub mod certificate;
pub mod database;
pub mod disk;
pub mod distribution;
pub mod load_balancer;
pub mod static_ip;

pub use alarm::{AlarmAdapter, AlarmModel};
pub use bucket::{AccessRules, BucketAdapter, BucketModel};
pub use certificate::{CertificateAdapter, CertificateModel};
pub use database::{DatabaseAdapter, DatabaseModel};
pub use disk::{DiskAdapter, DiskAttachment, DiskModel};
pub use distribution::{CacheBehavior, DistributionAdapter, DistributionModel, Origin};
pub use load_balancer::{LoadBalancerAdapter, LoadBalancerModel};
pub use static_ip::{StaticIpAdapter, StaticIpModel};

/// True when `desired` asks for a value that `current` does not hold.
/// An unset desired attribute never forces a change.
pub(crate) fn differs<T: PartialEq>(desired: &Option<T>, current: &Option<T>) -> bool {
    match desired {
        Some(d) => current.as_ref() != Some(d),
        None => false,
    }
}
