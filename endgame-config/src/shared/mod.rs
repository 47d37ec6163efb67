mod base;
mod etcdctl;
mod gate;
mod kube;
mod sentry;
mod tls;

pub use base::*;
pub use etcdctl::*;
pub use gate::*;
pub use kube::*;
pub use sentry::*;
pub use tls::*;
