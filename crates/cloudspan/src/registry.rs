//! Drivers compiled into this binary

use cloudspan_driver::DriverRegistry;
#[cfg(any(feature = "aws", feature = "rest"))]
use std::sync::Arc;

pub fn build() -> DriverRegistry {
    #[allow(unused_mut)]
    let mut registry = DriverRegistry::new();

    #[cfg(feature = "aws")]
    registry.register(Arc::new(cloudspan_aws::AwsDriver::new()));

    #[cfg(feature = "rest")]
    {
        registry.register(Arc::new(cloudspan_alibaba::AlibabaDriver::new()));
        registry.register(Arc::new(cloudspan_azure::AzureDriver::new()));
        registry.register(Arc::new(cloudspan_gcp::GcpDriver::new()));
        registry.register(Arc::new(cloudspan_openstack::OpenStackDriver::new()));
    }

    registry
}
