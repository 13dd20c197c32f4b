//! Per-resource handler contracts
//!
//! Every driver implements the subset of these traits it can back with its
//! vendor API. Handlers are obtained from a `CloudConnection`; an absent
//! capability is reported by the factory method, never stubbed here.

use crate::error::Result;
use crate::resources::*;
use async_trait::async_trait;

/// VM lifecycle
///
/// Vendor states are normalized into
/// `Creating → Running ⇄ {Suspending → Suspended, Rebooting → Running}` and
/// `Running | Suspended → Terminating → Terminated`.
#[async_trait]
pub trait VmHandler: Send + Sync {
    /// Creates a VM and returns it as re-read from the vendor.
    ///
    /// Fails with `AlreadyExists` when a VM with the same name is found. The
    /// lookup and the create are separate vendor calls and nothing serializes
    /// them: two concurrent calls with the same name can both pass the lookup,
    /// and whether the second create errors or produces a duplicate is up to
    /// the vendor. Pass `VmReqInfo::client_token` to get vendor-side
    /// deduplication where the provider supports it.
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo>;

    /// Stops the VM, keeping its disks. Returns the status reached.
    async fn suspend_vm(&self, vm_id: &str) -> Result<VmStatus>;

    async fn resume_vm(&self, vm_id: &str) -> Result<VmStatus>;

    async fn reboot_vm(&self, vm_id: &str) -> Result<VmStatus>;

    /// Deletes the VM. A second call on the same id surfaces the vendor's
    /// not-found error.
    async fn terminate_vm(&self, vm_id: &str) -> Result<VmStatus>;

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>>;

    async fn get_vm_status(&self, vm_id: &str) -> Result<VmStatusInfo>;

    async fn list_vm(&self) -> Result<Vec<VmInfo>>;

    async fn get_vm(&self, vm_id: &str) -> Result<VmInfo>;
}

#[async_trait]
pub trait ImageHandler: Send + Sync {
    async fn create_image(&self, req: ImageReqInfo) -> Result<ImageInfo>;
    async fn list_image(&self) -> Result<Vec<ImageInfo>>;
    async fn get_image(&self, image_id: &str) -> Result<ImageInfo>;
    async fn delete_image(&self, image_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait SecurityHandler: Send + Sync {
    async fn create_security(&self, req: SecurityReqInfo) -> Result<SecurityInfo>;
    async fn list_security(&self) -> Result<Vec<SecurityInfo>>;
    async fn get_security(&self, security_id: &str) -> Result<SecurityInfo>;
    async fn delete_security(&self, security_id: &str) -> Result<bool>;
}

/// Virtual networks
///
/// Most drivers model a virtual network as a subnet of the shared
/// `CB-VNet` base network, allocating its CIDR when the request has none.
#[async_trait]
pub trait VNetworkHandler: Send + Sync {
    async fn create_vnetwork(&self, req: VNetworkReqInfo) -> Result<VNetworkInfo>;
    async fn list_vnetwork(&self) -> Result<Vec<VNetworkInfo>>;
    async fn get_vnetwork(&self, vnetwork_id: &str) -> Result<VNetworkInfo>;
    async fn delete_vnetwork(&self, vnetwork_id: &str) -> Result<bool>;
}

/// Network interfaces
///
/// Not every platform exposes NICs independently of VMs; see the driver's
/// own documentation before assuming symmetric create/delete.
#[async_trait]
pub trait VNicHandler: Send + Sync {
    async fn create_vnic(&self, req: VNicReqInfo) -> Result<VNicInfo>;
    async fn list_vnic(&self) -> Result<Vec<VNicInfo>>;
    async fn get_vnic(&self, vnic_id: &str) -> Result<VNicInfo>;
    async fn delete_vnic(&self, vnic_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait KeyPairHandler: Send + Sync {
    async fn create_key(&self, req: KeyPairReqInfo) -> Result<KeyPairInfo>;
    async fn list_key(&self) -> Result<Vec<KeyPairInfo>>;
    async fn get_key(&self, key_name: &str) -> Result<KeyPairInfo>;
    async fn delete_key(&self, key_name: &str) -> Result<bool>;
}

#[async_trait]
pub trait PublicIpHandler: Send + Sync {
    async fn create_public_ip(&self, req: PublicIpReqInfo) -> Result<PublicIpInfo>;
    async fn list_public_ip(&self) -> Result<Vec<PublicIpInfo>>;
    async fn get_public_ip(&self, public_ip_id: &str) -> Result<PublicIpInfo>;
    async fn delete_public_ip(&self, public_ip_id: &str) -> Result<bool>;
}
