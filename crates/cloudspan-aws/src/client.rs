//! EC2 client over `aws-sdk-ec2`

use crate::api::Ec2Api;
use crate::error::{AwsError, sdk};
use crate::model::*;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::Credentials;
use aws_sdk_ec2::primitives::{Blob, DateTimeFormat};
use aws_sdk_ec2::types::{
    self as ec2, DomainType, Filter, InstanceNetworkInterfaceSpecification, InstanceType,
    IpRange, ResourceType, Tag, TagSpecification,
};
use cloudspan_driver::{CloudError, Result};

const CREDENTIALS_PROVIDER: &str = "cloudspan";

/// States [`Ec2Api::describe_instances`] reports
const LIVE_STATES: [&str; 5] = ["pending", "running", "stopping", "stopped", "shutting-down"];

/// Static access-key credentials and the region to talk to
#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

pub struct Ec2Client {
    client: Client,
}

impl Ec2Client {
    pub async fn new(config: AwsConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
        }
    }

    /// Wraps an already configured SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn name_tag(tags: &[Tag]) -> String {
    text(
        tags.iter()
            .find(|t| t.key() == Some(NAME_TAG))
            .and_then(|t| t.value()),
    )
}

fn tag_spec(resource: ResourceType, name: &str) -> TagSpecification {
    TagSpecification::builder()
        .resource_type(resource)
        .tags(Tag::builder().key(NAME_TAG).value(name).build())
        .build()
}

fn filter(name: &str, value: &str) -> Filter {
    Filter::builder().name(name).values(value).build()
}

fn missing(operation: &'static str, field: &'static str) -> CloudError {
    AwsError::MissingField { operation, field }.into()
}

fn not_found(kind: &str, id: &str) -> CloudError {
    CloudError::NotFound(format!("{kind} {id} does not exist"))
}

fn to_instance(i: &ec2::Instance) -> Instance {
    Instance {
        instance_id: text(i.instance_id()),
        name: name_tag(i.tags()),
        image_id: text(i.image_id()),
        instance_type: i
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        state: i
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string())
            .unwrap_or_default(),
        availability_zone: text(i.placement().and_then(|p| p.availability_zone())),
        vpc_id: text(i.vpc_id()),
        subnet_id: text(i.subnet_id()),
        security_group_ids: i
            .security_groups()
            .iter()
            .filter_map(|g| g.group_id())
            .map(str::to_string)
            .collect(),
        network_interface_id: text(
            i.network_interfaces()
                .first()
                .and_then(|n| n.network_interface_id()),
        ),
        public_ip: text(i.public_ip_address()),
        private_ip: text(i.private_ip_address()),
        key_name: text(i.key_name()),
        root_device_name: text(i.root_device_name()),
        launch_time: i
            .launch_time()
            .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok())
            .unwrap_or_default(),
    }
}

fn to_image(i: &ec2::Image) -> Image {
    Image {
        image_id: text(i.image_id()),
        name: text(i.name()),
        state: i.state().map(|s| s.as_str().to_string()).unwrap_or_default(),
        platform_details: text(i.platform_details()),
        architecture: i
            .architecture()
            .map(|a| a.as_str().to_string())
            .unwrap_or_default(),
        root_device_type: i
            .root_device_type()
            .map(|d| d.as_str().to_string())
            .unwrap_or_default(),
    }
}

fn to_vpc(v: &ec2::Vpc) -> Vpc {
    Vpc {
        vpc_id: text(v.vpc_id()),
        name: name_tag(v.tags()),
        cidr_block: text(v.cidr_block()),
        state: v.state().map(|s| s.as_str().to_string()).unwrap_or_default(),
    }
}

fn to_subnet(s: &ec2::Subnet) -> Subnet {
    Subnet {
        subnet_id: text(s.subnet_id()),
        name: name_tag(s.tags()),
        vpc_id: text(s.vpc_id()),
        cidr_block: text(s.cidr_block()),
        state: s.state().map(|s| s.as_str().to_string()).unwrap_or_default(),
        availability_zone: text(s.availability_zone()),
    }
}

fn to_permission(p: &ec2::IpPermission) -> IpPermission {
    IpPermission {
        ip_protocol: text(p.ip_protocol()),
        from_port: p.from_port(),
        to_port: p.to_port(),
        cidr: text(p.ip_ranges().first().and_then(|r| r.cidr_ip())),
    }
}

fn from_permission(p: &IpPermission) -> ec2::IpPermission {
    ec2::IpPermission::builder()
        .ip_protocol(&p.ip_protocol)
        .set_from_port(p.from_port)
        .set_to_port(p.to_port)
        .ip_ranges(IpRange::builder().cidr_ip(&p.cidr).build())
        .build()
}

fn to_security_group(g: &ec2::SecurityGroup) -> SecurityGroup {
    SecurityGroup {
        group_id: text(g.group_id()),
        group_name: text(g.group_name()),
        vpc_id: text(g.vpc_id()),
        description: text(g.description()),
        ingress: g.ip_permissions().iter().map(to_permission).collect(),
        egress: g.ip_permissions_egress().iter().map(to_permission).collect(),
    }
}

fn to_network_interface(n: &ec2::NetworkInterface) -> NetworkInterface {
    NetworkInterface {
        network_interface_id: text(n.network_interface_id()),
        name: name_tag(n.tag_set()),
        subnet_id: text(n.subnet_id()),
        vpc_id: text(n.vpc_id()),
        mac_address: text(n.mac_address()),
        private_ip: text(n.private_ip_address()),
        public_ip: text(n.association().and_then(|a| a.public_ip())),
        attached_instance_id: text(n.attachment().and_then(|a| a.instance_id())),
        status: n.status().map(|s| s.as_str().to_string()).unwrap_or_default(),
        group_ids: n
            .groups()
            .iter()
            .filter_map(|g| g.group_id())
            .map(str::to_string)
            .collect(),
    }
}

fn to_key_pair(k: &ec2::KeyPairInfo) -> KeyPair {
    KeyPair {
        key_name: text(k.key_name()),
        key_pair_id: text(k.key_pair_id()),
        fingerprint: text(k.key_fingerprint()),
        key_type: k.key_type().map(|t| t.as_str().to_string()).unwrap_or_default(),
        public_key: text(k.public_key()),
        private_key: None,
    }
}

fn to_address(a: &ec2::Address) -> Address {
    Address {
        allocation_id: text(a.allocation_id()),
        name: name_tag(a.tags()),
        public_ip: text(a.public_ip()),
        instance_id: text(a.instance_id()),
        association_id: text(a.association_id()),
        network_interface_id: text(a.network_interface_id()),
        domain: a.domain().map(|d| d.as_str().to_string()).unwrap_or_default(),
    }
}

#[async_trait]
impl Ec2Api for Ec2Client {
    async fn run_instance(&self, req: &RunInstance) -> Result<Instance> {
        tracing::debug!(name = %req.name, image = %req.image_id, "RunInstances");
        let mut request = self
            .client
            .run_instances()
            .image_id(&req.image_id)
            .instance_type(InstanceType::from(req.instance_type.as_str()))
            .min_count(1)
            .max_count(1)
            .tag_specifications(tag_spec(ResourceType::Instance, &req.name));

        if req.network_interface_id.is_empty() {
            request = request
                .subnet_id(&req.subnet_id)
                .set_security_group_ids(Some(req.security_group_ids.clone()));
        } else {
            request = request.network_interfaces(
                InstanceNetworkInterfaceSpecification::builder()
                    .device_index(0)
                    .network_interface_id(&req.network_interface_id)
                    .build(),
            );
        }
        if !req.key_name.is_empty() {
            request = request.key_name(&req.key_name);
        }
        if let Some(token) = &req.client_token {
            request = request.client_token(token);
        }

        let output = request.send().await.map_err(sdk("RunInstances"))?;
        output
            .instances()
            .first()
            .map(to_instance)
            .ok_or_else(|| missing("RunInstances", "instance"))
    }

    async fn describe_instances(&self) -> Result<Vec<Instance>> {
        let mut states = Filter::builder().name("instance-state-name");
        for state in LIVE_STATES {
            states = states.values(state);
        }
        let states = states.build();

        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_instances()
                .filters(states.clone())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(sdk("DescribeInstances"))?;
            for reservation in output.reservations() {
                instances.extend(reservation.instances().iter().map(to_instance));
            }
            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => return Ok(instances),
            }
        }
    }

    async fn describe_instance(&self, id: &str) -> Result<Instance> {
        let output = self
            .client
            .describe_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(sdk("DescribeInstances"))?;
        output
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .next()
            .map(to_instance)
            .ok_or_else(|| not_found("instance", id))
    }

    async fn stop_instance(&self, id: &str) -> Result<()> {
        self.client
            .stop_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(sdk("StopInstances"))?;
        Ok(())
    }

    async fn start_instance(&self, id: &str) -> Result<()> {
        self.client
            .start_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(sdk("StartInstances"))?;
        Ok(())
    }

    async fn reboot_instance(&self, id: &str) -> Result<()> {
        self.client
            .reboot_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(sdk("RebootInstances"))?;
        Ok(())
    }

    async fn terminate_instance(&self, id: &str) -> Result<()> {
        self.client
            .terminate_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(sdk("TerminateInstances"))?;
        Ok(())
    }

    async fn create_image(&self, instance_id: &str, name: &str) -> Result<String> {
        let output = self
            .client
            .create_image()
            .instance_id(instance_id)
            .name(name)
            .tag_specifications(tag_spec(ResourceType::Image, name))
            .send()
            .await
            .map_err(sdk("CreateImage"))?;
        output
            .image_id()
            .map(str::to_string)
            .ok_or_else(|| missing("CreateImage", "image id"))
    }

    async fn describe_images(&self) -> Result<Vec<Image>> {
        let output = self
            .client
            .describe_images()
            .owners("self")
            .send()
            .await
            .map_err(sdk("DescribeImages"))?;
        Ok(output.images().iter().map(to_image).collect())
    }

    async fn describe_image(&self, id: &str) -> Result<Image> {
        let output = self
            .client
            .describe_images()
            .image_ids(id)
            .send()
            .await
            .map_err(sdk("DescribeImages"))?;
        output
            .images()
            .first()
            .map(to_image)
            .ok_or_else(|| not_found("image", id))
    }

    async fn deregister_image(&self, id: &str) -> Result<()> {
        self.client
            .deregister_image()
            .image_id(id)
            .send()
            .await
            .map_err(sdk("DeregisterImage"))?;
        Ok(())
    }

    async fn describe_vpcs_by_name(&self, name: &str) -> Result<Vec<Vpc>> {
        let output = self
            .client
            .describe_vpcs()
            .filters(filter(&format!("tag:{NAME_TAG}"), name))
            .send()
            .await
            .map_err(sdk("DescribeVpcs"))?;
        Ok(output.vpcs().iter().map(to_vpc).collect())
    }

    async fn create_vpc(&self, name: &str, cidr: &str) -> Result<Vpc> {
        let output = self
            .client
            .create_vpc()
            .cidr_block(cidr)
            .tag_specifications(tag_spec(ResourceType::Vpc, name))
            .send()
            .await
            .map_err(sdk("CreateVpc"))?;
        output
            .vpc()
            .map(to_vpc)
            .ok_or_else(|| missing("CreateVpc", "vpc"))
    }

    async fn attach_internet_gateway(&self, vpc_id: &str) -> Result<String> {
        let output = self
            .client
            .create_internet_gateway()
            .send()
            .await
            .map_err(sdk("CreateInternetGateway"))?;
        let gateway_id = output
            .internet_gateway()
            .and_then(|g| g.internet_gateway_id())
            .map(str::to_string)
            .ok_or_else(|| missing("CreateInternetGateway", "gateway id"))?;

        self.client
            .attach_internet_gateway()
            .internet_gateway_id(&gateway_id)
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(sdk("AttachInternetGateway"))?;

        let tables = self
            .client
            .describe_route_tables()
            .filters(filter("vpc-id", vpc_id))
            .filters(filter("association.main", "true"))
            .send()
            .await
            .map_err(sdk("DescribeRouteTables"))?;
        let table_id = tables
            .route_tables()
            .first()
            .and_then(|t| t.route_table_id())
            .ok_or_else(|| missing("DescribeRouteTables", "main route table"))?;

        self.client
            .create_route()
            .route_table_id(table_id)
            .destination_cidr_block("0.0.0.0/0")
            .gateway_id(&gateway_id)
            .send()
            .await
            .map_err(sdk("CreateRoute"))?;
        Ok(gateway_id)
    }

    async fn describe_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>> {
        let output = self
            .client
            .describe_subnets()
            .filters(filter("vpc-id", vpc_id))
            .send()
            .await
            .map_err(sdk("DescribeSubnets"))?;
        Ok(output.subnets().iter().map(to_subnet).collect())
    }

    async fn describe_subnet(&self, id: &str) -> Result<Subnet> {
        let output = self
            .client
            .describe_subnets()
            .subnet_ids(id)
            .send()
            .await
            .map_err(sdk("DescribeSubnets"))?;
        output
            .subnets()
            .first()
            .map(to_subnet)
            .ok_or_else(|| not_found("subnet", id))
    }

    async fn create_subnet(
        &self,
        vpc_id: &str,
        name: &str,
        cidr: &str,
        zone: &str,
    ) -> Result<Subnet> {
        let mut request = self
            .client
            .create_subnet()
            .vpc_id(vpc_id)
            .cidr_block(cidr)
            .tag_specifications(tag_spec(ResourceType::Subnet, name));
        if !zone.is_empty() {
            request = request.availability_zone(zone);
        }
        let output = request.send().await.map_err(sdk("CreateSubnet"))?;
        output
            .subnet()
            .map(to_subnet)
            .ok_or_else(|| missing("CreateSubnet", "subnet"))
    }

    async fn delete_subnet(&self, id: &str) -> Result<()> {
        self.client
            .delete_subnet()
            .subnet_id(id)
            .send()
            .await
            .map_err(sdk("DeleteSubnet"))?;
        Ok(())
    }

    async fn describe_security_groups(&self) -> Result<Vec<SecurityGroup>> {
        let output = self
            .client
            .describe_security_groups()
            .send()
            .await
            .map_err(sdk("DescribeSecurityGroups"))?;
        Ok(output
            .security_groups()
            .iter()
            .map(to_security_group)
            .collect())
    }

    async fn describe_security_group(&self, id: &str) -> Result<SecurityGroup> {
        let output = self
            .client
            .describe_security_groups()
            .group_ids(id)
            .send()
            .await
            .map_err(sdk("DescribeSecurityGroups"))?;
        output
            .security_groups()
            .first()
            .map(to_security_group)
            .ok_or_else(|| not_found("security group", id))
    }

    async fn create_security_group(&self, name: &str, vpc_id: &str) -> Result<String> {
        let output = self
            .client
            .create_security_group()
            .group_name(name)
            .description(name)
            .vpc_id(vpc_id)
            .tag_specifications(tag_spec(ResourceType::SecurityGroup, name))
            .send()
            .await
            .map_err(sdk("CreateSecurityGroup"))?;
        output
            .group_id()
            .map(str::to_string)
            .ok_or_else(|| missing("CreateSecurityGroup", "group id"))
    }

    async fn authorize_ingress(&self, group_id: &str, permissions: &[IpPermission]) -> Result<()> {
        self.client
            .authorize_security_group_ingress()
            .group_id(group_id)
            .set_ip_permissions(Some(permissions.iter().map(from_permission).collect()))
            .send()
            .await
            .map_err(sdk("AuthorizeSecurityGroupIngress"))?;
        Ok(())
    }

    async fn authorize_egress(&self, group_id: &str, permissions: &[IpPermission]) -> Result<()> {
        self.client
            .authorize_security_group_egress()
            .group_id(group_id)
            .set_ip_permissions(Some(permissions.iter().map(from_permission).collect()))
            .send()
            .await
            .map_err(sdk("AuthorizeSecurityGroupEgress"))?;
        Ok(())
    }

    async fn delete_security_group(&self, id: &str) -> Result<()> {
        self.client
            .delete_security_group()
            .group_id(id)
            .send()
            .await
            .map_err(sdk("DeleteSecurityGroup"))?;
        Ok(())
    }

    async fn create_network_interface(
        &self,
        name: &str,
        subnet_id: &str,
        group_ids: &[String],
    ) -> Result<NetworkInterface> {
        let output = self
            .client
            .create_network_interface()
            .subnet_id(subnet_id)
            .set_groups(Some(group_ids.to_vec()))
            .description(name)
            .tag_specifications(tag_spec(ResourceType::NetworkInterface, name))
            .send()
            .await
            .map_err(sdk("CreateNetworkInterface"))?;
        output
            .network_interface()
            .map(to_network_interface)
            .ok_or_else(|| missing("CreateNetworkInterface", "network interface"))
    }

    async fn describe_network_interfaces(&self) -> Result<Vec<NetworkInterface>> {
        let output = self
            .client
            .describe_network_interfaces()
            .send()
            .await
            .map_err(sdk("DescribeNetworkInterfaces"))?;
        Ok(output
            .network_interfaces()
            .iter()
            .map(to_network_interface)
            .collect())
    }

    async fn describe_network_interface(&self, id: &str) -> Result<NetworkInterface> {
        let output = self
            .client
            .describe_network_interfaces()
            .network_interface_ids(id)
            .send()
            .await
            .map_err(sdk("DescribeNetworkInterfaces"))?;
        output
            .network_interfaces()
            .first()
            .map(to_network_interface)
            .ok_or_else(|| not_found("network interface", id))
    }

    async fn delete_network_interface(&self, id: &str) -> Result<()> {
        self.client
            .delete_network_interface()
            .network_interface_id(id)
            .send()
            .await
            .map_err(sdk("DeleteNetworkInterface"))?;
        Ok(())
    }

    async fn create_key_pair(&self, name: &str) -> Result<KeyPair> {
        let output = self
            .client
            .create_key_pair()
            .key_name(name)
            .send()
            .await
            .map_err(sdk("CreateKeyPair"))?;
        Ok(KeyPair {
            key_name: text(output.key_name()),
            key_pair_id: text(output.key_pair_id()),
            fingerprint: text(output.key_fingerprint()),
            private_key: output.key_material().map(str::to_string),
            ..Default::default()
        })
    }

    async fn import_key_pair(&self, name: &str, public_key: &str) -> Result<KeyPair> {
        let output = self
            .client
            .import_key_pair()
            .key_name(name)
            .public_key_material(Blob::new(public_key.as_bytes()))
            .send()
            .await
            .map_err(sdk("ImportKeyPair"))?;
        Ok(KeyPair {
            key_name: text(output.key_name()),
            key_pair_id: text(output.key_pair_id()),
            fingerprint: text(output.key_fingerprint()),
            public_key: public_key.to_string(),
            ..Default::default()
        })
    }

    async fn describe_key_pairs(&self) -> Result<Vec<KeyPair>> {
        let output = self
            .client
            .describe_key_pairs()
            .include_public_key(true)
            .send()
            .await
            .map_err(sdk("DescribeKeyPairs"))?;
        Ok(output.key_pairs().iter().map(to_key_pair).collect())
    }

    async fn describe_key_pair(&self, name: &str) -> Result<KeyPair> {
        let output = self
            .client
            .describe_key_pairs()
            .key_names(name)
            .include_public_key(true)
            .send()
            .await
            .map_err(sdk("DescribeKeyPairs"))?;
        output
            .key_pairs()
            .first()
            .map(to_key_pair)
            .ok_or_else(|| not_found("key pair", name))
    }

    async fn delete_key_pair(&self, name: &str) -> Result<()> {
        self.client
            .delete_key_pair()
            .key_name(name)
            .send()
            .await
            .map_err(sdk("DeleteKeyPair"))?;
        Ok(())
    }

    async fn allocate_address(&self, name: &str) -> Result<Address> {
        let output = self
            .client
            .allocate_address()
            .domain(DomainType::Vpc)
            .tag_specifications(tag_spec(ResourceType::ElasticIp, name))
            .send()
            .await
            .map_err(sdk("AllocateAddress"))?;
        Ok(Address {
            allocation_id: text(output.allocation_id()),
            name: name.to_string(),
            public_ip: text(output.public_ip()),
            domain: output
                .domain()
                .map(|d| d.as_str().to_string())
                .unwrap_or_default(),
            ..Default::default()
        })
    }

    async fn describe_addresses(&self) -> Result<Vec<Address>> {
        let output = self
            .client
            .describe_addresses()
            .send()
            .await
            .map_err(sdk("DescribeAddresses"))?;
        Ok(output.addresses().iter().map(to_address).collect())
    }

    async fn describe_address(&self, allocation_id: &str) -> Result<Address> {
        let output = self
            .client
            .describe_addresses()
            .allocation_ids(allocation_id)
            .send()
            .await
            .map_err(sdk("DescribeAddresses"))?;
        output
            .addresses()
            .first()
            .map(to_address)
            .ok_or_else(|| not_found("address", allocation_id))
    }

    async fn associate_address(
        &self,
        allocation_id: &str,
        network_interface_id: &str,
    ) -> Result<()> {
        self.client
            .associate_address()
            .allocation_id(allocation_id)
            .network_interface_id(network_interface_id)
            .send()
            .await
            .map_err(sdk("AssociateAddress"))?;
        Ok(())
    }

    async fn release_address(&self, allocation_id: &str) -> Result<()> {
        self.client
            .release_address()
            .allocation_id(allocation_id)
            .send()
            .await
            .map_err(sdk("ReleaseAddress"))?;
        Ok(())
    }
}
