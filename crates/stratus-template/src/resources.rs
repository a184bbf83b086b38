//! Resource kinds and their typed property payloads
//!
//! The remote API identifies resource kinds by namespaced type strings
//! ("Microsoft.Network/publicIPAddresses"). Those strings are confined to
//! [`ResourceKind`]'s two translation functions; the rest of the codebase
//! matches on the closed enum. Per-kind `properties` payloads are a tagged
//! union so the serializer's dispatch is exhaustive and statically checked.

use crate::expr::TemplateExpr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed enumeration of resource kinds this client understands
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Storage account backing OS/data disks and boot diagnostics
    StorageAccount,
    /// Public IP address
    PublicIp,
    /// Network security group
    NetworkSecurityGroup,
    /// Network interface card
    NetworkInterface,
    /// Virtual machine
    VirtualMachine,
    /// Virtual network (owned by the resource group, deleted on teardown)
    VirtualNetwork,
    /// Any type string this client does not know, preserved verbatim
    Unrecognized(String),
}

impl ResourceKind {
    /// Sole translation from the remote type string
    pub fn from_type_str(s: &str) -> Self {
        match s {
            "Microsoft.Storage/storageAccounts" => Self::StorageAccount,
            "Microsoft.Network/publicIPAddresses" => Self::PublicIp,
            "Microsoft.Network/networkSecurityGroups" => Self::NetworkSecurityGroup,
            "Microsoft.Network/networkInterfaces" => Self::NetworkInterface,
            "Microsoft.Compute/virtualMachines" => Self::VirtualMachine,
            "Microsoft.Network/virtualNetworks" => Self::VirtualNetwork,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Remote type string
    pub fn type_str(&self) -> &str {
        match self {
            Self::StorageAccount => "Microsoft.Storage/storageAccounts",
            Self::PublicIp => "Microsoft.Network/publicIPAddresses",
            Self::NetworkSecurityGroup => "Microsoft.Network/networkSecurityGroups",
            Self::NetworkInterface => "Microsoft.Network/networkInterfaces",
            Self::VirtualMachine => "Microsoft.Compute/virtualMachines",
            Self::VirtualNetwork => "Microsoft.Network/virtualNetworks",
            Self::Unrecognized(s) => s,
        }
    }

    /// API version emitted for definitions of this kind
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::StorageAccount => "2015-06-15",
            Self::PublicIp
            | Self::NetworkSecurityGroup
            | Self::NetworkInterface
            | Self::VirtualNetwork => "2016-03-30",
            Self::VirtualMachine => "2016-03-30",
            Self::Unrecognized(_) => "2015-01-01",
        }
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.type_str())
    }
}

impl<'de> Deserialize<'de> for ResourceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_type_str(&s))
    }
}

/// Kind-specific `properties` payload of a resource definition
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResourceProperties {
    /// Storage account payload
    StorageAccount(StorageAccountProperties),
    /// Public IP payload
    PublicIp(PublicIpProperties),
    /// Network security group payload
    SecurityGroup(SecurityGroupProperties),
    /// Network interface payload
    NetworkInterface(NetworkInterfaceProperties),
    /// Virtual machine payload
    VirtualMachine(Box<VirtualMachineProperties>),
}

impl ResourceProperties {
    /// Every expression embedded in this payload, for reference validation
    pub fn expressions(&self) -> Vec<&TemplateExpr> {
        let mut out = Vec::new();
        match self {
            Self::StorageAccount(_) => {}
            Self::PublicIp(p) => {
                if let Some(dns) = &p.dns_settings {
                    out.push(&dns.domain_name_label);
                }
            }
            Self::SecurityGroup(_) => {}
            Self::NetworkInterface(p) => {
                if let Some(nsg) = &p.network_security_group {
                    out.push(&nsg.id);
                }
                for ip in &p.ip_configurations {
                    out.push(&ip.properties.public_ip_address.id);
                    out.push(&ip.properties.subnet.id);
                }
            }
            Self::VirtualMachine(p) => {
                if let Some(pw) = &p.os_profile.admin_password {
                    out.push(pw);
                }
                if let Some(linux) = &p.os_profile.linux_configuration {
                    for key in &linux.ssh.public_keys {
                        out.push(&key.path);
                        out.push(&key.key_data);
                    }
                }
                out.push(&p.storage_profile.os_disk.vhd.uri);
                if let Some(image) = &p.storage_profile.os_disk.image {
                    out.push(&image.uri);
                }
                for disk in &p.storage_profile.data_disks {
                    out.push(&disk.vhd.uri);
                }
                for nic in &p.network_profile.network_interfaces {
                    out.push(&nic.id);
                }
                out.push(&p.diagnostics_profile.boot_diagnostics.storage_uri);
            }
        }
        out
    }
}

/// Reference to another resource by id expression
#[derive(Debug, Clone, Serialize)]
pub struct SubResource {
    /// Resource id expression
    pub id: TemplateExpr,
}

// ---------------------------------------------------------------------------
// Storage account
// ---------------------------------------------------------------------------

/// Storage account properties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountProperties {
    /// Replication/performance tier, e.g. `Standard_LRS`
    pub account_type: String,
}

// ---------------------------------------------------------------------------
// Public IP
// ---------------------------------------------------------------------------

/// Public IP properties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpProperties {
    /// `Dynamic` or `Static`
    pub public_ip_allocation_method: String,
    /// DNS label, present only when the caller requested one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_settings: Option<DnsSettings>,
}

/// DNS settings attached to a public IP
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsSettings {
    /// Requested DNS label
    pub domain_name_label: TemplateExpr,
}

// ---------------------------------------------------------------------------
// Network security group
// ---------------------------------------------------------------------------

/// Network security group properties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupProperties {
    /// One allow rule per requested inbound port
    pub security_rules: Vec<SecurityRule>,
}

/// A single security rule
#[derive(Debug, Clone, Serialize)]
pub struct SecurityRule {
    /// Rule name
    pub name: String,
    /// Rule payload
    pub properties: SecurityRuleProperties,
}

/// Security rule payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleProperties {
    /// Always `All` for generated rules
    pub protocol: String,
    /// Wildcarded source port
    pub source_port_range: String,
    /// The opened port
    pub destination_port_range: String,
    /// Wildcarded source address
    pub source_address_prefix: String,
    /// Wildcarded destination address
    pub destination_address_prefix: String,
    /// Always `Allow` for generated rules
    pub access: String,
    /// `base + index`, strictly increasing across the group
    pub priority: u32,
    /// Always `Inbound` for generated rules
    pub direction: String,
}

// ---------------------------------------------------------------------------
// Network interface
// ---------------------------------------------------------------------------

/// Network interface properties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    /// IP configurations (exactly one is generated)
    pub ip_configurations: Vec<IpConfiguration>,
    /// Security group reference, present iff the graph emitted one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<SubResource>,
}

/// NIC IP configuration
#[derive(Debug, Clone, Serialize)]
pub struct IpConfiguration {
    /// Configuration name
    pub name: String,
    /// Configuration payload
    pub properties: IpConfigurationProperties,
}

/// NIC IP configuration payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    /// Private address allocation, always `Dynamic`
    pub private_ip_allocation_method: String,
    /// The public IP built earlier in the same graph
    pub public_ip_address: SubResource,
    /// Caller-supplied subnet, opaque to the builder
    pub subnet: SubResource,
}

// ---------------------------------------------------------------------------
// Virtual machine
// ---------------------------------------------------------------------------

/// Virtual machine properties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProperties {
    /// Hardware profile
    pub hardware_profile: HardwareProfile,
    /// OS/login profile
    pub os_profile: OsProfile,
    /// Disks and image source
    pub storage_profile: StorageProfile,
    /// NIC references
    pub network_profile: NetworkProfile,
    /// Boot diagnostics
    pub diagnostics_profile: DiagnosticsProfile,
}

/// Hardware profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    /// Size name from the hardware catalog
    pub vm_size: String,
}

/// OS/login profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    /// Hostname
    pub computer_name: TemplateExpr,
    /// Admin login user
    pub admin_username: TemplateExpr,
    /// Password, absent when key-based login is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<TemplateExpr>,
    /// Linux SSH configuration, present iff key-based login is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linux_configuration: Option<LinuxConfiguration>,
}

/// Linux-specific OS configuration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxConfiguration {
    /// True when login is key-only
    pub disable_password_authentication: bool,
    /// SSH public keys
    pub ssh: SshConfiguration,
}

/// SSH configuration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConfiguration {
    /// Authorized public keys
    pub public_keys: Vec<SshPublicKey>,
}

/// One authorized SSH public key
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshPublicKey {
    /// Authorized-keys path, expressed over the login-user variable
    pub path: TemplateExpr,
    /// Key material, a secure parameter reference
    pub key_data: TemplateExpr,
}

/// Disks and image source
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    /// Marketplace image triple; mutually exclusive with a custom OS disk
    /// image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<ImageReference>,
    /// OS disk
    pub os_disk: OsDisk,
    /// Data disks (one fixed-size empty disk is generated)
    pub data_disks: Vec<DataDisk>,
}

/// Marketplace image triple
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    /// Image publisher
    pub publisher: String,
    /// Image offer
    pub offer: String,
    /// Image SKU
    pub sku: String,
    /// Image version, always `latest`
    pub version: String,
}

/// OS disk definition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    /// Disk name
    pub name: String,
    /// OS type hint, present only on the custom-image path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    /// Destination VHD in the graph's storage account
    pub vhd: VhdUri,
    /// Source image VHD, present only on the custom-image path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<VhdUri>,
    /// Caching mode
    pub caching: String,
    /// Always `FromImage`
    pub create_option: String,
}

/// Empty data disk definition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    /// Disk name
    pub name: String,
    /// Size in GB
    pub disk_size_gb: u32,
    /// Logical unit number
    pub lun: u32,
    /// Destination VHD in the graph's storage account
    pub vhd: VhdUri,
    /// Always `Empty`
    pub create_option: String,
}

/// VHD location
#[derive(Debug, Clone, Serialize)]
pub struct VhdUri {
    /// Blob URI expression
    pub uri: TemplateExpr,
}

/// NIC references
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    /// Attached NICs (exactly one is generated)
    pub network_interfaces: Vec<SubResource>,
}

/// Boot diagnostics profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsProfile {
    /// Boot diagnostics settings
    pub boot_diagnostics: BootDiagnostics,
}

/// Boot diagnostics settings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootDiagnostics {
    /// Always enabled for generated VMs
    pub enabled: bool,
    /// Blob endpoint of the graph's storage account
    pub storage_uri: TemplateExpr,
}
