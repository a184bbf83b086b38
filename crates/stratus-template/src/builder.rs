//! Resource Graph Builder
//!
//! Assembles the deployment graph for one VM and its supporting resources.
//! Emission order is fixed: storage → public IP → NSG (conditional) → NIC →
//! VM. `dependsOn` edges only ever point at earlier resources, which is
//! what the remote side derives its provisioning order from.
//!
//! The builder is total: malformed options are the caller's problem, and
//! every option set yields a graph that passes
//! [`DeploymentGraph::validate`](crate::graph::DeploymentGraph::validate).

use crate::expr::TemplateExpr;
use crate::graph::{
    DeploymentGraph, ParameterValue, ResourceDefinition, TemplateParameter, VariableTable,
};
use crate::names;
use crate::resources::{
    BootDiagnostics, DataDisk, DiagnosticsProfile, DnsSettings, HardwareProfile, ImageReference,
    IpConfiguration, IpConfigurationProperties, LinuxConfiguration, NetworkInterfaceProperties,
    NetworkProfile, OsDisk, OsProfile, PublicIpProperties, ResourceKind, ResourceProperties,
    SecurityGroupProperties, SecurityRule, SecurityRuleProperties, SshConfiguration, SshPublicKey,
    StorageAccountProperties, StorageProfile, SubResource, VhdUri, VirtualMachineProperties,
};
use std::collections::BTreeMap;

/// First NSG rule priority; rule `i` gets `base + i`
const RULE_PRIORITY_BASE: u32 = 1000;
const BLOB_ENDPOINT_SUFFIX: &str = ".blob.core.windows.net";
const VHD_CONTAINER: &str = "vhds";
/// Secure parameter carrying the SSH public key on the key-vault path
const SSH_KEY_PARAMETER: &str = "sshKeyData";
const DEFAULT_DATA_DISK_GB: u32 = 100;
const DEFAULT_STORAGE_ACCOUNT_TYPE: &str = "Standard_LRS";
const FALLBACK_TAG_KEY: &str = "createdBy";
const FALLBACK_TAG_VALUE: &str = "stratus";

const VAR_STORAGE_ACCOUNT: &str = "storageAccountName";
const VAR_DNS_LABEL: &str = "dnsLabelPrefix";
const VAR_PUBLIC_IP_REF: &str = "publicIPAddressReference";
const VAR_LOGIN_USER: &str = "loginUser";

/// Disk image selection
#[derive(Debug, Clone)]
pub enum ImageChoice {
    /// Marketplace image identified by its publisher/offer/sku triple
    Marketplace {
        /// Image publisher
        publisher: String,
        /// Image offer
        offer: String,
        /// Image SKU
        sku: String,
    },
    /// User-captured image: catalog name (carries the group prefix), source
    /// VHD and an OS-type hint. Mutually exclusive with the marketplace path.
    Custom {
        /// Catalog name, `custom-<group>`
        name: String,
        /// Source VHD blob URI
        vhd_uri: String,
        /// `Linux` or `Windows`
        os_type: String,
    },
}

impl ImageChoice {
    /// Marketplace image from its triple
    pub fn marketplace(publisher: &str, offer: &str, sku: &str) -> Self {
        Self::Marketplace {
            publisher: publisher.to_string(),
            offer: offer.to_string(),
            sku: sku.to_string(),
        }
    }

    /// Custom image from its catalog name and source VHD
    pub fn custom(name: &str, vhd_uri: &str, os_type: &str) -> Self {
        Self::Custom {
            name: name.to_string(),
            vhd_uri: vhd_uri.to_string(),
            os_type: os_type.to_string(),
        }
    }

    /// Catalog name the custom-image prefix test runs against
    pub fn catalog_name(&self) -> String {
        match self {
            Self::Marketplace {
                publisher,
                offer,
                sku,
            } => format!("{}/{}/{}", publisher, offer, sku),
            Self::Custom { name, .. } => name.clone(),
        }
    }
}

/// Login configuration, threaded per call; nothing here is process-wide
#[derive(Debug, Clone)]
pub struct LoginSpec {
    /// Admin user name
    pub username: String,
    /// How the admin authenticates
    pub auth: AuthMethod,
}

impl LoginSpec {
    /// Password login
    pub fn password(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            auth: AuthMethod::Password(password.to_string()),
        }
    }

    /// Key-vault-backed SSH key login; password authentication is disabled
    pub fn key_vault(username: &str, vault_id: &str, secret_name: &str) -> Self {
        Self {
            username: username.to_string(),
            auth: AuthMethod::KeyVaultKey {
                vault_id: vault_id.to_string(),
                secret_name: secret_name.to_string(),
            },
        }
    }
}

/// Authentication method for the admin login
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Plaintext password placed in the OS profile
    Password(String),
    /// SSH public key fetched from a key vault at deploy time
    KeyVaultKey {
        /// Vault resource id
        vault_id: String,
        /// Secret name inside the vault
        secret_name: String,
    },
}

/// Provisioning options consumed by [`build`]
#[derive(Debug, Clone)]
pub struct ProvisionSpec {
    /// Hardware size name
    pub vm_size: String,
    /// Disk image
    pub image: ImageChoice,
    /// Caller-supplied subnet id, opaque to the builder
    pub subnet_id: String,
    /// Admin login
    pub login: LoginSpec,
    /// Inbound ports to open; an NSG is emitted iff non-empty
    pub inbound_ports: Vec<u16>,
    /// DNS label for the public IP
    pub dns_label: Option<String>,
    /// Size of the generated empty data disk
    pub data_disk_gb: u32,
    /// Storage account tier
    pub storage_account_type: String,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
}

impl ProvisionSpec {
    /// Spec with defaults for the optional knobs
    pub fn new(vm_size: &str, image: ImageChoice, subnet_id: &str, login: LoginSpec) -> Self {
        Self {
            vm_size: vm_size.to_string(),
            image,
            subnet_id: subnet_id.to_string(),
            login,
            inbound_ports: Vec::new(),
            dns_label: None,
            data_disk_gb: DEFAULT_DATA_DISK_GB,
            storage_account_type: DEFAULT_STORAGE_ACCOUNT_TYPE.to_string(),
            tags: BTreeMap::new(),
        }
    }

    /// Open the given inbound ports
    pub fn with_inbound_ports(mut self, ports: &[u16]) -> Self {
        self.inbound_ports = ports.to_vec();
        self
    }

    /// Request a DNS label on the public IP
    pub fn with_dns_label(mut self, label: &str) -> Self {
        self.dns_label = Some(label.to_string());
        self
    }

    /// Add a resource tag
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// Override the data disk size
    pub fn with_data_disk_gb(mut self, gb: u32) -> Self {
        self.data_disk_gb = gb;
        self
    }
}

/// Build the deployment graph for one VM.
///
/// Pure and total; performs no I/O.
pub fn build(name: &str, location: &str, spec: &ProvisionSpec) -> DeploymentGraph {
    let mut resources: Vec<ResourceDefinition> = Vec::new();
    let mut variables = VariableTable::new();
    let mut parameters = BTreeMap::new();
    let mut parameter_values = BTreeMap::new();

    // Stage 1: storage account. A custom image pins the account to the group
    // encoded in its catalog name; the OS disk must land next to the source
    // VHD.
    let custom_group =
        names::custom_image_group(&spec.image.catalog_name()).map(str::to_string);
    let storage_account = match &custom_group {
        Some(group) => group.clone(),
        None => names::storage_account_name(name),
    };
    variables.register(VAR_STORAGE_ACCOUNT, TemplateExpr::literal(&storage_account));
    resources.push(ResourceDefinition {
        name: TemplateExpr::var(VAR_STORAGE_ACCOUNT),
        kind: ResourceKind::StorageAccount,
        location: location.to_string(),
        api_version: ResourceKind::StorageAccount.api_version().to_string(),
        depends_on: Vec::new(),
        properties: ResourceProperties::StorageAccount(StorageAccountProperties {
            account_type: spec.storage_account_type.clone(),
        }),
        tags: spec.tags.clone(),
    });

    // Stage 2: public IP
    let pip_name = names::public_ip_name(name);
    let dns_settings = spec.dns_label.as_ref().map(|label| {
        variables.register(VAR_DNS_LABEL, TemplateExpr::literal(label));
        DnsSettings {
            domain_name_label: TemplateExpr::var(VAR_DNS_LABEL),
        }
    });
    variables.register(
        VAR_PUBLIC_IP_REF,
        TemplateExpr::resource_id(ResourceKind::PublicIp, TemplateExpr::literal(&pip_name)),
    );
    resources.push(ResourceDefinition {
        name: TemplateExpr::literal(&pip_name),
        kind: ResourceKind::PublicIp,
        location: location.to_string(),
        api_version: ResourceKind::PublicIp.api_version().to_string(),
        depends_on: Vec::new(),
        properties: ResourceProperties::PublicIp(PublicIpProperties {
            public_ip_allocation_method: "Dynamic".to_string(),
            dns_settings,
        }),
        tags: spec.tags.clone(),
    });

    // Stage 3: NSG, only when inbound ports were requested
    let nsg_name = names::security_group_name(name);
    let has_nsg = !spec.inbound_ports.is_empty();
    if has_nsg {
        let security_rules = spec
            .inbound_ports
            .iter()
            .enumerate()
            .map(|(i, port)| SecurityRule {
                name: format!("allow-{}", port),
                properties: SecurityRuleProperties {
                    protocol: "All".to_string(),
                    source_port_range: "*".to_string(),
                    destination_port_range: port.to_string(),
                    source_address_prefix: "*".to_string(),
                    destination_address_prefix: "*".to_string(),
                    access: "Allow".to_string(),
                    priority: RULE_PRIORITY_BASE + i as u32,
                    direction: "Inbound".to_string(),
                },
            })
            .collect();
        resources.push(ResourceDefinition {
            name: TemplateExpr::literal(&nsg_name),
            kind: ResourceKind::NetworkSecurityGroup,
            location: location.to_string(),
            api_version: ResourceKind::NetworkSecurityGroup.api_version().to_string(),
            depends_on: Vec::new(),
            properties: ResourceProperties::SecurityGroup(SecurityGroupProperties {
                security_rules,
            }),
            tags: spec.tags.clone(),
        });
    }

    // Stage 4: NIC
    let nic_name = names::nic_name(name);
    let mut nic_depends = vec![TemplateExpr::resource_id(
        ResourceKind::PublicIp,
        TemplateExpr::literal(&pip_name),
    )];
    let network_security_group = if has_nsg {
        nic_depends.push(TemplateExpr::resource_id(
            ResourceKind::NetworkSecurityGroup,
            TemplateExpr::literal(&nsg_name),
        ));
        Some(SubResource {
            id: TemplateExpr::resource_id(
                ResourceKind::NetworkSecurityGroup,
                TemplateExpr::literal(&nsg_name),
            ),
        })
    } else {
        None
    };
    resources.push(ResourceDefinition {
        name: TemplateExpr::literal(&nic_name),
        kind: ResourceKind::NetworkInterface,
        location: location.to_string(),
        api_version: ResourceKind::NetworkInterface.api_version().to_string(),
        depends_on: nic_depends,
        properties: ResourceProperties::NetworkInterface(NetworkInterfaceProperties {
            ip_configurations: vec![IpConfiguration {
                name: format!("{}ipconfig", name),
                properties: IpConfigurationProperties {
                    private_ip_allocation_method: "Dynamic".to_string(),
                    public_ip_address: SubResource {
                        id: TemplateExpr::var(VAR_PUBLIC_IP_REF),
                    },
                    subnet: SubResource {
                        id: TemplateExpr::literal(&spec.subnet_id),
                    },
                },
            }],
            network_security_group,
        }),
        tags: spec.tags.clone(),
    });

    // Stage 5: VM
    let os_profile = build_os_profile(
        name,
        spec,
        &mut variables,
        &mut parameters,
        &mut parameter_values,
    );
    let storage_profile = build_storage_profile(name, spec);
    let vm_tags = if spec.tags.is_empty() {
        let mut tags = BTreeMap::new();
        tags.insert(FALLBACK_TAG_KEY.to_string(), FALLBACK_TAG_VALUE.to_string());
        tags
    } else {
        spec.tags.clone()
    };
    resources.push(ResourceDefinition {
        name: TemplateExpr::literal(name),
        kind: ResourceKind::VirtualMachine,
        location: location.to_string(),
        api_version: ResourceKind::VirtualMachine.api_version().to_string(),
        depends_on: vec![
            TemplateExpr::resource_id(
                ResourceKind::StorageAccount,
                TemplateExpr::var(VAR_STORAGE_ACCOUNT),
            ),
            TemplateExpr::resource_id(
                ResourceKind::NetworkInterface,
                TemplateExpr::literal(&nic_name),
            ),
        ],
        properties: ResourceProperties::VirtualMachine(Box::new(VirtualMachineProperties {
            hardware_profile: HardwareProfile {
                vm_size: spec.vm_size.clone(),
            },
            os_profile,
            storage_profile,
            network_profile: NetworkProfile {
                network_interfaces: vec![SubResource {
                    id: TemplateExpr::resource_id(
                        ResourceKind::NetworkInterface,
                        TemplateExpr::literal(&nic_name),
                    ),
                }],
            },
            diagnostics_profile: DiagnosticsProfile {
                boot_diagnostics: BootDiagnostics {
                    enabled: true,
                    storage_uri: blob_endpoint(),
                },
            },
        })),
        tags: vm_tags,
    });

    DeploymentGraph::new(resources, variables, parameters, parameter_values)
}

fn build_os_profile(
    name: &str,
    spec: &ProvisionSpec,
    variables: &mut VariableTable,
    parameters: &mut BTreeMap<String, TemplateParameter>,
    parameter_values: &mut BTreeMap<String, ParameterValue>,
) -> OsProfile {
    match &spec.login.auth {
        AuthMethod::Password(password) => OsProfile {
            computer_name: TemplateExpr::literal(name),
            admin_username: TemplateExpr::literal(&spec.login.username),
            admin_password: Some(TemplateExpr::literal(password)),
            linux_configuration: None,
        },
        AuthMethod::KeyVaultKey {
            vault_id,
            secret_name,
        } => {
            variables.register(VAR_LOGIN_USER, TemplateExpr::literal(&spec.login.username));
            parameters.insert(
                SSH_KEY_PARAMETER.to_string(),
                TemplateParameter {
                    param_type: "securestring".to_string(),
                },
            );
            parameter_values.insert(
                SSH_KEY_PARAMETER.to_string(),
                ParameterValue::KeyVaultRef {
                    vault_id: vault_id.clone(),
                    secret_name: secret_name.clone(),
                },
            );
            OsProfile {
                computer_name: TemplateExpr::literal(name),
                admin_username: TemplateExpr::literal(&spec.login.username),
                admin_password: None,
                linux_configuration: Some(LinuxConfiguration {
                    disable_password_authentication: true,
                    ssh: SshConfiguration {
                        public_keys: vec![SshPublicKey {
                            path: TemplateExpr::concat(vec![
                                TemplateExpr::literal("/home/"),
                                TemplateExpr::var(VAR_LOGIN_USER),
                                TemplateExpr::literal("/.ssh/authorized_keys"),
                            ]),
                            key_data: TemplateExpr::param(SSH_KEY_PARAMETER),
                        }],
                    },
                }),
            }
        }
    }
}

fn build_storage_profile(name: &str, spec: &ProvisionSpec) -> StorageProfile {
    let os_disk_name = names::os_disk_name(name);
    let data_disk_name = names::data_disk_name(name);

    let (image_reference, os_type, image) = match &spec.image {
        ImageChoice::Marketplace {
            publisher,
            offer,
            sku,
        } => (
            Some(ImageReference {
                publisher: publisher.clone(),
                offer: offer.clone(),
                sku: sku.clone(),
                version: "latest".to_string(),
            }),
            None,
            None,
        ),
        ImageChoice::Custom {
            vhd_uri, os_type, ..
        } => (
            None,
            Some(os_type.clone()),
            Some(VhdUri {
                uri: TemplateExpr::literal(vhd_uri),
            }),
        ),
    };

    StorageProfile {
        image_reference,
        os_disk: OsDisk {
            name: os_disk_name.clone(),
            os_type,
            vhd: VhdUri {
                uri: vhd_uri(&os_disk_name),
            },
            image,
            caching: "ReadWrite".to_string(),
            create_option: "FromImage".to_string(),
        },
        data_disks: vec![DataDisk {
            name: data_disk_name.clone(),
            disk_size_gb: spec.data_disk_gb,
            lun: 0,
            vhd: VhdUri {
                uri: vhd_uri(&data_disk_name),
            },
            create_option: "Empty".to_string(),
        }],
    }
}

/// Blob endpoint of the graph's storage account
fn blob_endpoint() -> TemplateExpr {
    TemplateExpr::concat(vec![
        TemplateExpr::literal("https://"),
        TemplateExpr::var(VAR_STORAGE_ACCOUNT),
        TemplateExpr::literal(BLOB_ENDPOINT_SUFFIX),
    ])
}

/// VHD blob URI under the graph's storage account
fn vhd_uri(disk_name: &str) -> TemplateExpr {
    TemplateExpr::concat(vec![
        TemplateExpr::literal("https://"),
        TemplateExpr::var(VAR_STORAGE_ACCOUNT),
        TemplateExpr::literal(format!(
            "{}/{}/{}.vhd",
            BLOB_ENDPOINT_SUFFIX, VHD_CONTAINER, disk_name
        )),
    ])
}
