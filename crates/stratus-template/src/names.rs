//! Resource naming scheme
//!
//! The builder and the teardown orchestrator must agree on these names: a
//! teardown only knows the deployment name and resource group, and re-derives
//! every dependent resource name from them.

/// Catalog-name prefix marking a custom (user-captured) image. The remainder
/// of the name is the resource group the image lives in.
pub const CUSTOM_IMAGE_PREFIX: &str = "custom-";

const STORAGE_SUFFIX: &str = "stor";

/// Group encoded in a custom image's catalog name, if any
pub fn custom_image_group(catalog_name: &str) -> Option<&str> {
    catalog_name.strip_prefix(CUSTOM_IMAGE_PREFIX)
}

/// Storage account identifier for a deployment: the name's alphanumerics,
/// lowercased, plus a fixed suffix. Storage accounts have the strictest
/// naming rules of any resource here.
pub fn storage_account_name(deployment: &str) -> String {
    let stripped: String = deployment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("{}{}", stripped.to_lowercase(), STORAGE_SUFFIX)
}

/// Public IP name for a deployment
pub fn public_ip_name(deployment: &str) -> String {
    format!("{}publicip", deployment)
}

/// NIC name for a deployment
pub fn nic_name(deployment: &str) -> String {
    format!("{}nic", deployment)
}

/// Security group name for a deployment
pub fn security_group_name(deployment: &str) -> String {
    format!("{}nsg", deployment)
}

/// OS disk name for a deployment
pub fn os_disk_name(deployment: &str) -> String {
    format!("{}osdisk", deployment)
}

/// Data disk name for a deployment
pub fn data_disk_name(deployment: &str) -> String {
    format!("{}datadisk", deployment)
}

/// Virtual network owned by a resource group
pub fn virtual_network_name(group: &str) -> String {
    format!("{}virtualnetwork", group)
}
