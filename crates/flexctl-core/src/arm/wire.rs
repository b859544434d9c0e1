//! ARM JSON shapes and their conversion into [`crate::model`] handles

use crate::model::{
    Configuration, FirewallRule, NameAvailability, ResourceGroup, Server, ServerSpec, ServerUpdate,
    Sku,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Envelope shared by every ARM resource
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArmResource<P> {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sku: Option<WireSku>,
    #[serde(default)]
    pub properties: P,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireSku {
    pub name: String,
    #[serde(default)]
    pub tier: String,
}

/// A page of a list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResourceGroupProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServerProperties {
    #[serde(default)]
    pub administrator_login: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub fully_qualified_domain_name: Option<String>,
    #[serde(default)]
    pub storage_profile: Option<StorageProfile>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StorageProfile {
    #[serde(default, rename = "storageMB")]
    pub storage_mb: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FirewallRuleProperties {
    #[serde(default)]
    pub start_ip_address: String,
    #[serde(default)]
    pub end_ip_address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigurationProperties {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub allowed_values: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NameAvailabilityResponse {
    #[serde(default)]
    pub name_available: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `{"error": {...}}` body of a failed request
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.code, self.message),
            (false, true) => write!(f, "{}", self.code),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Document behind an `Azure-AsyncOperation` URL
#[derive(Debug, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

/// OAuth2 token endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// OAuth2 token endpoint error body
#[derive(Debug, Deserialize)]
pub(crate) struct TokenError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

impl ArmResource<ResourceGroupProperties> {
    pub fn into_resource_group(self, name: &str, region: &str) -> ResourceGroup {
        ResourceGroup {
            name: self.name.unwrap_or_else(|| name.to_string()),
            region: self.location.unwrap_or_else(|| region.to_string()),
            id: self.id,
            provisioning_state: self.properties.provisioning_state,
        }
    }
}

impl ArmResource<ServerProperties> {
    pub fn into_server(self, name: &str) -> Server {
        Server {
            name: self.name.unwrap_or_else(|| name.to_string()),
            region: self.location.unwrap_or_default(),
            id: self.id,
            sku: self.sku.map(|s| Sku::new(s.name, s.tier)),
            administrator_login: self.properties.administrator_login,
            version: self.properties.version,
            storage_mb: self.properties.storage_profile.and_then(|p| p.storage_mb),
            state: self.properties.state,
            fully_qualified_domain_name: self.properties.fully_qualified_domain_name,
        }
    }
}

impl ArmResource<FirewallRuleProperties> {
    pub fn into_firewall_rule(self, name: &str) -> FirewallRule {
        FirewallRule {
            name: self.name.unwrap_or_else(|| name.to_string()),
            start_ip_address: self.properties.start_ip_address,
            end_ip_address: self.properties.end_ip_address,
        }
    }
}

impl ArmResource<ConfigurationProperties> {
    pub fn into_configuration(self, name: &str) -> Configuration {
        Configuration {
            name: self.name.unwrap_or_else(|| name.to_string()),
            value: self.properties.value,
            source: self.properties.source,
            default_value: self.properties.default_value,
            data_type: self.properties.data_type,
            allowed_values: self.properties.allowed_values,
        }
    }
}

impl From<NameAvailabilityResponse> for NameAvailability {
    fn from(response: NameAvailabilityResponse) -> Self {
        NameAvailability {
            available: response.name_available,
            reason: response.reason,
            message: response.message,
        }
    }
}

pub(crate) fn server_create_body(spec: &ServerSpec) -> Value {
    json!({
        "location": spec.region,
        "sku": WireSku { name: spec.sku.name.clone(), tier: spec.sku.tier.clone() },
        "properties": {
            "administratorLogin": spec.administrator_login,
            "administratorLoginPassword": spec.administrator_password,
            "version": spec.version,
            "storageProfile": { "storageMB": spec.storage_mb },
        },
    })
}

pub(crate) fn server_update_body(update: &ServerUpdate) -> Value {
    let mut properties = Map::new();
    if let Some(storage_mb) = update.storage_mb {
        properties.insert("storageProfile".into(), json!({ "storageMB": storage_mb }));
    }
    json!({ "properties": Value::Object(properties) })
}

pub(crate) fn firewall_rule_body(start_ip: &str, end_ip: &str) -> Value {
    json!({
        "properties": {
            "startIpAddress": start_ip,
            "endIpAddress": end_ip,
        },
    })
}

pub(crate) fn configuration_body(value: &str, source: &str) -> Value {
    json!({
        "properties": {
            "value": value,
            "source": source,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_server_parse() {
        let body = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.DBforMySQL/flexibleServers/netserver01",
            "name": "netserver01",
            "location": "North Europe",
            "sku": { "name": "Standard_D16ds_v4", "tier": "GeneralPurpose" },
            "properties": {
                "administratorLogin": "mysqlsqladmin3423",
                "version": "5.7",
                "state": "Ready",
                "fullyQualifiedDomainName": "netserver01.mysql.database.azure.com",
                "storageProfile": { "storageMB": 1048576 }
            }
        });
        let resource: ArmResource<ServerProperties> = serde_json::from_value(body).unwrap();
        let server = resource.into_server("ignored");

        assert_eq!(server.name, "netserver01");
        assert_eq!(server.storage_mb, Some(1048576));
        assert_eq!(server.sku, Some(Sku::new("Standard_D16ds_v4", "GeneralPurpose")));
        assert_eq!(server.state.as_deref(), Some("Ready"));
    }

    #[test]
    fn test_missing_properties_fall_back() {
        let resource: ArmResource<FirewallRuleProperties> =
            serde_json::from_value(json!({})).unwrap();
        let rule = resource.into_firewall_rule("FirewallRule");
        assert_eq!(rule.name, "FirewallRule");
        assert_eq!(rule.start_ip_address, "");
    }

    #[test]
    fn test_update_body_only_sends_set_fields() {
        let body = server_update_body(&ServerUpdate::new().with_storage_mb(1048576));
        assert_eq!(
            body,
            json!({ "properties": { "storageProfile": { "storageMB": 1048576 } } })
        );
    }

    #[test]
    fn test_create_body_shape() {
        let spec = ServerSpec {
            region: "northeurope".to_string(),
            sku: Sku::new("Standard_D16ds_v4", "GeneralPurpose"),
            administrator_login: "admin".to_string(),
            administrator_password: "pw".to_string(),
            version: "5.7".to_string(),
            storage_mb: 524288,
        };
        let body = server_create_body(&spec);
        assert_eq!(body["sku"]["tier"], "GeneralPurpose");
        assert_eq!(body["properties"]["storageProfile"]["storageMB"], 524288);
        assert_eq!(body["properties"]["version"], "5.7");
    }

    #[test]
    fn test_error_detail_display() {
        let detail = ErrorDetail {
            code: "ServerNotExist".to_string(),
            message: "The requested server was not found".to_string(),
        };
        assert_eq!(
            detail.to_string(),
            "ServerNotExist: The requested server was not found"
        );
    }
}
