//! [`ResourceClient`] over the Azure Resource Manager REST API

use super::auth::TokenProvider;
use super::error::ArmError;
use super::wire::{
    self, ArmResource, ConfigurationProperties, FirewallRuleProperties, NameAvailabilityResponse,
    OperationStatus, Page, ResourceGroupProperties, ServerProperties,
};
use crate::client::ResourceClient;
use crate::config::{
    DEFAULT_AUTHORITY_HOST, DEFAULT_MANAGEMENT_ENDPOINT, PollingConfig, ServicePrincipal,
};
use crate::error::Result;
use crate::model::{
    Configuration, FirewallRule, NameAvailability, ResourceGroup, Server, ServerSpec, ServerUpdate,
};
use crate::progress::{PendingOperation, ProgressCallback, poll_operation};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, LOCATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// API version for `Microsoft.Resources/resourceGroups`
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// API version for `Microsoft.DBforMySQL/flexibleServers`
pub const MYSQL_API_VERSION: &str = "2020-07-01-preview";

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// User agent string for flexctl HTTP requests
const FLEXCTL_USER_AGENT: &str = concat!("flexctl-core/", env!("CARGO_PKG_VERSION"));

/// Per-request transport timeout; long-running operations are polled separately
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Azure Resource Manager client for one subscription
pub struct ArmClient {
    http: reqwest::Client,
    subscription_id: String,
    management_endpoint: String,
    tokens: TokenProvider,
    polling: PollingConfig,
    on_progress: Option<ProgressCallback>,
}

/// Builder for [`ArmClient`]
pub struct ArmClientBuilder {
    principal: ServicePrincipal,
    authority_host: String,
    management_endpoint: String,
    polling: PollingConfig,
    on_progress: Option<ProgressCallback>,
    user_agent: String,
}

impl ArmClientBuilder {
    /// Override the identity endpoint (sovereign clouds, tests)
    #[must_use]
    pub fn authority_host(mut self, url: impl Into<String>) -> Self {
        self.authority_host = url.into();
        self
    }

    /// Override the management endpoint (sovereign clouds, tests)
    #[must_use]
    pub fn management_endpoint(mut self, url: impl Into<String>) -> Self {
        self.management_endpoint = url.into();
        self
    }

    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Receive progress events while long-running operations are polled
    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> std::result::Result<ArmClient, ArmError> {
        validate_endpoint(&self.authority_host)?;
        validate_endpoint(&self.management_endpoint)?;

        let http = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let management_endpoint = self.management_endpoint.trim_end_matches('/').to_string();
        let tokens = TokenProvider::new(
            http.clone(),
            &self.principal,
            &self.authority_host,
            &management_endpoint,
        );

        Ok(ArmClient {
            http,
            subscription_id: self.principal.subscription_id.clone(),
            management_endpoint,
            tokens,
            polling: self.polling,
            on_progress: self.on_progress,
        })
    }
}

impl ArmClient {
    /// Client with default endpoints and polling
    pub fn new(principal: &ServicePrincipal) -> std::result::Result<Self, ArmError> {
        Self::builder(principal).build()
    }

    pub fn builder(principal: &ServicePrincipal) -> ArmClientBuilder {
        ArmClientBuilder {
            principal: principal.clone(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            management_endpoint: DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
            polling: PollingConfig::default(),
            on_progress: None,
            user_agent: FLEXCTL_USER_AGENT.to_string(),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    // -------------------------------------------------------------------
    // URLs
    // -------------------------------------------------------------------

    fn subscription_url(&self) -> String {
        format!(
            "{}/subscriptions/{}",
            self.management_endpoint,
            urlencoding::encode(&self.subscription_id)
        )
    }

    fn resource_group_url(&self, name: &str) -> String {
        format!(
            "{}/resourcegroups/{}?api-version={}",
            self.subscription_url(),
            urlencoding::encode(name),
            RESOURCES_API_VERSION
        )
    }

    fn server_path(&self, group: &str, server: &str) -> String {
        format!(
            "{}/resourceGroups/{}/providers/Microsoft.DBforMySQL/flexibleServers/{}",
            self.subscription_url(),
            urlencoding::encode(group),
            urlencoding::encode(server)
        )
    }

    fn server_url(&self, group: &str, server: &str, child: Option<(&str, &str)>) -> String {
        let mut url = self.server_path(group, server);
        if let Some((collection, name)) = child {
            url.push('/');
            url.push_str(collection);
            if !name.is_empty() {
                url.push('/');
                url.push_str(&urlencoding::encode(name));
            }
        }
        format!("{}?api-version={}", url, MYSQL_API_VERSION)
    }

    // -------------------------------------------------------------------
    // HTTP plumbing
    // -------------------------------------------------------------------

    /// Send an authenticated request, turning non-success statuses into errors
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> std::result::Result<reqwest::Response, ArmError> {
        let token = self.tokens.token().await?;
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        trace!("HTTP {}", status.as_u16());

        if status.is_success() {
            Ok(response)
        } else {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!("Could not read error body for HTTP {}: {}", status.as_u16(), e);
                    String::new()
                }
            };
            Err(ArmError::from_response(status.as_u16(), &text))
        }
    }

    /// Send a request and see any long-running operation it starts through
    ///
    /// Returns the final resource body for PUT/PATCH, the response body
    /// otherwise (`None` when empty).
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        label: &str,
    ) -> std::result::Result<Option<Value>, ArmError> {
        let response = self.send(method.clone(), url, body).await?;
        let pending = pending_operation(&response);
        let text = response.text().await?;

        if let Some(pending) = pending {
            poll_operation(
                self,
                label,
                &pending,
                self.polling,
                self.on_progress.as_ref(),
            )
            .await?;

            if method == Method::PUT || method == Method::PATCH {
                return self.get_json(url).await.map(Some);
            }
            return Ok(None);
        }

        if text.trim().is_empty() {
            Ok(None)
        } else {
            serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| ArmError::InvalidResponse(format!("{}: {}", label, e)))
        }
    }

    async fn get_json(&self, url: &str) -> std::result::Result<Value, ArmError> {
        let response = self.send(Method::GET, url, None).await?;
        Ok(response.json().await?)
    }

    /// Fetch the document behind an `Azure-AsyncOperation` URL
    pub(crate) async fn get_operation_status(
        &self,
        url: &str,
    ) -> std::result::Result<OperationStatus, ArmError> {
        let value = self.get_json(url).await?;
        serde_json::from_value(value)
            .map_err(|e| ArmError::InvalidResponse(format!("operation status: {}", e)))
    }

    /// True while a `Location` polling URL still answers `202 Accepted`
    pub(crate) async fn location_is_pending(
        &self,
        url: &str,
    ) -> std::result::Result<bool, ArmError> {
        let response = self.send(Method::GET, url, None).await?;
        Ok(response.status() == StatusCode::ACCEPTED)
    }
}

fn validate_endpoint(endpoint: &str) -> std::result::Result<(), ArmError> {
    let parsed = url::Url::parse(endpoint).map_err(|e| ArmError::InvalidEndpoint {
        url: endpoint.to_string(),
        message: e.to_string(),
    })?;
    if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
        return Err(ArmError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: "expected an http(s) URL".to_string(),
        });
    }
    Ok(())
}

fn pending_operation(response: &reqwest::Response) -> Option<PendingOperation> {
    let status = response.status();
    if status != StatusCode::CREATED && status != StatusCode::ACCEPTED {
        return None;
    }

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    if let Some(url) = header(ASYNC_OPERATION_HEADER) {
        return Some(PendingOperation::AsyncOperation { url });
    }
    if status == StatusCode::ACCEPTED
        && let Some(url) = header(LOCATION.as_str())
    {
        return Some(PendingOperation::Location { url });
    }
    None
}

fn parse<T: DeserializeOwned>(
    value: Option<Value>,
    what: &str,
) -> std::result::Result<T, ArmError> {
    let value =
        value.ok_or_else(|| ArmError::InvalidResponse(format!("empty response for {}", what)))?;
    serde_json::from_value(value).map_err(|e| ArmError::InvalidResponse(format!("{}: {}", what, e)))
}

#[async_trait]
impl ResourceClient for ArmClient {
    async fn create_resource_group(&self, name: &str, region: &str) -> Result<ResourceGroup> {
        let body = serde_json::json!({ "location": region });
        let label = format!("PUT resourcegroups/{}", name);
        let value = self
            .execute(Method::PUT, &self.resource_group_url(name), Some(&body), &label)
            .await?;
        let resource: ArmResource<ResourceGroupProperties> = parse(value, "resource group")?;
        Ok(resource.into_resource_group(name, region))
    }

    async fn delete_resource_group(&self, name: &str) -> Result<()> {
        let label = format!("DELETE resourcegroups/{}", name);
        match self
            .execute(Method::DELETE, &self.resource_group_url(name), None, &label)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!("Resource group {} already absent", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn check_name_availability(
        &self,
        name: &str,
        resource_type: &str,
    ) -> Result<NameAvailability> {
        let url = format!(
            "{}/providers/Microsoft.DBforMySQL/checkNameAvailability?api-version={}",
            self.subscription_url(),
            MYSQL_API_VERSION
        );
        let body = serde_json::json!({ "name": name, "type": resource_type });
        let value = self
            .execute(Method::POST, &url, Some(&body), "POST checkNameAvailability")
            .await?;
        let response: NameAvailabilityResponse = parse(value, "name availability")?;
        Ok(response.into())
    }

    async fn create_server(&self, group: &str, server: &str, spec: &ServerSpec) -> Result<Server> {
        let body = wire::server_create_body(spec);
        let label = format!("PUT flexibleServers/{}", server);
        let value = self
            .execute(
                Method::PUT,
                &self.server_url(group, server, None),
                Some(&body),
                &label,
            )
            .await?;
        let resource: ArmResource<ServerProperties> = parse(value, "server")?;
        Ok(resource.into_server(server))
    }

    async fn update_server(
        &self,
        group: &str,
        server: &str,
        update: &ServerUpdate,
    ) -> Result<Server> {
        let body = wire::server_update_body(update);
        let label = format!("PATCH flexibleServers/{}", server);
        let value = self
            .execute(
                Method::PATCH,
                &self.server_url(group, server, None),
                Some(&body),
                &label,
            )
            .await?;
        let resource: ArmResource<ServerProperties> = parse(value, "server")?;
        Ok(resource.into_server(server))
    }

    async fn delete_server(&self, group: &str, server: &str) -> Result<()> {
        let label = format!("DELETE flexibleServers/{}", server);
        self.execute(
            Method::DELETE,
            &self.server_url(group, server, None),
            None,
            &label,
        )
        .await?;
        Ok(())
    }

    async fn create_or_update_firewall_rule(
        &self,
        group: &str,
        server: &str,
        rule: &str,
        start_ip: &str,
        end_ip: &str,
    ) -> Result<FirewallRule> {
        let body = wire::firewall_rule_body(start_ip, end_ip);
        let label = format!("PUT firewallRules/{}", rule);
        let value = self
            .execute(
                Method::PUT,
                &self.server_url(group, server, Some(("firewallRules", rule))),
                Some(&body),
                &label,
            )
            .await?;
        let resource: ArmResource<FirewallRuleProperties> = parse(value, "firewall rule")?;
        Ok(resource.into_firewall_rule(rule))
    }

    async fn list_firewall_rules(&self, group: &str, server: &str) -> Result<Vec<FirewallRule>> {
        let mut rules = Vec::new();
        let mut next = Some(self.server_url(group, server, Some(("firewallRules", ""))));

        while let Some(url) = next {
            let value = self.get_json(&url).await?;
            let page: Page<ArmResource<FirewallRuleProperties>> =
                parse(Some(value), "firewall rule list")?;
            rules.extend(page.value.into_iter().map(|r| r.into_firewall_rule("")));
            next = page.next_link.filter(|link| !link.is_empty());
        }

        debug!("Listed {} firewall rules on {}", rules.len(), server);
        Ok(rules)
    }

    async fn delete_firewall_rule(&self, group: &str, server: &str, rule: &str) -> Result<()> {
        let label = format!("DELETE firewallRules/{}", rule);
        self.execute(
            Method::DELETE,
            &self.server_url(group, server, Some(("firewallRules", rule))),
            None,
            &label,
        )
        .await?;
        Ok(())
    }

    async fn get_configuration(
        &self,
        group: &str,
        server: &str,
        key: &str,
    ) -> Result<Configuration> {
        let value = self
            .get_json(&self.server_url(group, server, Some(("configurations", key))))
            .await?;
        let resource: ArmResource<ConfigurationProperties> = parse(Some(value), "configuration")?;
        Ok(resource.into_configuration(key))
    }

    async fn update_configuration(
        &self,
        group: &str,
        server: &str,
        key: &str,
        value: &str,
        source: &str,
    ) -> Result<Configuration> {
        let body = wire::configuration_body(value, source);
        let label = format!("PATCH configurations/{}", key);
        let response = self
            .execute(
                Method::PATCH,
                &self.server_url(group, server, Some(("configurations", key))),
                Some(&body),
                &label,
            )
            .await?;
        let resource: ArmResource<ConfigurationProperties> = parse(response, "configuration")?;
        Ok(resource.into_configuration(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ArmClient {
        let principal = ServicePrincipal {
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            subscription_id: "sub-123".to_string(),
        };
        ArmClient::builder(&principal)
            .management_endpoint("https://management.example/")
            .build()
            .unwrap()
    }

    #[test]
    fn test_resource_group_url() {
        assert_eq!(
            client().resource_group_url("rgMySql01"),
            "https://management.example/subscriptions/sub-123/resourcegroups/rgMySql01?api-version=2021-04-01"
        );
    }

    #[test]
    fn test_child_urls() {
        let client = client();
        assert_eq!(
            client.server_url("rg", "srv", Some(("firewallRules", "FirewallRule"))),
            "https://management.example/subscriptions/sub-123/resourceGroups/rg/providers/Microsoft.DBforMySQL/flexibleServers/srv/firewallRules/FirewallRule?api-version=2020-07-01-preview"
        );
        assert_eq!(
            client.server_url("rg", "srv", Some(("firewallRules", ""))),
            "https://management.example/subscriptions/sub-123/resourceGroups/rg/providers/Microsoft.DBforMySQL/flexibleServers/srv/firewallRules?api-version=2020-07-01-preview"
        );
    }

    #[test]
    fn test_rejects_relative_endpoint() {
        let principal = ServicePrincipal {
            tenant_id: "t".to_string(),
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
            subscription_id: "sub".to_string(),
        };
        let result = ArmClient::builder(&principal)
            .management_endpoint("management.azure.com")
            .build();
        assert!(matches!(result, Err(ArmError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let url = client().server_url("rg one", "srv", None);
        assert!(url.contains("resourceGroups/rg%20one/"));
    }
}
