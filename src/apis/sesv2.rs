use crate::apis::common::{ResourceSpec, ResourceStatus, Tag};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An SES email template.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "sesv2.aws.crossplane.io",
    version = "v1alpha1",
    kind = "EmailTemplate",
    plural = "emailtemplates",
    status = "EmailTemplateStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplateSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,
    pub for_provider: EmailTemplateParameters,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplateParameters {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_content: Option<EmailTemplateContent>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplateContent {
    #[serde(rename = "html", default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplateStatus {
    #[serde(flatten)]
    pub resource_status: ResourceStatus,
}

/// An SES configuration set.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "sesv2.aws.crossplane.io",
    version = "v1alpha1",
    kind = "ConfigurationSet",
    plural = "configurationsets",
    status = "ConfigurationSetStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSetSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,
    pub for_provider: ConfigurationSetParameters,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSetParameters {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_options: Option<DeliveryOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation_options: Option<ReputationOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sending_options: Option<SendingOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppression_options: Option<SuppressionOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_options: Option<TrackingOptions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sending_pool_name: Option<String>,
    /// `REQUIRE` or `OPTIONAL`.
    #[serde(rename = "tlsPolicy", default, skip_serializing_if = "Option::is_none")]
    pub tls_policy: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReputationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation_metrics_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sending_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionOptions {
    /// `BOUNCE` and/or `COMPLAINT`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed_reasons: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_redirect_domain: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSetStatus {
    #[serde(flatten)]
    pub resource_status: ResourceStatus,
}
