use crate::apis::common::{ResourceSpec, ResourceStatus, SecretKeySelector, Tag};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const RDS_INSTANCE_STATE_AVAILABLE: &str = "available";
pub const RDS_INSTANCE_STATE_CREATING: &str = "creating";
pub const RDS_INSTANCE_STATE_DELETING: &str = "deleting";
pub const RDS_INSTANCE_STATE_MODIFYING: &str = "modifying";

/// An AWS RDS database instance.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.aws.crossplane.io",
    version = "v1beta1",
    kind = "RDSInstance",
    struct = "RdsInstance",
    plural = "rdsinstances",
    status = "RdsInstanceStatus",
    printcolumn = r#"{"name": "STATE", "type": "string", "jsonPath": ".status.atProvider.dbInstanceStatus"}"#,
    printcolumn = r#"{"name": "ENGINE", "type": "string", "jsonPath": ".spec.forProvider.engine"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RdsInstanceSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,
    pub for_provider: RdsInstanceParameters,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RdsInstanceParameters {
    pub region: String,
    pub db_instance_class: String,
    pub engine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    /// Storage in gibibytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_storage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_username: Option<String>,
    /// Master password to use instead of a generated one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_password_secret_ref: Option<SecretKeySelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(rename = "multiAZ", default, skip_serializing_if = "Option::is_none")]
    pub multi_az: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicly_accessible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention_period: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_backup_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_maintenance_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_protection: Option<bool>,
    /// Subnet group placing the instance in a VPC. Defaults to the default VPC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_subnet_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vpc_security_group_ids: Vec<String>,
    /// Fixed at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_encrypted: Option<bool>,
    /// Fixed at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_modifications_immediately: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_final_snapshot_before_deletion: Option<bool>,
    #[serde(
        rename = "finalDBSnapshotIdentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub final_db_snapshot_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RdsInstanceStatus {
    #[serde(flatten)]
    pub resource_status: ResourceStatus,
    #[serde(default)]
    pub at_provider: RdsInstanceObservation,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RdsInstanceObservation {
    #[serde(default)]
    pub db_instance_status: String,
    #[serde(default)]
    pub db_instance_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(rename = "hostedZoneID", default, skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,
}
