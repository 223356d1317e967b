use crate::apis::common::Tag;
use crate::apis::iam::{AttachedPermissionsBoundary, RoleLastUsed, ServiceLinkedRoleObservation};
use crate::clients::{classify, AwsError};
use async_trait::async_trait;
use aws_sdk_iam::primitives::DateTime;
use aws_sdk_iam::types;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use k8s_openapi::chrono::{TimeZone, Utc};

const NOT_FOUND_CODES: &[&str] = &["NoSuchEntity", "NoSuchEntityException"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateServiceLinkedRoleInput {
    pub aws_service_name: String,
    pub custom_suffix: Option<String>,
    pub description: Option<String>,
}

/// A freshly created service-linked role.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatedServiceLinkedRole {
    pub observation: ServiceLinkedRoleObservation,
    pub description: Option<String>,
}

#[async_trait]
pub trait IamApi: Send + Sync {
    async fn get_role(&self, role_name: &str) -> Result<ServiceLinkedRoleObservation, AwsError>;

    async fn create_service_linked_role(
        &self,
        input: CreateServiceLinkedRoleInput,
    ) -> Result<CreatedServiceLinkedRole, AwsError>;

    /// Starts deletion of a service-linked role, returning the deletion task id.
    async fn delete_service_linked_role(&self, role_name: &str) -> Result<String, AwsError>;
}

fn to_time(dt: &DateTime) -> Option<Time> {
    Utc.timestamp_opt(dt.secs(), dt.subsec_nanos()).single().map(Time)
}

pub fn generate_observation(role: &types::Role) -> ServiceLinkedRoleObservation {
    ServiceLinkedRoleObservation {
        arn: Some(role.arn().to_string()),
        assume_role_policy_document: role.assume_role_policy_document().map(String::from),
        create_date: to_time(role.create_date()),
        max_session_duration: role.max_session_duration(),
        path: Some(role.path().to_string()),
        permissions_boundary: role.permissions_boundary().map(|b| AttachedPermissionsBoundary {
            permissions_boundary_arn: b.permissions_boundary_arn().map(String::from),
            permissions_boundary_type: b
                .permissions_boundary_type()
                .map(|t| t.as_str().to_string()),
        }),
        role_id: Some(role.role_id().to_string()),
        role_last_used: role.role_last_used().map(|u| RoleLastUsed {
            last_used_date: u.last_used_date().and_then(to_time),
            region: u.region().map(String::from),
        }),
        role_name: Some(role.role_name().to_string()),
        tags: role.tags().iter().map(|t| Tag::new(t.key(), t.value())).collect(),
    }
}

#[async_trait]
impl IamApi for aws_sdk_iam::Client {
    async fn get_role(&self, role_name: &str) -> Result<ServiceLinkedRoleObservation, AwsError> {
        let output = self
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        output
            .role()
            .map(generate_observation)
            .ok_or_else(|| AwsError::NotFound(format!("role {} not found", role_name)))
    }

    async fn create_service_linked_role(
        &self,
        input: CreateServiceLinkedRoleInput,
    ) -> Result<CreatedServiceLinkedRole, AwsError> {
        let output = self
            .create_service_linked_role()
            .aws_service_name(input.aws_service_name)
            .set_custom_suffix(input.custom_suffix)
            .set_description(input.description)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(output
            .role()
            .map(|role| CreatedServiceLinkedRole {
                observation: generate_observation(role),
                description: role.description().map(String::from),
            })
            .unwrap_or_default())
    }

    async fn delete_service_linked_role(&self, role_name: &str) -> Result<String, AwsError> {
        let output = self
            .delete_service_linked_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(output.deletion_task_id().to_string())
    }
}
