use crate::apis::common::{
    Condition, ConditionType, DeletionPolicy, Reference, ResourceSpec, ResourceStatus,
    SecretReference,
};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A Kubernetes object that represents a resource in an external system.
pub trait Managed:
    Resource<DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    fn resource_spec(&self) -> &ResourceSpec;

    fn resource_status(&self) -> Option<&ResourceStatus>;

    fn resource_status_mut(&mut self) -> &mut ResourceStatus;

    /// Merge patch writing the whole status subresource.
    fn status_patch(&self) -> serde_json::Value;

    fn condition(&self, ct: ConditionType) -> Option<&Condition> {
        self.resource_status().and_then(|s| s.get_condition(ct))
    }

    fn set_conditions<I: IntoIterator<Item = Condition>>(&mut self, conditions: I) {
        self.resource_status_mut().set_conditions(conditions)
    }

    fn deletion_policy(&self) -> DeletionPolicy {
        self.resource_spec().deletion_policy
    }

    fn provider_config_reference(&self) -> Option<&Reference> {
        self.resource_spec().provider_config_ref.as_ref()
    }

    fn write_connection_secret_to_reference(&self) -> Option<&SecretReference> {
        self.resource_spec().write_connection_secret_to_ref.as_ref()
    }
}

/// Implements [`Managed`] for kinds whose spec flattens a `resource_spec` and whose
/// status flattens a `resource_status`.
#[macro_export]
macro_rules! managed_resource {
    ($($kind:ty),+ $(,)?) => {
        $(
            impl $crate::managed::Managed for $kind {
                fn resource_spec(&self) -> &$crate::apis::common::ResourceSpec {
                    &self.spec.resource_spec
                }

                fn resource_status(&self) -> Option<&$crate::apis::common::ResourceStatus> {
                    self.status.as_ref().map(|s| &s.resource_status)
                }

                fn resource_status_mut(&mut self) -> &mut $crate::apis::common::ResourceStatus {
                    &mut self.status.get_or_insert_with(Default::default).resource_status
                }

                fn status_patch(&self) -> serde_json::Value {
                    serde_json::json!({ "status": &self.status })
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::common::ConditionStatus;
    use crate::apis::sesv2::{EmailTemplate, EmailTemplateParameters, EmailTemplateSpec};

    fn template() -> EmailTemplate {
        EmailTemplate::new(
            "welcome",
            EmailTemplateSpec {
                resource_spec: ResourceSpec {
                    provider_config_ref: Some(Reference { name: "aws".into() }),
                    ..Default::default()
                },
                for_provider: EmailTemplateParameters {
                    region: "eu-west-1".into(),
                    template_content: None,
                },
            },
        )
    }

    #[test]
    fn set_conditions_initializes_status() {
        let mut cr = template();
        assert!(cr.condition(ConditionType::Ready).is_none());

        cr.set_conditions([Condition::available()]);
        let ready = cr.condition(ConditionType::Ready).unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
    }

    #[test]
    fn accessors_read_resource_spec() {
        let cr = template();
        assert_eq!(cr.deletion_policy(), DeletionPolicy::Delete);
        assert_eq!(cr.provider_config_reference().unwrap().name, "aws");
        assert!(cr.write_connection_secret_to_reference().is_none());
    }

    #[test]
    fn status_patch_wraps_status() {
        let mut cr = template();
        cr.set_conditions([Condition::reconcile_success()]);
        let patch = cr.status_patch();
        assert_eq!(patch["status"]["conditions"][0]["type"], "Synced");
        assert_eq!(patch["status"]["conditions"][0]["reason"], "ReconcileSuccess");
    }
}
