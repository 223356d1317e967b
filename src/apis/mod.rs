use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

pub mod aws;
pub mod common;
pub mod database;
pub mod iam;
pub mod sesv2;

crate::managed_resource!(
    database::RdsInstance,
    iam::ServiceLinkedRole,
    sesv2::ConfigurationSet,
    sesv2::EmailTemplate,
);

/// Every CRD served by this provider.
pub fn crds() -> Vec<CustomResourceDefinition> {
    vec![
        aws::ProviderConfig::crd(),
        database::RdsInstance::crd(),
        iam::ServiceLinkedRole::crd(),
        sesv2::ConfigurationSet::crd(),
        sesv2::EmailTemplate::crd(),
    ]
}
