use crate::apis::aws::{CredentialsSource, ProviderConfig};
use crate::managed::connection::SecretReader;
use crate::managed::Managed;
use crate::Error;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

pub mod iam;
pub mod rds;
pub mod sesv2;

/// IAM is a global service; its endpoint lives in us-east-1.
pub const GLOBAL_REGION: &str = "us-east-1";
pub const DEFAULT_PROVIDER_CONFIG: &str = "default";
const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{code}: {message}")]
    Service { code: String, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound(_))
    }
}

/// Classifies an SDK error, mapping any of `not_found_codes` to [`AwsError::NotFound`].
pub(crate) fn classify<E, R>(err: SdkError<E, R>, not_found_codes: &[&str]) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => {
            let code = service.code().unwrap_or_default().to_string();
            let message = service.message().unwrap_or_default().to_string();
            if not_found_codes.contains(&code.as_str()) {
                AwsError::NotFound(message)
            } else {
                AwsError::Service { code, message }
            }
        }
        None => AwsError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

/// Builds the AWS SDK config for a managed resource from the ProviderConfig it references.
pub async fn get_config<K: Managed>(
    client: &Client,
    cr: &K,
    region: &str,
) -> Result<SdkConfig, Error> {
    let name = cr
        .provider_config_reference()
        .map(|r| r.name.as_str())
        .unwrap_or(DEFAULT_PROVIDER_CONFIG);

    let provider_config = Api::<ProviderConfig>::all(client.clone())
        .get_opt(name)
        .await
        .map_err(|e| Error::kube("cannot get ProviderConfig", e))?
        .ok_or_else(|| Error::ProviderConfig(format!("ProviderConfig {} not found", name)))?;

    let loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
    let loader = match provider_config.spec.credentials.source {
        CredentialsSource::InjectedIdentity => loader,
        CredentialsSource::Secret => {
            let selector = provider_config
                .spec
                .credentials
                .secret_ref
                .as_ref()
                .ok_or_else(|| {
                    Error::ProviderConfig(format!("ProviderConfig {} has no secretRef", name))
                })?;
            let data = client
                .secret_value(&selector.namespace, &selector.name, &selector.key)
                .await
                .map_err(|e| Error::kube("cannot get credentials secret", e))?;
            loader.credentials_provider(parse_credentials(&data, DEFAULT_PROFILE).await?)
        }
    };

    debug!("loaded AWS config from ProviderConfig {} for region {}", name, region);
    Ok(loader.load().await)
}

/// Resolves a profile of an AWS shared-credentials file to static credentials.
pub async fn parse_credentials(data: &str, profile: &str) -> Result<Credentials, Error> {
    let files = ProfileFiles::builder()
        .with_contents(ProfileFileKind::Credentials, data)
        .build();
    ProfileFileCredentialsProvider::builder()
        .profile_files(files)
        .profile_name(profile)
        .build()
        .provide_credentials()
        .await
        .map_err(|e| {
            Error::ProviderConfig(format!(
                "cannot load credentials profile {}: {}",
                profile,
                DisplayErrorContext(&e)
            ))
        })
}
