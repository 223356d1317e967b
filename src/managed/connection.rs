use crate::managed::Managed;
use crate::Error;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

pub const SECRET_ENDPOINT_KEY: &str = "endpoint";
pub const SECRET_PORT_KEY: &str = "port";
pub const SECRET_USER_KEY: &str = "username";
pub const SECRET_PASSWORD_KEY: &str = "password";

const CONNECTION_SECRET_TYPE: &str = "connection.crossplane.io/v1alpha1";
const FIELD_MANAGER: &str = "provider-aws";
const PASSWORD_LENGTH: usize = 27;

/// Details needed to connect to an external resource, keyed by secret key.
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// A random alphanumeric password.
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Reads single keys out of Kubernetes Secrets.
#[async_trait]
pub trait SecretReader: Send + Sync {
    /// Value of `key`, or an empty string when the Secret lacks it.
    async fn secret_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, kube::Error>;
}

#[async_trait]
impl SecretReader for Client {
    async fn secret_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, kube::Error> {
        let secret = Api::<Secret>::namespaced(self.clone(), namespace).get(name).await?;
        Ok(secret
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .map(|v| String::from_utf8_lossy(&v.0).into_owned())
            .unwrap_or_default())
    }
}

/// Writes connection details to the Secret referenced by `writeConnectionSecretToRef`.
/// The Secret is owned by the managed resource so it is collected along with it.
pub async fn publish_connection_details<K: Managed>(
    client: &Client,
    cr: &K,
    details: &ConnectionDetails,
) -> Result<(), Error> {
    let Some(reference) = cr.write_connection_secret_to_reference() else {
        return Ok(());
    };
    if details.is_empty() {
        return Ok(());
    }

    let api = Api::<Secret>::namespaced(client.clone(), &reference.namespace);
    // Apply drops any key it does not send, so earlier details are sent again.
    let mut data = api
        .get_opt(&reference.name)
        .await
        .map_err(|e| Error::kube("cannot get connection secret", e))?
        .and_then(|existing| existing.data)
        .unwrap_or_default();
    data.extend(details.iter().map(|(k, v)| (k.clone(), ByteString(v.clone()))));

    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(reference.name.clone()),
            namespace: Some(reference.namespace.clone()),
            owner_references: cr.controller_owner_ref(&()).map(|o| vec![o]),
            ..ObjectMeta::default()
        },
        data: Some(data),
        type_: Some(CONNECTION_SECRET_TYPE.to_string()),
        ..Secret::default()
    };

    debug!(
        "publishing {} connection detail(s) to {}/{}",
        details.len(),
        reference.namespace,
        reference.name
    );
    api.patch(
        &reference.name,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(&secret),
    )
    .await
    .map_err(|e| Error::kube("cannot publish connection details", e))?;
    Ok(())
}
