use crate::apis::common::Condition;
use crate::apis::database::{
    RdsInstance, RDS_INSTANCE_STATE_AVAILABLE, RDS_INSTANCE_STATE_CREATING,
    RDS_INSTANCE_STATE_DELETING, RDS_INSTANCE_STATE_MODIFYING,
};
use crate::clients::rds::{self, DeleteDbInstanceInput, RdsApi};
use crate::clients;
use crate::controller;
use crate::managed::connection::{
    generate_password, SecretReader, SECRET_PASSWORD_KEY, SECRET_USER_KEY,
};
use crate::managed::{
    self, meta, ConnectionDetails, Data, ExternalClient, ExternalCreation, ExternalObservation,
    ExternalUpdate, Initializer, Managed, NameAsExternalName, Options,
};
use crate::Error;
use async_trait::async_trait;
use kube::Client;
use tracing::debug;

const ERR_CREATE_FAILED: &str = "cannot create RDS instance";
const ERR_MODIFY_FAILED: &str = "cannot modify RDS instance";
const ERR_ADD_TAGS_FAILED: &str = "cannot add tags to RDS instance";
const ERR_DELETE_FAILED: &str = "cannot delete RDS instance";
const ERR_DESCRIBE_FAILED: &str = "cannot describe RDS instance";
const ERR_GET_PASSWORD_SECRET_FAILED: &str = "cannot get password secret";

/// Reconciles RDSInstances until shutdown.
pub async fn setup(client: Client, options: Options) {
    controller::run(Data {
        client: client.clone(),
        connector: Box::new(Connector { client }),
        initializers: vec![Box::new(NameAsExternalName), Box::new(Tagger)],
        options,
        reporter: controller::reporter::<RdsInstance>(),
    })
    .await
}

pub struct Connector {
    client: Client,
}

#[async_trait]
impl managed::Connector<RdsInstance> for Connector {
    async fn connect(
        &self,
        cr: &RdsInstance,
    ) -> Result<Box<dyn ExternalClient<RdsInstance>>, Error> {
        let config = clients::get_config(&self.client, cr, &cr.spec.for_provider.region).await?;
        Ok(Box::new(External {
            client: aws_sdk_rds::Client::new(&config),
            secrets: self.client.clone(),
        }))
    }
}

pub struct External<C, S> {
    client: C,
    secrets: S,
}

fn state(cr: &RdsInstance) -> &str {
    cr.status
        .as_ref()
        .map(|s| s.at_provider.db_instance_status.as_str())
        .unwrap_or_default()
}

impl<C: RdsApi, S: SecretReader> External<C, S> {
    async fn password(&self, cr: &RdsInstance) -> Result<Option<String>, Error> {
        let Some(selector) = &cr.spec.for_provider.master_password_secret_ref else {
            return Ok(None);
        };
        self.secrets
            .secret_value(&selector.namespace, &selector.name, &selector.key)
            .await
            .map(Some)
            .map_err(|e| Error::kube(ERR_GET_PASSWORD_SECRET_FAILED, e))
    }

    // The published password; unreadable counts as empty.
    async fn saved_password(&self, cr: &RdsInstance) -> Option<String> {
        let reference = cr.write_connection_secret_to_reference()?;
        Some(
            self.secrets
                .secret_value(&reference.namespace, &reference.name, SECRET_PASSWORD_KEY)
                .await
                .unwrap_or_default(),
        )
    }
}

#[async_trait]
impl<C: RdsApi, S: SecretReader> ExternalClient<RdsInstance> for External<C, S> {
    async fn observe(&self, cr: &mut RdsInstance) -> Result<ExternalObservation, Error> {
        let mut password_changed = false;
        if cr.write_connection_secret_to_reference().is_some() {
            if let Some(desired) = self.password(cr).await? {
                password_changed = Some(desired) != self.saved_password(cr).await;
            }
        }

        let name = meta::required_external_name(cr)?.to_string();
        let instance = match self.client.describe_db_instance(&name).await {
            Ok(instance) => instance,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::default()),
            Err(e) => return Err(Error::aws(ERR_DESCRIBE_FAILED, e)),
        };

        let current = cr.spec.for_provider.clone();
        rds::late_initialize(&mut cr.spec.for_provider, &instance);
        let late_initialized = current != cr.spec.for_provider;

        let observation = rds::generate_observation(&instance);
        cr.set_conditions([match observation.db_instance_status.as_str() {
            RDS_INSTANCE_STATE_AVAILABLE => Condition::available(),
            RDS_INSTANCE_STATE_CREATING => Condition::creating(),
            RDS_INSTANCE_STATE_DELETING => Condition::deleting(),
            _ => Condition::unavailable(),
        }]);
        let connection_details = rds::connection_details(&cr.spec.for_provider, &observation);
        cr.status.get_or_insert_with(Default::default).at_provider = observation;

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: rds::is_up_to_date(&cr.spec.for_provider, &instance)
                && !password_changed,
            resource_late_initialized: late_initialized,
            connection_details,
        })
    }

    async fn create(&self, cr: &mut RdsInstance) -> Result<ExternalCreation, Error> {
        cr.set_conditions([Condition::creating()]);
        if state(cr) == RDS_INSTANCE_STATE_CREATING {
            return Ok(ExternalCreation::default());
        }

        let password = match self.password(cr).await? {
            Some(password) => password,
            None => generate_password(),
        };
        let name = meta::required_external_name(cr)?;
        self.client
            .create_db_instance(rds::generate_create_input(name, &password, &cr.spec.for_provider))
            .await
            .map_err(|e| Error::aws(ERR_CREATE_FAILED, e))?;

        let mut connection_details = ConnectionDetails::new();
        connection_details.insert(SECRET_PASSWORD_KEY.to_string(), password.into_bytes());
        if let Some(user) = &cr.spec.for_provider.master_username {
            connection_details.insert(SECRET_USER_KEY.to_string(), user.clone().into_bytes());
        }
        Ok(ExternalCreation { connection_details })
    }

    async fn update(&self, cr: &mut RdsInstance) -> Result<ExternalUpdate, Error> {
        if matches!(state(cr), RDS_INSTANCE_STATE_MODIFYING | RDS_INSTANCE_STATE_CREATING) {
            return Ok(ExternalUpdate::default());
        }

        // AWS rejects modifications that repeat current values, and status does not
        // mirror the whole instance, so diff against a fresh describe.
        let name = meta::required_external_name(cr)?.to_string();
        let instance = self
            .client
            .describe_db_instance(&name)
            .await
            .map_err(|e| Error::aws(ERR_DESCRIBE_FAILED, e))?;
        let patch = rds::create_patch(&instance, &cr.spec.for_provider);
        let mut modify = rds::generate_modify_input(
            &name,
            &patch,
            cr.spec.for_provider.apply_modifications_immediately,
        );

        let mut connection_details = ConnectionDetails::new();
        if let Some(desired) = self.password(cr).await? {
            if self.saved_password(cr).await.as_ref() != Some(&desired) {
                connection_details
                    .insert(SECRET_PASSWORD_KEY.to_string(), desired.clone().into_bytes());
                modify.master_user_password = Some(desired);
            }
        }

        if modify.has_changes() {
            self.client
                .modify_db_instance(modify)
                .await
                .map_err(|e| Error::aws(ERR_MODIFY_FAILED, e))?;
        }

        if !patch.tags.is_empty() {
            let arn = match instance.db_instance_arn {
                Some(arn) => arn,
                None => cr
                    .status
                    .as_ref()
                    .map(|s| s.at_provider.db_instance_arn.clone())
                    .unwrap_or_default(),
            };
            self.client
                .add_tags_to_resource(&arn, patch.tags)
                .await
                .map_err(|e| Error::aws(ERR_ADD_TAGS_FAILED, e))?;
        }

        Ok(ExternalUpdate { connection_details })
    }

    async fn delete(&self, cr: &mut RdsInstance) -> Result<(), Error> {
        cr.set_conditions([Condition::deleting()]);
        if state(cr) == RDS_INSTANCE_STATE_DELETING {
            return Ok(());
        }

        // Settings such as deletion protection can block deletion, so apply the
        // spec first. This is best effort: a failing update must not block deletion.
        match self.update(cr).await {
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => debug!("best-effort update before deletion failed: {}", e),
            Ok(_) => {}
        }

        let input = DeleteDbInstanceInput {
            db_instance_identifier: meta::required_external_name(cr)?.to_string(),
            skip_final_snapshot: cr.spec.for_provider.skip_final_snapshot_before_deletion,
            final_db_snapshot_identifier: cr.spec.for_provider.final_db_snapshot_identifier.clone(),
        };
        match self.client.delete_db_instance(input).await {
            Err(e) if !e.is_not_found() => Err(Error::aws(ERR_DELETE_FAILED, e)),
            _ => Ok(()),
        }
    }
}

/// Adds the external tags to `spec.forProvider.tags`.
pub struct Tagger;

impl Initializer<RdsInstance> for Tagger {
    fn initialize(&self, cr: &mut RdsInstance) -> bool {
        let tags = meta::add_external_tags(cr, &cr.spec.for_provider.tags);
        if tags == cr.spec.for_provider.tags {
            return false;
        }
        cr.spec.for_provider.tags = tags;
        true
    }
}
