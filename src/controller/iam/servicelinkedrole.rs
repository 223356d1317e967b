use crate::apis::common::Condition;
use crate::apis::iam::ServiceLinkedRole;
use crate::clients::iam::{CreateServiceLinkedRoleInput, CreatedServiceLinkedRole, IamApi};
use crate::clients::{self, GLOBAL_REGION};
use crate::controller;
use crate::managed::{
    self, meta, Data, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate,
    Managed,
    Options,
};
use crate::Error;
use async_trait::async_trait;
use kube::Client;
use tracing::info;

const ERR_CREATE: &str = "cannot create ServiceLinkedRole in AWS";
const ERR_DESCRIBE: &str = "failed to describe ServiceLinkedRole";
const ERR_DELETE: &str = "failed to delete ServiceLinkedRole";

/// Reconciles ServiceLinkedRoles until shutdown.
pub async fn setup(client: Client, options: Options) {
    // AWS picks the role name, so the external name is only known after create.
    controller::run(Data {
        client: client.clone(),
        connector: Box::new(Connector { client }),
        initializers: vec![],
        options,
        reporter: controller::reporter::<ServiceLinkedRole>(),
    })
    .await
}

pub struct Connector {
    client: Client,
}

#[async_trait]
impl managed::Connector<ServiceLinkedRole> for Connector {
    async fn connect(
        &self,
        cr: &ServiceLinkedRole,
    ) -> Result<Box<dyn ExternalClient<ServiceLinkedRole>>, Error> {
        let config = clients::get_config(&self.client, cr, GLOBAL_REGION).await?;
        Ok(Box::new(External {
            client: aws_sdk_iam::Client::new(&config),
        }))
    }
}

pub struct External<C> {
    client: C,
}

#[async_trait]
impl<C: IamApi> ExternalClient<ServiceLinkedRole> for External<C> {
    async fn observe(&self, cr: &mut ServiceLinkedRole) -> Result<ExternalObservation, Error> {
        let Some(name) = meta::external_name(cr) else {
            return Ok(ExternalObservation::default());
        };
        let observation = match self.client.get_role(name).await {
            Ok(observation) => observation,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::default()),
            Err(e) => return Err(Error::aws(ERR_DESCRIBE, e)),
        };

        cr.status.get_or_insert_with(Default::default).at_provider = observation;
        cr.set_conditions([Condition::available()]);

        // Service-linked roles are immutable once created.
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: true,
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut ServiceLinkedRole) -> Result<ExternalCreation, Error> {
        cr.set_conditions([Condition::creating()]);
        let params = &cr.spec.for_provider;
        let created = self
            .client
            .create_service_linked_role(CreateServiceLinkedRoleInput {
                aws_service_name: params.aws_service_name.clone(),
                custom_suffix: params.custom_suffix.clone(),
                description: params.description.clone(),
            })
            .await
            .map_err(|e| Error::aws(ERR_CREATE, e))?;

        if let Some(role_name) = created.observation.role_name.clone() {
            info!("created service-linked role {}", role_name);
            meta::set_external_name(cr, &role_name);
        }
        if cr.spec.for_provider.description.is_none() {
            cr.spec.for_provider.description = created.description;
        }
        cr.status.get_or_insert_with(Default::default).at_provider = created.observation;
        Ok(ExternalCreation::default())
    }

    async fn update(&self, _cr: &mut ServiceLinkedRole) -> Result<ExternalUpdate, Error> {
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut ServiceLinkedRole) -> Result<(), Error> {
        cr.set_conditions([Condition::deleting()]);
        let Some(name) = meta::external_name(cr) else {
            return Ok(());
        };
        match self.client.delete_service_linked_role(name).await {
            Ok(task) => {
                info!("deletion of service-linked role {} started as task {}", name, task);
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(Error::aws(ERR_DELETE, e)),
        }
    }
}
