use crate::apis::common::Condition;
use crate::apis::sesv2::{ConfigurationSet, ConfigurationSetParameters, SuppressionOptions};
use crate::clients::sesv2::{ConfigurationSetObservation, SesV2Api};
use crate::clients;
use crate::controller;
use crate::controller::sesv2::are_tags_up_to_date;
use crate::managed::{
    self, meta, Data, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate,
    Initializer, Managed, NameAsExternalName, Options,
};
use crate::Error;
use async_trait::async_trait;
use kube::Client;
use std::collections::BTreeSet;
use std::sync::Mutex;
use tracing::debug;

const ERR_DESCRIBE: &str = "cannot describe ConfigurationSet";
const ERR_CREATE: &str = "cannot create ConfigurationSet";
const ERR_DELETE: &str = "cannot delete ConfigurationSet";
const ERR_UPDATE_DELIVERY: &str = "update failed for ConfigurationSetDeliveryOptions";
const ERR_UPDATE_REPUTATION: &str = "update failed for ConfigurationSetReputationOptions";
const ERR_UPDATE_SUPPRESSION: &str = "update failed for ConfigurationSetSuppressionOptions";
const ERR_UPDATE_TRACKING: &str = "update failed for ConfigurationSetTrackingOptions";
const ERR_UPDATE_SENDING: &str = "update failed for ConfigurationSetSendingOptions";

/// Reconciles ConfigurationSets until shutdown.
pub async fn setup(client: Client, options: Options) {
    controller::run(Data {
        client: client.clone(),
        connector: Box::new(Connector { client }),
        initializers: vec![Box::new(NameAsExternalName), Box::new(Tagger)],
        options,
        reporter: controller::reporter::<ConfigurationSet>(),
    })
    .await
}

pub struct Connector {
    client: Client,
}

#[async_trait]
impl managed::Connector<ConfigurationSet> for Connector {
    async fn connect(
        &self,
        cr: &ConfigurationSet,
    ) -> Result<Box<dyn ExternalClient<ConfigurationSet>>, Error> {
        let config = clients::get_config(&self.client, cr, &cr.spec.for_provider.region).await?;
        Ok(Box::new(External::new(aws_sdk_sesv2::Client::new(&config))))
    }
}

pub struct External<C> {
    client: C,
    // Last observation, reused by update within the same reconcile.
    observation: Mutex<Option<ConfigurationSetObservation>>,
}

impl<C: SesV2Api> External<C> {
    pub fn new(client: C) -> Self {
        External {
            client,
            observation: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<ConfigurationSetObservation> {
        self.observation.lock().ok().and_then(|o| o.clone())
    }

    fn cache(&self, observation: ConfigurationSetObservation) {
        if let Ok(mut o) = self.observation.lock() {
            *o = Some(observation);
        }
    }
}

fn differs<T: PartialEq + Default>(a: Option<T>, b: Option<T>) -> bool {
    a.unwrap_or_default() != b.unwrap_or_default()
}

pub fn is_up_to_date_delivery_options(
    p: &ConfigurationSetParameters,
    o: &ConfigurationSetObservation,
) -> bool {
    match (&p.delivery_options, &o.delivery_options) {
        (Some(desired), Some(observed)) => {
            !differs(desired.sending_pool_name.as_deref(), observed.sending_pool_name.as_deref())
                && !differs(desired.tls_policy.as_deref(), observed.tls_policy.as_deref())
        }
        _ => true,
    }
}

pub fn is_up_to_date_reputation_options(
    p: &ConfigurationSetParameters,
    o: &ConfigurationSetObservation,
) -> bool {
    match (&p.reputation_options, &o.reputation_options) {
        (Some(desired), Some(observed)) => {
            !differs(desired.reputation_metrics_enabled, observed.reputation_metrics_enabled)
        }
        _ => true,
    }
}

pub fn is_up_to_date_sending_options(
    p: &ConfigurationSetParameters,
    o: &ConfigurationSetObservation,
) -> bool {
    match (&p.sending_options, &o.sending_options) {
        (Some(desired), Some(observed)) => {
            !differs(desired.sending_enabled, observed.sending_enabled)
        }
        _ => true,
    }
}

/// Reasons compare as sets; no suppression options means no reasons.
pub fn is_up_to_date_suppression_options(
    p: &ConfigurationSetParameters,
    o: &ConfigurationSetObservation,
) -> bool {
    fn reasons(options: Option<&SuppressionOptions>) -> BTreeSet<&str> {
        options
            .map(|s| s.suppressed_reasons.iter().map(String::as_str).collect::<BTreeSet<_>>())
            .unwrap_or_default()
    }
    let desired = p.suppression_options.as_ref().map_or(0, |s| s.suppressed_reasons.len());
    let observed = o.suppression_options.as_ref().map_or(0, |s| s.suppressed_reasons.len());
    desired == observed
        && reasons(p.suppression_options.as_ref()) == reasons(o.suppression_options.as_ref())
}

pub fn is_up_to_date_tracking_options(
    p: &ConfigurationSetParameters,
    o: &ConfigurationSetObservation,
) -> bool {
    match (&p.tracking_options, &o.tracking_options) {
        // SES stops reporting tracking options once they are removed.
        (Some(_), None) => false,
        (Some(desired), Some(observed)) => !differs(
            desired.custom_redirect_domain.as_deref(),
            observed.custom_redirect_domain.as_deref(),
        ),
        _ => true,
    }
}

pub fn is_up_to_date(cr: &ConfigurationSet, observation: &ConfigurationSetObservation) -> bool {
    if meta::was_deleted(cr) {
        return true;
    }
    let p = &cr.spec.for_provider;
    is_up_to_date_delivery_options(p, observation)
        && is_up_to_date_reputation_options(p, observation)
        && is_up_to_date_sending_options(p, observation)
        && is_up_to_date_suppression_options(p, observation)
        && is_up_to_date_tracking_options(p, observation)
        && are_tags_up_to_date(&p.tags, &observation.tags)
}

#[async_trait]
impl<C: SesV2Api> ExternalClient<ConfigurationSet> for External<C> {
    async fn observe(&self, cr: &mut ConfigurationSet) -> Result<ExternalObservation, Error> {
        let name = meta::required_external_name(cr)?;
        let observation = match self.client.get_configuration_set(name).await {
            Ok(observation) => observation,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::default()),
            Err(e) => return Err(Error::aws(ERR_DESCRIBE, e)),
        };

        let sending_enabled = observation.sending_options.as_ref().and_then(|s| s.sending_enabled);
        cr.set_conditions([match sending_enabled {
            Some(true) => Condition::available(),
            Some(false) => Condition::unavailable(),
            None => Condition::creating(),
        }]);

        let up_to_date = is_up_to_date(cr, &observation);
        self.cache(observation);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut ConfigurationSet) -> Result<ExternalCreation, Error> {
        cr.set_conditions([Condition::creating()]);
        let name = meta::required_external_name(cr)?;
        self.client
            .create_configuration_set(name, &cr.spec.for_provider)
            .await
            .map_err(|e| Error::aws(ERR_CREATE, e))?;
        Ok(ExternalCreation::default())
    }

    // SES has no single update call, each drifted section is put separately.
    async fn update(&self, cr: &mut ConfigurationSet) -> Result<ExternalUpdate, Error> {
        let name = meta::required_external_name(cr)?;
        let observation = match self.cached() {
            Some(observation) => observation,
            None => self
                .client
                .get_configuration_set(name)
                .await
                .map_err(|e| Error::aws(ERR_DESCRIBE, e))?,
        };
        let p = &cr.spec.for_provider;

        if !is_up_to_date_delivery_options(p, &observation) {
            if let Some(options) = p.delivery_options.clone() {
                self.client
                    .put_delivery_options(name, options)
                    .await
                    .map_err(|e| Error::aws(ERR_UPDATE_DELIVERY, e))?;
            }
        }

        if !is_up_to_date_reputation_options(p, &observation) {
            if let Some(options) = p.reputation_options.clone() {
                self.client
                    .put_reputation_options(name, options)
                    .await
                    .map_err(|e| Error::aws(ERR_UPDATE_REPUTATION, e))?;
            }
        }

        if !is_up_to_date_suppression_options(p, &observation) {
            self.client
                .put_suppression_options(name, p.suppression_options.clone().unwrap_or_default())
                .await
                .map_err(|e| Error::aws(ERR_UPDATE_SUPPRESSION, e))?;
        }

        if !is_up_to_date_tracking_options(p, &observation) {
            if let Some(options) = p.tracking_options.clone() {
                self.client
                    .put_tracking_options(name, options)
                    .await
                    .map_err(|e| Error::aws(ERR_UPDATE_TRACKING, e))?;
            }
        }

        if !is_up_to_date_sending_options(p, &observation) {
            if let Some(options) = p.sending_options.clone() {
                self.client
                    .put_sending_options(name, options)
                    .await
                    .map_err(|e| Error::aws(ERR_UPDATE_SENDING, e))?;
            }
        }

        if !are_tags_up_to_date(&p.tags, &observation.tags) {
            debug!("tags of configuration set {} differ and are only set on create", name);
        }
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut ConfigurationSet) -> Result<(), Error> {
        cr.set_conditions([Condition::deleting()]);
        let name = meta::required_external_name(cr)?;
        match self.client.delete_configuration_set(name).await {
            Err(e) if !e.is_not_found() => Err(Error::aws(ERR_DELETE, e)),
            _ => Ok(()),
        }
    }
}

/// Merges the external tags into `forProvider.tags`.
pub struct Tagger;

impl Initializer<ConfigurationSet> for Tagger {
    fn initialize(&self, cr: &mut ConfigurationSet) -> bool {
        let tags = meta::add_external_tags(cr, &cr.spec.for_provider.tags);
        if tags == cr.spec.for_provider.tags {
            return false;
        }
        cr.spec.for_provider.tags = tags;
        true
    }
}
