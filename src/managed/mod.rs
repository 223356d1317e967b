// Drives a managed resource towards its desired state in AWS.
// Each reconcile:
//  * runs initializers (external name, tags) and ensures our finalizer is set
//  * connects to AWS using the referenced ProviderConfig
//  * observes the external resource, then creates, updates or deletes it
//  * records the outcome as Ready/Synced conditions and Kubernetes events
// Per-kind behaviour lives behind the Connector/ExternalClient traits.

use crate::apis::common::{Condition, DeletionPolicy};
use crate::Error;
use async_trait::async_trait;
use kube::api::{Patch, PatchParams, PostParams};
use kube::runtime::controller::Action;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod connection;
pub mod meta;
#[cfg(test)]
pub(crate) mod mock;
mod resource;

pub use connection::ConnectionDetails;
pub use resource::Managed;

#[derive(Debug, Default)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    /// Set when observe filled in unset spec fields, which then need persisting.
    pub resource_late_initialized: bool,
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Default)]
pub struct ExternalCreation {
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Default)]
pub struct ExternalUpdate {
    pub connection_details: ConnectionDetails,
}

/// Operations against the external resource backing a managed resource.
#[async_trait]
pub trait ExternalClient<K: Managed>: Send + Sync {
    async fn observe(&self, cr: &mut K) -> Result<ExternalObservation, Error>;

    async fn create(&self, cr: &mut K) -> Result<ExternalCreation, Error>;

    async fn update(&self, cr: &mut K) -> Result<ExternalUpdate, Error>;

    async fn delete(&self, cr: &mut K) -> Result<(), Error>;
}

/// Produces an [`ExternalClient`] authenticated for a particular managed resource.
#[async_trait]
pub trait Connector<K: Managed>: Send + Sync {
    async fn connect(&self, cr: &K) -> Result<Box<dyn ExternalClient<K>>, Error>;
}

/// Mutates a managed resource before it is connected. Returns whether it changed.
pub trait Initializer<K: Managed>: Send + Sync {
    fn initialize(&self, cr: &mut K) -> bool;
}

/// Uses `metadata.name` as the external name unless one is already set.
pub struct NameAsExternalName;

impl<K: Managed> Initializer<K> for NameAsExternalName {
    fn initialize(&self, cr: &mut K) -> bool {
        if meta::external_name(cr).is_some() {
            return false;
        }
        let name = cr.name_any();
        meta::set_external_name(cr, &name);
        true
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Requeue interval once the external resource is up to date.
    pub poll_interval: Duration,
    /// Requeue interval while waiting for a create or delete to take effect.
    pub short_wait: Duration,
    pub error_requeue: Duration,
}

pub struct Data<K: Managed> {
    pub client: Client,
    pub connector: Box<dyn Connector<K>>,
    pub initializers: Vec<Box<dyn Initializer<K>>>,
    pub options: Options,
    pub reporter: Reporter,
}

pub async fn reconcile<K: Managed>(obj: Arc<K>, ctx: Arc<Data<K>>) -> Result<Action, Error> {
    let api = Api::<K>::all(ctx.client.clone());
    let recorder = Recorder::new(ctx.client.clone(), ctx.reporter.clone(), obj.object_ref(&()));
    let mut cr = (*obj).clone();

    let result = if meta::was_deleted(&cr) {
        cleanup(&api, &mut cr, &ctx, &recorder).await
    } else {
        apply(&api, &mut cr, &ctx, &recorder).await
    };

    if let Err(err) = &result {
        cr.set_conditions([Condition::reconcile_error(err)]);
        publish_event(
            &recorder,
            EventType::Warning,
            "CannotReconcile",
            "Reconcile",
            err.to_string(),
        )
        .await;
        if let Err(e) = patch_status(&api, &cr).await {
            warn!("cannot record reconcile error on {}: {}", cr.name_any(), e);
        }
    }
    result
}

pub fn error_policy<K: Managed>(_object: Arc<K>, _error: &Error, ctx: Arc<Data<K>>) -> Action {
    Action::requeue(ctx.options.error_requeue)
}

async fn apply<K: Managed>(
    api: &Api<K>,
    cr: &mut K,
    ctx: &Data<K>,
    recorder: &Recorder,
) -> Result<Action, Error> {
    let mut changed = false;
    for initializer in &ctx.initializers {
        changed |= initializer.initialize(cr);
    }
    if !meta::has_finalizer(cr) {
        cr.finalizers_mut().push(meta::FINALIZER.to_string());
        changed = true;
    }
    if changed {
        persist(api, cr).await?;
    }

    let external = ctx.connector.connect(cr).await?;
    let observation = external.observe(cr).await?;
    if observation.resource_late_initialized {
        debug!("late-initialized spec of {}", cr.name_any());
        persist(api, cr).await?;
    }

    if !observation.resource_exists {
        let creation = external.create(cr).await?;
        // Create may record the external name chosen by AWS and late-initialize the spec.
        persist(api, cr).await?;
        connection::publish_connection_details(&ctx.client, cr, &creation.connection_details)
            .await?;
        info!("requested creation of external resource for {}", cr.name_any());
        publish_event(
            recorder,
            EventType::Normal,
            "CreatedExternalResource",
            "Create",
            "Successfully requested creation of external resource".to_string(),
        )
        .await;
        cr.set_conditions([Condition::reconcile_success()]);
        patch_status(api, cr).await?;
        return Ok(Action::requeue(ctx.options.short_wait));
    }

    connection::publish_connection_details(&ctx.client, cr, &observation.connection_details)
        .await?;

    if !observation.resource_up_to_date {
        let update = external.update(cr).await?;
        connection::publish_connection_details(&ctx.client, cr, &update.connection_details)
            .await?;
        info!("updated external resource for {}", cr.name_any());
        publish_event(
            recorder,
            EventType::Normal,
            "UpdatedExternalResource",
            "Update",
            "Successfully requested update of external resource".to_string(),
        )
        .await;
    }

    cr.set_conditions([Condition::reconcile_success()]);
    patch_status(api, cr).await?;
    Ok(Action::requeue(ctx.options.poll_interval))
}

async fn cleanup<K: Managed>(
    api: &Api<K>,
    cr: &mut K,
    ctx: &Data<K>,
    recorder: &Recorder,
) -> Result<Action, Error> {
    if !meta::has_finalizer(cr) {
        return Ok(Action::await_change());
    }

    if cr.deletion_policy() == DeletionPolicy::Orphan {
        info!("orphaning external resource of {}", cr.name_any());
        remove_finalizer(api, cr).await?;
        return Ok(Action::await_change());
    }

    let external = ctx.connector.connect(cr).await?;
    let observation = external.observe(cr).await?;
    if observation.resource_exists {
        external.delete(cr).await?;
        info!("requested deletion of external resource for {}", cr.name_any());
        publish_event(
            recorder,
            EventType::Normal,
            "DeletedExternalResource",
            "Delete",
            "Successfully requested deletion of external resource".to_string(),
        )
        .await;
        cr.set_conditions([Condition::reconcile_success()]);
        patch_status(api, cr).await?;
        return Ok(Action::requeue(ctx.options.short_wait));
    }

    info!("external resource of {} is gone, removing finalizer", cr.name_any());
    remove_finalizer(api, cr).await?;
    Ok(Action::await_change())
}

// Writes metadata and spec back, keeping the in-memory status.
async fn persist<K: Managed>(api: &Api<K>, cr: &mut K) -> Result<(), Error> {
    let updated = api
        .replace(&cr.name_any(), &PostParams::default(), cr)
        .await
        .map_err(|e| Error::kube("cannot update managed resource", e))?;
    cr.meta_mut().resource_version = updated.resource_version();
    Ok(())
}

async fn remove_finalizer<K: Managed>(api: &Api<K>, cr: &K) -> Result<(), Error> {
    let finalizers: Vec<&String> = cr
        .finalizers()
        .iter()
        .filter(|f| *f != meta::FINALIZER)
        .collect();
    api.patch(
        &cr.name_any(),
        &PatchParams::default(),
        &Patch::Merge(json!({
            "metadata": {
                "finalizers": finalizers,
                "resourceVersion": cr.resource_version(),
            },
        })),
    )
    .await
    .map_err(|e| Error::kube("cannot remove finalizer", e))?;
    Ok(())
}

async fn patch_status<K: Managed>(api: &Api<K>, cr: &K) -> Result<(), Error> {
    api.patch_status(&cr.name_any(), &PatchParams::default(), &Patch::Merge(cr.status_patch()))
        .await
        .map_err(|e| Error::kube("cannot update managed resource status", e))?;
    Ok(())
}

async fn publish_event(
    recorder: &Recorder,
    type_: EventType,
    reason: &str,
    action: &str,
    note: String,
) {
    let event = Event {
        type_,
        reason: reason.to_string(),
        note: Some(note),
        action: action.to_string(),
        secondary: None,
    };
    if let Err(e) = recorder.publish(event).await {
        warn!("cannot publish event: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ApiServer;
    use super::*;
    use crate::apis::common::{ConditionType, REASON_RECONCILE_ERROR, REASON_RECONCILE_SUCCESS};
    use crate::apis::sesv2::{
        EmailTemplate, EmailTemplateContent, EmailTemplateParameters, EmailTemplateSpec,
    };
    use http::Method;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use k8s_openapi::chrono::Utc;
    use std::sync::Mutex;

    const PATH: &str = "/apis/sesv2.aws.crossplane.io/v1alpha1/emailtemplates/welcome";
    const STATUS_PATH: &str =
        "/apis/sesv2.aws.crossplane.io/v1alpha1/emailtemplates/welcome/status";

    #[derive(Default)]
    struct Script {
        exists: bool,
        up_to_date: bool,
        late_init: bool,
        fail_observe: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Script {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct FakeConnector(Arc<Script>);

    #[async_trait]
    impl Connector<EmailTemplate> for FakeConnector {
        async fn connect(
            &self,
            _cr: &EmailTemplate,
        ) -> Result<Box<dyn ExternalClient<EmailTemplate>>, Error> {
            Ok(Box::new(FakeExternal(self.0.clone())))
        }
    }

    struct FakeExternal(Arc<Script>);

    #[async_trait]
    impl ExternalClient<EmailTemplate> for FakeExternal {
        async fn observe(&self, cr: &mut EmailTemplate) -> Result<ExternalObservation, Error> {
            self.0.calls.lock().unwrap().push("observe");
            if self.0.fail_observe {
                return Err(Error::ProviderConfig("no credentials".into()));
            }
            if self.0.late_init {
                cr.spec.for_provider.template_content = Some(EmailTemplateContent {
                    subject: Some("Hi".into()),
                    ..Default::default()
                });
            }
            Ok(ExternalObservation {
                resource_exists: self.0.exists,
                resource_up_to_date: self.0.up_to_date,
                resource_late_initialized: self.0.late_init,
                ..Default::default()
            })
        }

        async fn create(&self, _cr: &mut EmailTemplate) -> Result<ExternalCreation, Error> {
            self.0.calls.lock().unwrap().push("create");
            Ok(ExternalCreation::default())
        }

        async fn update(&self, _cr: &mut EmailTemplate) -> Result<ExternalUpdate, Error> {
            self.0.calls.lock().unwrap().push("update");
            Ok(ExternalUpdate::default())
        }

        async fn delete(&self, _cr: &mut EmailTemplate) -> Result<(), Error> {
            self.0.calls.lock().unwrap().push("delete");
            Ok(())
        }
    }

    fn options() -> Options {
        Options {
            poll_interval: Duration::from_secs(60),
            short_wait: Duration::from_secs(30),
            error_requeue: Duration::from_secs(5),
        }
    }

    fn template(name: &str) -> EmailTemplate {
        EmailTemplate::new(
            name,
            EmailTemplateSpec {
                resource_spec: Default::default(),
                for_provider: EmailTemplateParameters {
                    region: "us-west-2".into(),
                    template_content: None,
                },
            },
        )
    }

    #[test]
    fn name_as_external_name_sets_missing_name() {
        let mut cr = template("welcome");
        assert!(Initializer::<EmailTemplate>::initialize(&NameAsExternalName, &mut cr));
        assert_eq!(meta::external_name(&cr), Some("welcome"));
    }

    #[test]
    fn name_as_external_name_keeps_existing_name() {
        let mut cr = template("welcome");
        meta::set_external_name(&mut cr, "welcome-v2");
        assert!(!Initializer::<EmailTemplate>::initialize(&NameAsExternalName, &mut cr));
        assert_eq!(meta::external_name(&cr), Some("welcome-v2"));
    }

    fn initialized() -> EmailTemplate {
        let mut cr = template("welcome");
        meta::set_external_name(&mut cr, "welcome");
        cr.finalizers_mut().push(meta::FINALIZER.to_string());
        cr
    }

    fn deleted(policy: DeletionPolicy) -> EmailTemplate {
        let mut cr = initialized();
        cr.spec.resource_spec.deletion_policy = policy;
        cr.metadata.deletion_timestamp = Some(Time(Utc::now()));
        cr
    }

    async fn run(
        cr: EmailTemplate,
        script: Script,
    ) -> (Result<Action, Error>, ApiServer, Arc<Script>) {
        let server = ApiServer::default().with_object(PATH, serde_json::to_value(&cr).unwrap());
        let script = Arc::new(script);
        let ctx = Arc::new(Data {
            client: server.client(),
            connector: Box::new(FakeConnector(script.clone())),
            initializers: vec![Box::new(NameAsExternalName)],
            options: options(),
            reporter: Reporter {
                controller: "emailtemplate.sesv2.aws.crossplane.io".into(),
                instance: None,
            },
        });
        let result = reconcile(Arc::new(cr), ctx).await;
        (result, server, script)
    }

    fn finalizer_patches(server: &ApiServer) -> Vec<serde_json::Value> {
        server
            .requests(Method::PATCH, PATH)
            .into_iter()
            .map(|r| r.body["metadata"]["finalizers"].clone())
            .collect()
    }

    #[tokio::test]
    async fn orphaned_resource_only_drops_finalizer() {
        let (result, server, script) =
            run(deleted(DeletionPolicy::Orphan), Script::default()).await;

        assert_eq!(result.unwrap(), Action::await_change());
        assert!(script.calls().is_empty());
        assert_eq!(finalizer_patches(&server), vec![serde_json::json!([])]);
    }

    #[tokio::test]
    async fn deletion_waits_for_external_resource() {
        let script = Script {
            exists: true,
            ..Default::default()
        };
        let (result, server, script) = run(deleted(DeletionPolicy::Delete), script).await;

        assert_eq!(result.unwrap(), Action::requeue(Duration::from_secs(30)));
        assert_eq!(script.calls(), vec!["observe", "delete"]);
        assert!(finalizer_patches(&server).is_empty());
        assert_eq!(server.requests(Method::PATCH, STATUS_PATH).len(), 1);
    }

    #[tokio::test]
    async fn finalizer_dropped_once_external_resource_is_gone() {
        let (result, server, script) =
            run(deleted(DeletionPolicy::Delete), Script::default()).await;

        assert_eq!(result.unwrap(), Action::await_change());
        assert_eq!(script.calls(), vec!["observe"]);
        assert_eq!(finalizer_patches(&server), vec![serde_json::json!([])]);
    }

    #[tokio::test]
    async fn late_initialized_spec_is_persisted() {
        let script = Script {
            exists: true,
            up_to_date: true,
            late_init: true,
            ..Default::default()
        };
        let (result, server, script) = run(initialized(), script).await;

        assert_eq!(result.unwrap(), Action::requeue(Duration::from_secs(60)));
        assert_eq!(script.calls(), vec!["observe"]);
        let puts = server.requests(Method::PUT, PATH);
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].body["spec"]["forProvider"]["templateContent"]["subject"], "Hi");
    }

    #[tokio::test]
    async fn drifted_resource_is_updated() {
        let script = Script {
            exists: true,
            ..Default::default()
        };
        let (result, server, script) = run(initialized(), script).await;

        assert_eq!(result.unwrap(), Action::requeue(Duration::from_secs(60)));
        assert_eq!(script.calls(), vec!["observe", "update"]);
        assert!(server.requests(Method::PUT, PATH).is_empty());
    }

    #[tokio::test]
    async fn creation_is_persisted_and_requeued_shortly() {
        let (result, server, script) = run(initialized(), Script::default()).await;

        assert_eq!(result.unwrap(), Action::requeue(Duration::from_secs(30)));
        assert_eq!(script.calls(), vec!["observe", "create"]);
        let puts = server.requests(Method::PUT, PATH);
        assert_eq!(puts.len(), 1);
        assert_eq!(
            puts[0].body["metadata"]["annotations"][meta::ANNOTATION_EXTERNAL_NAME],
            "welcome"
        );
        let status = server.requests(Method::PATCH, STATUS_PATH);
        assert_eq!(status[0].body["status"]["conditions"][0]["reason"], REASON_RECONCILE_SUCCESS);
    }

    #[tokio::test]
    async fn first_reconcile_adds_finalizer_and_external_name() {
        let script = Script {
            exists: true,
            up_to_date: true,
            ..Default::default()
        };
        let (result, server, _) = run(template("welcome"), script).await;

        assert!(result.is_ok());
        let puts = server.requests(Method::PUT, PATH);
        assert_eq!(puts.len(), 1);
        assert_eq!(
            puts[0].body["metadata"]["finalizers"],
            serde_json::json!([meta::FINALIZER])
        );
        assert_eq!(
            puts[0].body["metadata"]["annotations"][meta::ANNOTATION_EXTERNAL_NAME],
            "welcome"
        );
    }

    #[tokio::test]
    async fn failure_is_recorded_as_reconcile_error() {
        let script = Script {
            fail_observe: true,
            ..Default::default()
        };
        let (result, server, _) = run(initialized(), script).await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::ProviderConfig(_)));
        let status = server.requests(Method::PATCH, STATUS_PATH);
        assert_eq!(status.len(), 1);
        let mut recorded = initialized();
        recorded.status = serde_json::from_value(status[0].body["status"].clone()).unwrap();
        let synced = recorded.condition(ConditionType::Synced).unwrap();
        assert_eq!(synced.reason, REASON_RECONCILE_ERROR);
        assert_eq!(synced.message.as_deref(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn errors_requeue_after_configured_delay() {
        let ctx = Arc::new(Data {
            client: ApiServer::default().client(),
            connector: Box::new(FakeConnector(Arc::default())),
            initializers: vec![],
            options: options(),
            reporter: "test".to_string().into(),
        });
        let err = Error::ProviderConfig("no credentials".into());
        assert_eq!(
            error_policy(Arc::new(initialized()), &err, ctx),
            Action::requeue(Duration::from_secs(5))
        );
    }
}
