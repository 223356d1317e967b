use crate::apis::common::Condition;
use crate::apis::sesv2::{EmailTemplate, EmailTemplateContent};
use crate::clients::sesv2::SesV2Api;
use crate::clients;
use crate::controller;
use crate::managed::{
    self, meta, Data, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate,
    Managed,
    NameAsExternalName, Options,
};
use crate::Error;
use async_trait::async_trait;
use kube::Client;

const ERR_DESCRIBE: &str = "cannot describe EmailTemplate";
const ERR_CREATE: &str = "cannot create EmailTemplate";
const ERR_UPDATE: &str = "cannot update EmailTemplate";
const ERR_DELETE: &str = "cannot delete EmailTemplate";

/// Reconciles EmailTemplates until shutdown.
pub async fn setup(client: Client, options: Options) {
    controller::run(Data {
        client: client.clone(),
        connector: Box::new(Connector { client }),
        initializers: vec![Box::new(NameAsExternalName)],
        options,
        reporter: controller::reporter::<EmailTemplate>(),
    })
    .await
}

pub struct Connector {
    client: Client,
}

#[async_trait]
impl managed::Connector<EmailTemplate> for Connector {
    async fn connect(
        &self,
        cr: &EmailTemplate,
    ) -> Result<Box<dyn ExternalClient<EmailTemplate>>, Error> {
        let config = clients::get_config(&self.client, cr, &cr.spec.for_provider.region).await?;
        Ok(Box::new(External {
            client: aws_sdk_sesv2::Client::new(&config),
        }))
    }
}

pub struct External<C> {
    client: C,
}

/// Content fields are only compared when both sides carry content.
pub fn is_up_to_date(cr: &EmailTemplate, observed: Option<&EmailTemplateContent>) -> bool {
    if meta::was_deleted(cr) {
        return true;
    }
    let (Some(desired), Some(observed)) = (&cr.spec.for_provider.template_content, observed) else {
        return true;
    };
    let same = |a: &Option<String>, b: &Option<String>| {
        a.as_deref().unwrap_or_default() == b.as_deref().unwrap_or_default()
    };
    same(&desired.html, &observed.html)
        && same(&desired.subject, &observed.subject)
        && same(&desired.text, &observed.text)
}

fn desired_content(cr: &EmailTemplate) -> EmailTemplateContent {
    cr.spec.for_provider.template_content.clone().unwrap_or_default()
}

#[async_trait]
impl<C: SesV2Api> ExternalClient<EmailTemplate> for External<C> {
    async fn observe(&self, cr: &mut EmailTemplate) -> Result<ExternalObservation, Error> {
        let name = meta::required_external_name(cr)?;
        let observed = match self.client.get_email_template(name).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::default()),
            Err(e) => return Err(Error::aws(ERR_DESCRIBE, e)),
        };

        cr.set_conditions([Condition::available()]);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: is_up_to_date(cr, observed.as_ref()),
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut EmailTemplate) -> Result<ExternalCreation, Error> {
        cr.set_conditions([Condition::creating()]);
        let name = meta::required_external_name(cr)?;
        self.client
            .create_email_template(name, desired_content(cr))
            .await
            .map_err(|e| Error::aws(ERR_CREATE, e))?;
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut EmailTemplate) -> Result<ExternalUpdate, Error> {
        let name = meta::required_external_name(cr)?;
        self.client
            .update_email_template(name, desired_content(cr))
            .await
            .map_err(|e| Error::aws(ERR_UPDATE, e))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut EmailTemplate) -> Result<(), Error> {
        cr.set_conditions([Condition::deleting()]);
        let name = meta::required_external_name(cr)?;
        match self.client.delete_email_template(name).await {
            Err(e) if !e.is_not_found() => Err(Error::aws(ERR_DELETE, e)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::common::{ConditionType, REASON_AVAILABLE};
    use crate::apis::sesv2::{EmailTemplateParameters, EmailTemplateSpec};
    use crate::controller::sesv2::fake::FakeSes;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use k8s_openapi::chrono::Utc;

    const NAME: &str = "welcome";

    fn content(subject: &str) -> EmailTemplateContent {
        EmailTemplateContent {
            html: Some("<h1>Hello {{name}}</h1>".into()),
            subject: Some(subject.into()),
            text: None,
        }
    }

    fn email_template(content: Option<EmailTemplateContent>) -> EmailTemplate {
        let mut cr = EmailTemplate::new(
            NAME,
            EmailTemplateSpec {
                resource_spec: Default::default(),
                for_provider: EmailTemplateParameters {
                    region: "eu-west-1".into(),
                    template_content: content,
                },
            },
        );
        meta::set_external_name(&mut cr, NAME);
        cr
    }

    fn external(existing: Option<EmailTemplateContent>) -> External<FakeSes> {
        let client = FakeSes::default();
        if let Some(content) = existing {
            client.templates.lock().unwrap().insert(NAME.into(), content);
        }
        External { client }
    }

    #[tokio::test]
    async fn observe_missing_template() {
        let e = external(None);
        let obs = e.observe(&mut email_template(Some(content("Hi")))).await.unwrap();
        assert!(!obs.resource_exists);
    }

    #[tokio::test]
    async fn observe_up_to_date_template() {
        let e = external(Some(content("Hi")));
        let mut cr = email_template(Some(content("Hi")));
        let obs = e.observe(&mut cr).await.unwrap();
        assert!(obs.resource_exists);
        assert!(obs.resource_up_to_date);
        assert_eq!(cr.condition(ConditionType::Ready).unwrap().reason, REASON_AVAILABLE);
    }

    #[tokio::test]
    async fn observe_changed_subject() {
        let e = external(Some(content("Hi")));
        let obs = e.observe(&mut email_template(Some(content("Hello")))).await.unwrap();
        assert!(!obs.resource_up_to_date);
    }

    #[test]
    fn missing_text_equals_empty_text() {
        let mut observed = content("Hi");
        observed.text = Some(String::new());
        assert!(is_up_to_date(&email_template(Some(content("Hi"))), Some(&observed)));
    }

    #[test]
    fn content_compared_only_when_both_present() {
        assert!(is_up_to_date(&email_template(None), Some(&content("Hi"))));
        assert!(is_up_to_date(&email_template(Some(content("Hi"))), None));
    }

    #[test]
    fn deleted_template_is_up_to_date() {
        let mut cr = email_template(Some(content("Hello")));
        cr.metadata.deletion_timestamp = Some(Time(Utc::now()));
        assert!(is_up_to_date(&cr, Some(&content("Hi"))));
    }

    #[tokio::test]
    async fn create_update_delete() {
        let e = external(None);
        let mut cr = email_template(Some(content("Hi")));
        e.create(&mut cr).await.unwrap();
        assert_eq!(e.client.templates.lock().unwrap()[NAME], content("Hi"));

        cr.spec.for_provider.template_content = Some(content("Hello"));
        e.update(&mut cr).await.unwrap();
        assert_eq!(e.client.templates.lock().unwrap()[NAME], content("Hello"));

        e.delete(&mut cr).await.unwrap();
        assert!(e.client.templates.lock().unwrap().is_empty());
        assert_eq!(
            e.client.calls(),
            vec![
                "create_email_template welcome",
                "update_email_template welcome",
                "delete_email_template welcome",
            ]
        );
    }

    #[tokio::test]
    async fn delete_ignores_missing_template() {
        let e = external(None);
        e.delete(&mut email_template(None)).await.unwrap();
    }

    #[tokio::test]
    async fn operations_need_external_name() {
        let e = external(None);
        let mut cr = email_template(None);
        cr.metadata.annotations = None;
        assert!(matches!(e.observe(&mut cr).await, Err(Error::MissingField(_))));
    }
}
