use crate::apis::sesv2::{
    ConfigurationSetParameters, DeliveryOptions, EmailTemplateContent, ReputationOptions,
    SendingOptions, SuppressionOptions, TrackingOptions,
};
use crate::clients::sesv2::{ConfigurationSetObservation, SesV2Api};
use crate::clients::AwsError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory SES keeping templates and configuration sets by name, and a log of calls.
#[derive(Default)]
pub struct FakeSes {
    pub templates: Mutex<HashMap<String, EmailTemplateContent>>,
    pub configuration_sets: Mutex<HashMap<String, ConfigurationSetObservation>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSes {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str, name: &str) {
        self.calls.lock().unwrap().push(format!("{call} {name}"));
    }

    fn with_set(
        &self,
        call: &str,
        name: &str,
        f: impl FnOnce(&mut ConfigurationSetObservation),
    ) -> Result<(), AwsError> {
        self.record(call, name);
        let mut sets = self.configuration_sets.lock().unwrap();
        let set = sets
            .get_mut(name)
            .ok_or_else(|| AwsError::NotFound(name.to_string()))?;
        f(set);
        Ok(())
    }
}

#[async_trait]
impl SesV2Api for FakeSes {
    async fn get_email_template(
        &self,
        name: &str,
    ) -> Result<Option<EmailTemplateContent>, AwsError> {
        self.templates
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| AwsError::NotFound(name.to_string()))
    }

    async fn create_email_template(
        &self,
        name: &str,
        content: EmailTemplateContent,
    ) -> Result<(), AwsError> {
        self.record("create_email_template", name);
        self.templates.lock().unwrap().insert(name.to_string(), content);
        Ok(())
    }

    async fn update_email_template(
        &self,
        name: &str,
        content: EmailTemplateContent,
    ) -> Result<(), AwsError> {
        self.record("update_email_template", name);
        match self.templates.lock().unwrap().get_mut(name) {
            Some(existing) => {
                *existing = content;
                Ok(())
            }
            None => Err(AwsError::NotFound(name.to_string())),
        }
    }

    async fn delete_email_template(&self, name: &str) -> Result<(), AwsError> {
        self.record("delete_email_template", name);
        self.templates
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| AwsError::NotFound(name.to_string()))
    }

    async fn get_configuration_set(
        &self,
        name: &str,
    ) -> Result<ConfigurationSetObservation, AwsError> {
        self.record("get_configuration_set", name);
        self.configuration_sets
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AwsError::NotFound(name.to_string()))
    }

    async fn create_configuration_set(
        &self,
        name: &str,
        params: &ConfigurationSetParameters,
    ) -> Result<(), AwsError> {
        self.record("create_configuration_set", name);
        self.configuration_sets.lock().unwrap().insert(
            name.to_string(),
            ConfigurationSetObservation {
                delivery_options: params.delivery_options.clone(),
                reputation_options: params.reputation_options.clone(),
                sending_options: params.sending_options.clone(),
                suppression_options: params.suppression_options.clone(),
                tracking_options: params.tracking_options.clone(),
                tags: params.tags.clone(),
            },
        );
        Ok(())
    }

    async fn put_delivery_options(
        &self,
        name: &str,
        options: DeliveryOptions,
    ) -> Result<(), AwsError> {
        self.with_set("put_delivery_options", name, |s| s.delivery_options = Some(options))
    }

    async fn put_reputation_options(
        &self,
        name: &str,
        options: ReputationOptions,
    ) -> Result<(), AwsError> {
        self.with_set("put_reputation_options", name, |s| s.reputation_options = Some(options))
    }

    async fn put_sending_options(
        &self,
        name: &str,
        options: SendingOptions,
    ) -> Result<(), AwsError> {
        self.with_set("put_sending_options", name, |s| s.sending_options = Some(options))
    }

    async fn put_suppression_options(
        &self,
        name: &str,
        options: SuppressionOptions,
    ) -> Result<(), AwsError> {
        self.with_set("put_suppression_options", name, |s| s.suppression_options = Some(options))
    }

    async fn put_tracking_options(
        &self,
        name: &str,
        options: TrackingOptions,
    ) -> Result<(), AwsError> {
        self.with_set("put_tracking_options", name, |s| s.tracking_options = Some(options))
    }

    async fn delete_configuration_set(&self, name: &str) -> Result<(), AwsError> {
        self.record("delete_configuration_set", name);
        self.configuration_sets
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| AwsError::NotFound(name.to_string()))
    }
}
