use crate::apis::common::Tag;
use crate::apis::sesv2::{
    ConfigurationSetParameters, DeliveryOptions, EmailTemplateContent, ReputationOptions,
    SendingOptions, SuppressionOptions, TrackingOptions,
};
use crate::clients::{classify, AwsError};
use async_trait::async_trait;
use aws_sdk_sesv2::types;

const NOT_FOUND_CODES: &[&str] = &["NotFoundException"];

/// A configuration set as reported by GetConfigurationSet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigurationSetObservation {
    pub delivery_options: Option<DeliveryOptions>,
    pub reputation_options: Option<ReputationOptions>,
    pub sending_options: Option<SendingOptions>,
    pub suppression_options: Option<SuppressionOptions>,
    pub tracking_options: Option<TrackingOptions>,
    pub tags: Vec<Tag>,
}

#[async_trait]
pub trait SesV2Api: Send + Sync {
    async fn get_email_template(
        &self,
        name: &str,
    ) -> Result<Option<EmailTemplateContent>, AwsError>;

    async fn create_email_template(
        &self,
        name: &str,
        content: EmailTemplateContent,
    ) -> Result<(), AwsError>;

    async fn update_email_template(
        &self,
        name: &str,
        content: EmailTemplateContent,
    ) -> Result<(), AwsError>;

    async fn delete_email_template(&self, name: &str) -> Result<(), AwsError>;

    async fn get_configuration_set(
        &self,
        name: &str,
    ) -> Result<ConfigurationSetObservation, AwsError>;

    async fn create_configuration_set(
        &self,
        name: &str,
        params: &ConfigurationSetParameters,
    ) -> Result<(), AwsError>;

    async fn put_delivery_options(
        &self,
        name: &str,
        options: DeliveryOptions,
    ) -> Result<(), AwsError>;

    async fn put_reputation_options(
        &self,
        name: &str,
        options: ReputationOptions,
    ) -> Result<(), AwsError>;

    async fn put_sending_options(
        &self,
        name: &str,
        options: SendingOptions,
    ) -> Result<(), AwsError>;

    async fn put_suppression_options(
        &self,
        name: &str,
        options: SuppressionOptions,
    ) -> Result<(), AwsError>;

    async fn put_tracking_options(
        &self,
        name: &str,
        options: TrackingOptions,
    ) -> Result<(), AwsError>;

    async fn delete_configuration_set(&self, name: &str) -> Result<(), AwsError>;
}

fn sdk_template_content(content: EmailTemplateContent) -> types::EmailTemplateContent {
    types::EmailTemplateContent::builder()
        .set_subject(content.subject)
        .set_text(content.text)
        .set_html(content.html)
        .build()
}

fn sdk_delivery_options(options: DeliveryOptions) -> types::DeliveryOptions {
    types::DeliveryOptions::builder()
        .set_tls_policy(options.tls_policy.as_deref().map(types::TlsPolicy::from))
        .set_sending_pool_name(options.sending_pool_name)
        .build()
}

fn sdk_suppressed_reasons(options: &SuppressionOptions) -> Vec<types::SuppressionListReason> {
    options
        .suppressed_reasons
        .iter()
        .map(|r| types::SuppressionListReason::from(r.as_str()))
        .collect()
}

fn invalid_input(err: impl std::fmt::Display) -> AwsError {
    AwsError::InvalidInput(err.to_string())
}

pub fn generate_configuration_set_observation(
    output: &aws_sdk_sesv2::operation::get_configuration_set::GetConfigurationSetOutput,
) -> ConfigurationSetObservation {
    ConfigurationSetObservation {
        delivery_options: output.delivery_options().map(|o| DeliveryOptions {
            sending_pool_name: o.sending_pool_name().map(String::from),
            tls_policy: o.tls_policy().map(|p| p.as_str().to_string()),
        }),
        reputation_options: output.reputation_options().map(|o| ReputationOptions {
            reputation_metrics_enabled: Some(o.reputation_metrics_enabled()),
        }),
        sending_options: output.sending_options().map(|o| SendingOptions {
            sending_enabled: Some(o.sending_enabled()),
        }),
        suppression_options: output.suppression_options().map(|o| SuppressionOptions {
            suppressed_reasons: o
                .suppressed_reasons()
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
        }),
        tracking_options: output.tracking_options().map(|o| TrackingOptions {
            custom_redirect_domain: Some(o.custom_redirect_domain().to_string()),
        }),
        tags: output.tags().iter().map(|t| Tag::new(t.key(), t.value())).collect(),
    }
}

#[async_trait]
impl SesV2Api for aws_sdk_sesv2::Client {
    async fn get_email_template(
        &self,
        name: &str,
    ) -> Result<Option<EmailTemplateContent>, AwsError> {
        let output = self
            .get_email_template()
            .template_name(name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(output.template_content().map(|c| EmailTemplateContent {
            html: c.html().map(String::from),
            subject: c.subject().map(String::from),
            text: c.text().map(String::from),
        }))
    }

    async fn create_email_template(
        &self,
        name: &str,
        content: EmailTemplateContent,
    ) -> Result<(), AwsError> {
        self.create_email_template()
            .template_name(name)
            .template_content(sdk_template_content(content))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn update_email_template(
        &self,
        name: &str,
        content: EmailTemplateContent,
    ) -> Result<(), AwsError> {
        self.update_email_template()
            .template_name(name)
            .template_content(sdk_template_content(content))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn delete_email_template(&self, name: &str) -> Result<(), AwsError> {
        self.delete_email_template()
            .template_name(name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn get_configuration_set(
        &self,
        name: &str,
    ) -> Result<ConfigurationSetObservation, AwsError> {
        let output = self
            .get_configuration_set()
            .configuration_set_name(name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(generate_configuration_set_observation(&output))
    }

    async fn create_configuration_set(
        &self,
        name: &str,
        params: &ConfigurationSetParameters,
    ) -> Result<(), AwsError> {
        let tracking = match &params.tracking_options {
            Some(t) => Some(
                types::TrackingOptions::builder()
                    .set_custom_redirect_domain(t.custom_redirect_domain.clone())
                    .build()
                    .map_err(invalid_input)?,
            ),
            None => None,
        };
        let tags = params
            .tags
            .iter()
            .map(|t| types::Tag::builder().key(&t.key).value(&t.value).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid_input)?;

        self.create_configuration_set()
            .configuration_set_name(name)
            .set_delivery_options(params.delivery_options.clone().map(sdk_delivery_options))
            .set_reputation_options(params.reputation_options.as_ref().map(|o| {
                types::ReputationOptions::builder()
                    .reputation_metrics_enabled(o.reputation_metrics_enabled.unwrap_or_default())
                    .build()
            }))
            .set_sending_options(params.sending_options.as_ref().map(|o| {
                types::SendingOptions::builder()
                    .sending_enabled(o.sending_enabled.unwrap_or_default())
                    .build()
            }))
            .set_suppression_options(params.suppression_options.as_ref().map(|o| {
                types::SuppressionOptions::builder()
                    .set_suppressed_reasons(Some(sdk_suppressed_reasons(o)))
                    .build()
            }))
            .set_tracking_options(tracking)
            .set_tags((!tags.is_empty()).then_some(tags))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn put_delivery_options(
        &self,
        name: &str,
        options: DeliveryOptions,
    ) -> Result<(), AwsError> {
        self.put_configuration_set_delivery_options()
            .configuration_set_name(name)
            .set_tls_policy(options.tls_policy.as_deref().map(types::TlsPolicy::from))
            .set_sending_pool_name(options.sending_pool_name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn put_reputation_options(
        &self,
        name: &str,
        options: ReputationOptions,
    ) -> Result<(), AwsError> {
        self.put_configuration_set_reputation_options()
            .configuration_set_name(name)
            .set_reputation_metrics_enabled(options.reputation_metrics_enabled)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn put_sending_options(
        &self,
        name: &str,
        options: SendingOptions,
    ) -> Result<(), AwsError> {
        self.put_configuration_set_sending_options()
            .configuration_set_name(name)
            .set_sending_enabled(options.sending_enabled)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn put_suppression_options(
        &self,
        name: &str,
        options: SuppressionOptions,
    ) -> Result<(), AwsError> {
        self.put_configuration_set_suppression_options()
            .configuration_set_name(name)
            .set_suppressed_reasons(Some(sdk_suppressed_reasons(&options)))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn put_tracking_options(
        &self,
        name: &str,
        options: TrackingOptions,
    ) -> Result<(), AwsError> {
        self.put_configuration_set_tracking_options()
            .configuration_set_name(name)
            .set_custom_redirect_domain(options.custom_redirect_domain)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }

    async fn delete_configuration_set(&self, name: &str) -> Result<(), AwsError> {
        self.delete_configuration_set()
            .configuration_set_name(name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND_CODES))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sesv2::operation::get_configuration_set::GetConfigurationSetOutput;

    #[test]
    fn observation_from_get_configuration_set() {
        let output = GetConfigurationSetOutput::builder()
            .configuration_set_name("marketing")
            .delivery_options(
                types::DeliveryOptions::builder()
                    .tls_policy(types::TlsPolicy::Require)
                    .sending_pool_name("pool")
                    .build(),
            )
            .sending_options(types::SendingOptions::builder().sending_enabled(true).build())
            .suppression_options(
                types::SuppressionOptions::builder()
                    .suppressed_reasons(types::SuppressionListReason::Bounce)
                    .build(),
            )
            .tags(types::Tag::builder().key("team").value("growth").build().unwrap())
            .build();

        let obs = generate_configuration_set_observation(&output);
        let delivery = obs.delivery_options.unwrap();
        assert_eq!(delivery.tls_policy.as_deref(), Some("REQUIRE"));
        assert_eq!(delivery.sending_pool_name.as_deref(), Some("pool"));
        assert_eq!(obs.sending_options.unwrap().sending_enabled, Some(true));
        assert_eq!(obs.suppression_options.unwrap().suppressed_reasons, vec!["BOUNCE"]);
        assert!(obs.reputation_options.is_none());
        assert!(obs.tracking_options.is_none());
        assert_eq!(obs.tags, vec![Tag::new("team", "growth")]);
    }
}
