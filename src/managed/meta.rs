use crate::apis::common::Tag;
use crate::managed::Managed;
use crate::Error;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;

pub const ANNOTATION_EXTERNAL_NAME: &str = "crossplane.io/external-name";
pub const FINALIZER: &str = "finalizer.managedresource.crossplane.io";

pub const TAG_KIND: &str = "crossplane-kind";
pub const TAG_NAME: &str = "crossplane-name";
pub const TAG_PROVIDER_CONFIG: &str = "crossplane-providerconfig";

/// Name of the external resource, if one has been recorded.
pub fn external_name<K: Resource>(cr: &K) -> Option<&str> {
    cr.meta()
        .annotations
        .as_ref()
        .and_then(|a| a.get(ANNOTATION_EXTERNAL_NAME))
        .map(String::as_str)
        .filter(|n| !n.is_empty())
}

pub fn required_external_name<K: Resource>(cr: &K) -> Result<&str, Error> {
    external_name(cr).ok_or(Error::MissingField("crossplane.io/external-name annotation"))
}

pub fn set_external_name<K: Resource>(cr: &mut K, name: &str) {
    cr.annotations_mut()
        .insert(ANNOTATION_EXTERNAL_NAME.to_string(), name.to_string());
}

pub fn was_deleted<K: Resource>(cr: &K) -> bool {
    cr.meta().deletion_timestamp.is_some()
}

pub fn has_finalizer<K: Resource>(cr: &K) -> bool {
    cr.finalizers().iter().any(|f| f == FINALIZER)
}

/// Tags identifying the Kubernetes object that owns an external resource.
pub fn external_tags<K: Managed>(cr: &K) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    tags.insert(
        TAG_KIND.to_string(),
        format!("{}.{}", K::kind(&()).to_lowercase(), K::group(&())),
    );
    tags.insert(TAG_NAME.to_string(), cr.name_any());
    if let Some(pc) = cr.provider_config_reference() {
        tags.insert(TAG_PROVIDER_CONFIG.to_string(), pc.name.clone());
    }
    tags
}

/// Merges the external tags of `cr` into `tags`, sorted by key. External tags win.
pub fn add_external_tags<K: Managed>(cr: &K, tags: &[Tag]) -> Vec<Tag> {
    let mut merged: BTreeMap<String, String> = tags
        .iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect();
    merged.extend(external_tags(cr));
    merged.into_iter().map(|(key, value)| Tag { key, value }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::common::{Reference, ResourceSpec};
    use crate::apis::sesv2::{ConfigurationSet, ConfigurationSetParameters, ConfigurationSetSpec};

    fn configuration_set() -> ConfigurationSet {
        ConfigurationSet::new(
            "marketing",
            ConfigurationSetSpec {
                resource_spec: ResourceSpec {
                    provider_config_ref: Some(Reference { name: "example".into() }),
                    ..Default::default()
                },
                for_provider: ConfigurationSetParameters {
                    region: "us-east-1".into(),
                    ..Default::default()
                },
            },
        )
    }

    #[test]
    fn external_name_round_trip() {
        let mut cr = configuration_set();
        assert_eq!(external_name(&cr), None);
        assert!(required_external_name(&cr).is_err());

        set_external_name(&mut cr, "marketing-prod");
        assert_eq!(external_name(&cr), Some("marketing-prod"));
    }

    #[test]
    fn empty_external_name_is_absent() {
        let mut cr = configuration_set();
        set_external_name(&mut cr, "");
        assert_eq!(external_name(&cr), None);
    }

    #[test]
    fn external_tags_identify_object() {
        let tags = external_tags(&configuration_set());
        assert_eq!(
            tags.get(TAG_KIND).map(String::as_str),
            Some("configurationset.sesv2.aws.crossplane.io")
        );
        assert_eq!(tags.get(TAG_NAME).map(String::as_str), Some("marketing"));
        assert_eq!(tags.get(TAG_PROVIDER_CONFIG).map(String::as_str), Some("example"));
    }

    #[test]
    fn add_external_tags_merges_and_sorts() {
        let cr = configuration_set();
        let tags = add_external_tags(
            &cr,
            &[Tag::new("team", "growth"), Tag::new(TAG_NAME, "stale")],
        );
        let keys: Vec<_> = tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec![TAG_KIND, TAG_NAME, TAG_PROVIDER_CONFIG, "team"]);
        assert_eq!(tags[1].value, "marketing");
    }
}
