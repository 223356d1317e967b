use crate::apis::common::Tag;
use std::collections::BTreeMap;

pub mod configurationset;
pub mod emailtemplate;
#[cfg(test)]
mod fake;

/// Whether desired and observed tags hold the same key/value pairs, ignoring order.
pub fn are_tags_up_to_date(spec: &[Tag], observed: &[Tag]) -> bool {
    let as_map = |tags: &[Tag]| {
        tags.iter()
            .map(|t| (t.key.clone(), t.value.clone()))
            .collect::<BTreeMap<_, _>>()
    };
    as_map(spec) == as_map(observed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_compare_as_maps() {
        let spec = vec![Tag::new("a", "1"), Tag::new("b", "2")];
        assert!(are_tags_up_to_date(&spec, &[Tag::new("b", "2"), Tag::new("a", "1")]));
        assert!(!are_tags_up_to_date(&spec, &[Tag::new("a", "1")]));
        assert!(!are_tags_up_to_date(&spec, &[Tag::new("a", "1"), Tag::new("b", "3")]));
        assert!(are_tags_up_to_date(&[], &[]));
    }
}
