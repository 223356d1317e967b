use crate::clients::AwsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{context}: {source}")]
    Aws {
        context: &'static str,
        #[source]
        source: AwsError,
    },
    #[error("{context}: {source}")]
    Kube {
        context: &'static str,
        #[source]
        source: kube::Error,
    },
    #[error("cannot get provider config: {0}")]
    ProviderConfig(String),
    #[error("object missing {0}")]
    MissingField(&'static str),
}

impl Error {
    pub fn aws(context: &'static str, source: AwsError) -> Self {
        Error::Aws { context, source }
    }

    pub fn kube(context: &'static str, source: kube::Error) -> Self {
        Error::Kube { context, source }
    }

    /// Whether the error means the external resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Aws { source, .. } if source.is_not_found())
    }
}
