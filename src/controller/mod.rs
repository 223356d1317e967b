use crate::managed::{self, Data, Managed};
use futures::StreamExt;
use kube::runtime::events::Reporter;
use kube::runtime::{watcher, Controller};
use kube::Api;
use std::sync::Arc;
use tracing::{info, warn};

pub mod database;
pub mod iam;
pub mod sesv2;

/// Name under which a kind's controller reports events,
/// e.g. `managed/emailtemplate.sesv2.aws.crossplane.io`.
pub fn controller_name<K: Managed>() -> String {
    format!("managed/{}.{}", K::kind(&()).to_lowercase(), K::group(&()))
}

pub fn reporter<K: Managed>() -> Reporter {
    Reporter {
        controller: controller_name::<K>(),
        instance: std::env::var("POD_NAME").ok(),
    }
}

/// Runs the managed reconciler for one kind until a shutdown signal arrives.
pub async fn run<K: Managed>(data: Data<K>) {
    let api = Api::<K>::all(data.client.clone());
    info!("starting controller {}", controller_name::<K>());

    Controller::new(api, watcher::Config::default())
        .shutdown_on_signal()
        .run(managed::reconcile, managed::error_policy, Arc::new(data))
        .for_each(|res| async move {
            match res {
                Ok(o) => info!("reconciled {}", o.0.name),
                Err(e) => warn!("reconciliation error: {:?}", e),
            }
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::database::RdsInstance;
    use crate::apis::iam::ServiceLinkedRole;

    #[test]
    fn controller_names() {
        assert_eq!(
            controller_name::<RdsInstance>(),
            "managed/rdsinstance.database.aws.crossplane.io"
        );
        assert_eq!(
            controller_name::<ServiceLinkedRole>(),
            "managed/servicelinkedrole.iam.aws.crossplane.io"
        );
    }
}
