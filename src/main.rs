use futures::future::join_all;
use futures::FutureExt;
use kube::Client;
use provider_aws::controller::database::rdsinstance;
use provider_aws::controller::iam::servicelinkedrole;
use provider_aws::controller::sesv2::{configurationset, emailtemplate};
use provider_aws::Config;
use std::fs::File;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let client = Client::try_default().await?;

    let config = if let Ok(config_filename) = std::env::var("CONFIG") {
        serde_yaml::from_reader(File::open(config_filename)?)?
    } else {
        Config::default()
    };
    let options = config.options();

    let mut futures = vec![];

    if config.rds_instance.enabled {
        futures.push(rdsinstance::setup(client.clone(), options.clone()).boxed());
    }

    if config.service_linked_role.enabled {
        futures.push(servicelinkedrole::setup(client.clone(), options.clone()).boxed());
    }

    if config.configuration_set.enabled {
        futures.push(configurationset::setup(client.clone(), options.clone()).boxed());
    }

    if config.email_template.enabled {
        futures.push(emailtemplate::setup(client.clone(), options.clone()).boxed());
    }

    if futures.is_empty() {
        warn!("all controllers are disabled");
    }
    info!("running {} controller(s)", futures.len());

    join_all(futures).await;

    Ok(())
}
