use provider_aws::apis;

fn main() -> anyhow::Result<()> {
    for crd in apis::crds() {
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
