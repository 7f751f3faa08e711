use anyhow::Context;
use gocd_core::{logging, ClientConfig};

fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    logging::init_tracing(config.debug);

    let client = config.connect()?;

    let version = client.version().context("failed to fetch server version")?;
    let user = client
        .current_user()
        .context("failed to fetch current user")?;

    println!(
        "I am {}, GoCD version: {}",
        user.display_name, version.version
    );
    Ok(())
}
