use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::account::get_account_info;
use crate::aws::{IamApi, StsApi};
use crate::config::Config;
use crate::creds::build_chain;
use crate::environment::EnvSnapshot;
use crate::metadata::MetadataClient;

#[derive(Debug, Clone, Args)]
pub struct AccountCommand {
    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
}

impl AccountCommand {
    pub async fn execute(self, config: &Config) -> Result<()> {
        let env = EnvSnapshot::capture();

        let mut chain = build_chain(config, &env).await?;
        let credentials = chain.resolve().await?;
        info!("credentials resolved from the {} provider", credentials.source);

        let identity = IamApi::new(&credentials, config.region.as_deref());
        let tokens = StsApi::new(&credentials, config.region.as_deref());
        let metadata = MetadataClient::new(&env)?;

        let account = get_account_info(&identity, &tokens, &metadata, credentials.source)
            .await
            .context("failed to identify the owning account")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&account)?);
        } else {
            println!("partition:  {}", account.partition);
            println!("account id: {}", account.account_id);
        }

        Ok(())
    }
}
