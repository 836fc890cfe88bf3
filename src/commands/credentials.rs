use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::creds::build_chain;
use crate::environment::EnvSnapshot;

#[derive(Debug, Clone, Args)]
pub struct CredentialsCommand {}

impl CredentialsCommand {
    pub async fn execute(self, config: &Config) -> Result<()> {
        let env = EnvSnapshot::capture();

        let mut chain = build_chain(config, &env).await?;
        let credentials = chain.resolve().await?;

        // The secret never reaches stdout
        println!("source:        {}", credentials.source);
        println!("access key id: {}", credentials.access_key_id);
        println!(
            "session token: {}",
            if credentials.session_token.is_some() {
                "present"
            } else {
                "none"
            }
        );
        match credentials.expiration {
            Some(when) => println!("expires at:    {}", when.to_rfc3339()),
            None => println!("expires at:    never"),
        }

        Ok(())
    }
}
