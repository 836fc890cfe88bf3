//! Resolve AWS credentials through a prioritized provider chain and identify
//! the account that owns them.

pub mod account;
pub mod aws;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod creds;
pub mod environment;
pub mod metadata;

pub use account::{AccountInfo, get_account_info};
pub use creds::{CredentialChain, Credentials, build_chain};
