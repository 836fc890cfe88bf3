mod account;
mod credentials;

pub use account::AccountCommand;
pub use credentials::CredentialsCommand;
