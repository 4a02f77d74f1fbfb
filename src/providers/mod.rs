use log::info;
use reqwest::Url;

use crate::error::{AcmeError, Result};
use crate::provider::AcmeProvider;

mod generic;
mod letsencrypt;
mod pebble;

pub use generic::GenericProvider;
pub use letsencrypt::{LetsEncryptProvider, PRODUCTION_DIRECTORY, STAGING_DIRECTORY};
pub use pebble::PebbleProvider;

fn builtin_providers() -> Vec<(&'static str, Box<dyn AcmeProvider>)> {
    vec![
        ("generic", Box::new(GenericProvider) as Box<dyn AcmeProvider>),
        ("letsencrypt", Box::new(LetsEncryptProvider) as Box<dyn AcmeProvider>),
        ("pebble", Box::new(PebbleProvider::new()) as Box<dyn AcmeProvider>),
    ]
}

/// Picks the built-in provider that accepts `server_uri`.
pub fn find_provider(server_uri: &Url) -> Result<Box<dyn AcmeProvider>> {
    let mut candidates: Vec<(&'static str, Box<dyn AcmeProvider>)> = builtin_providers()
        .into_iter()
        .filter(|(_, provider)| provider.accepts(server_uri))
        .collect();

    match candidates.len() {
        0 => Err(AcmeError::UnsupportedServer(format!(
            "no provider accepts {server_uri}"
        ))),
        1 => {
            let (name, provider) = candidates.remove(0);
            info!("[acme-provider] using {name} provider for {server_uri}");
            Ok(provider)
        }
        _ => {
            let names: Vec<&str> = candidates.iter().map(|(name, _)| *name).collect();
            Err(AcmeError::UnsupportedServer(format!(
                "{server_uri} is accepted by several providers: {}",
                names.join(", ")
            )))
        }
    }
}
