//! Check-config command - validates configuration without serving

use crate::config::AppConfig;
use crate::infrastructure::crypto::SecretCipher;
use crate::infrastructure::storage::StorageType;

/// Load configuration and report problems
///
/// Storage is not contacted; only settings are validated.
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    for line in validate(&config)? {
        println!("{}", line);
    }

    Ok(())
}

fn validate(config: &AppConfig) -> anyhow::Result<Vec<String>> {
    let storage = config
        .storage
        .to_storage_config()
        .map_err(anyhow::Error::msg)?;

    let cipher = SecretCipher::new(
        config.security.encryption.master_key.clone(),
        config.security.encryption.kdf_iterations,
    )?;

    if config.security.api_keys.prefix.trim().is_empty() {
        anyhow::bail!("security.api_keys.prefix must not be empty");
    }

    let mut report = vec![
        format!("server: {}:{}", config.server.host, config.server.port),
        format!(
            "storage: {}",
            match storage.storage_type() {
                StorageType::InMemory => "in-memory (data is lost on restart)",
                StorageType::Postgres => "postgres",
            }
        ),
        format!("api key prefix: {}", config.security.api_keys.prefix),
    ];

    report.push(if cipher.is_configured() {
        "encryption: configured".to_string()
    } else {
        "encryption: NOT configured, credential endpoints will fail".to_string()
    });

    Ok(report)
}
