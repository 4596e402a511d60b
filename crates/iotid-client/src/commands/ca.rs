/*!
 * Platform CA bootstrap
 */

use anyhow::{Context, Result};
use colored::*;
use iotid_crypto::{CertificateAuthority, CA_CERT_FILE, CA_KEY_FILE};
use std::{fs::OpenOptions, io::Write, path::Path};

/// Write a fresh self-signed CA into `dir` for development setups
pub fn init_ca(dir: &Path, common_name: &str, force: bool) -> Result<()> {
    let cert_path = dir.join(CA_CERT_FILE);
    let key_path = dir.join(CA_KEY_FILE);

    if !force && (cert_path.exists() || key_path.exists()) {
        anyhow::bail!(
            "{} already holds a CA; pass --force to replace it",
            dir.display()
        );
    }

    let (cert_pem, key_pem) = CertificateAuthority::create_self_signed(common_name)?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&cert_path, cert_pem)
        .with_context(|| format!("Failed to write {}", cert_path.display()))?;
    write_private_file(&key_path, key_pem.as_bytes())
        .with_context(|| format!("Failed to write {}", key_path.display()))?;

    println!("{}", "✓ Platform CA created".green().bold());
    println!("  Certificate: {}", cert_path.display());
    println!("  Private Key: {}", key_path.display());
    println!(
        "\n{}",
        "Use this CA for development only; production CAs should be provisioned offline."
            .dimmed()
    );
    Ok(())
}

/// Create `path` readable by the owner only; an existing file is replaced
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
