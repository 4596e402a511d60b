/*!
 * Device enrollment command
 */

use anyhow::{Context, Result};
use colored::*;
use iotid_crypto::ASSERTION_MEDIA_TYPE;
use reqwest::{header::CONTENT_TYPE, Method};
use std::path::Path;

use super::{device::print_device, ApiClient};
use crate::types::EnrollResponse;

/// POST the model and serial assertions in `path` to the enrollment API
pub async fn enroll(client: &ApiClient, path: &Path, show_credentials: bool) -> Result<()> {
    println!("{}", "=== Enrolling Device ===".bold().cyan());

    let body = std::fs::read(path)
        .with_context(|| format!("Failed to read assertions from {}", path.display()))?;

    let response: EnrollResponse = client
        .send_json(
            client
                .request(Method::POST, "/v1/device/enroll")
                .header(CONTENT_TYPE, ASSERTION_MEDIA_TYPE)
                .body(body),
        )
        .await?;

    println!("{}", "✓ Device enrolled".green().bold());
    println!("  Organization: {} ({})", response.organization.name, response.organization.id);
    println!();
    print_device(&response.device, show_credentials);
    if show_credentials {
        println!("{}", response.organization.root_cert);
    }
    Ok(())
}
