/*!
 * Organization commands
 */

use anyhow::Result;
use colored::*;
use reqwest::Method;

use super::ApiClient;
use crate::types::{CreatedResponse, ListOrganizationsResponse, OrganizationInfo};

pub async fn create_organization(client: &ApiClient, name: &str, country: &str) -> Result<()> {
    println!("{}", "=== Creating Organization ===".bold().cyan());

    let response: CreatedResponse = client
        .send_json(
            client
                .request(Method::POST, "/v1/organization")
                .json(&serde_json::json!({
                    "name": name,
                    "countryName": country,
                })),
        )
        .await?;

    println!("{}", "✓ Organization created".green().bold());
    println!("  ID: {}", response.id);
    println!("  Name: {}", name);
    Ok(())
}

pub async fn list_organizations(client: &ApiClient) -> Result<()> {
    let response: ListOrganizationsResponse = client
        .send_json(client.request(Method::GET, "/v1/organizations"))
        .await?;

    println!(
        "{}",
        format!("✓ Found {} organizations", response.organizations.len()).green()
    );
    println!();
    for organization in &response.organizations {
        println!("{}  {}", organization.id, organization.name.bold());
    }
    Ok(())
}

pub async fn show_organization(client: &ApiClient, org_ref: &str, show_cert: bool) -> Result<()> {
    let organization: OrganizationInfo = client
        .send_json(client.request(Method::GET, &format!("/v1/organization/{}", org_ref)))
        .await?;

    println!("{}", organization.name.bold());
    println!("  ID: {}", organization.id);
    if !organization.country_name.is_empty() {
        println!("  Country: {}", organization.country_name);
    }
    println!("  Created: {}", organization.created_at);
    if show_cert {
        println!("\n{}", organization.root_cert);
    }
    Ok(())
}
