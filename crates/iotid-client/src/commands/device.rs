/*!
 * Device management commands
 */

use anyhow::{Context, Result};
use colored::*;
use reqwest::Method;
use uuid::Uuid;

use super::ApiClient;
use crate::types::{
    status_name, CreatedResponse, DeviceInfo, ListDevicesResponse, UpdateDeviceRequest,
};

pub struct NewDevice<'a> {
    pub organization: &'a str,
    pub brand: &'a str,
    pub model: &'a str,
    pub serial_number: &'a str,
    pub device_data: &'a str,
}

pub async fn register_device(client: &ApiClient, device: NewDevice<'_>) -> Result<()> {
    println!("{}", "=== Registering Device ===".bold().cyan());

    let response: CreatedResponse = client
        .send_json(
            client
                .request(Method::POST, "/v1/device")
                .json(&serde_json::json!({
                    "organizationId": device.organization,
                    "brand": device.brand,
                    "model": device.model,
                    "serialNumber": device.serial_number,
                    "deviceData": device.device_data,
                })),
        )
        .await?;

    println!("{}", "✓ Device registered".green().bold());
    println!("  ID: {}", response.id);
    println!(
        "  Device: {}/{} {}",
        device.brand, device.model, device.serial_number
    );
    println!("  Status: {}", status_name(1).yellow());
    Ok(())
}

pub async fn list_devices(client: &ApiClient, org_ref: &str) -> Result<()> {
    let response: ListDevicesResponse = client
        .send_json(client.request(Method::GET, &format!("/v1/devices/{}", org_ref)))
        .await?;

    println!(
        "{}",
        format!("✓ Found {} devices", response.devices.len()).green()
    );
    println!();
    for device in &response.devices {
        println!(
            "{}  {}/{} {}  {}",
            device.id,
            device.device.brand,
            device.device.model,
            device.device.serial_number,
            colored_status(device.status)
        );
    }
    Ok(())
}

pub async fn show_device(
    client: &ApiClient,
    org_ref: &str,
    device_ref: &str,
    show_credentials: bool,
) -> Result<()> {
    let device: DeviceInfo = client
        .send_json(client.request(
            Method::GET,
            &format!("/v1/devices/{}/{}", org_ref, device_ref),
        ))
        .await?;

    print_device(&device, show_credentials);
    Ok(())
}

pub async fn update_device(
    client: &ApiClient,
    org_ref: &str,
    device_ref: &str,
    update: UpdateDeviceRequest,
) -> Result<()> {
    client
        .send(
            client
                .request(
                    Method::PUT,
                    &format!("/v1/devices/{}/{}", org_ref, device_ref),
                )
                .json(&update),
        )
        .await?;

    println!("{}", "✓ Device updated".green().bold());
    if let Some(status) = update.status {
        println!("  Status: {}", colored_status(status));
    }
    Ok(())
}

pub async fn delete_device(client: &ApiClient, device_id: &str) -> Result<()> {
    let device_id =
        Uuid::parse_str(device_id).context("Invalid device ID format. Expected UUID.")?;

    let response: CreatedResponse = client
        .send_json(client.request(Method::DELETE, &format!("/v1/device/{}", device_id)))
        .await?;

    println!("{}", "✓ Device deleted".green().bold());
    println!("  ID: {}", response.id);
    Ok(())
}

/// Parse a status given by name or number
pub fn parse_status(value: &str) -> Result<u8> {
    match value.to_lowercase().as_str() {
        "waiting" | "1" => Ok(1),
        "enrolled" | "2" => Ok(2),
        "disabled" | "3" => Ok(3),
        other => anyhow::bail!("Unknown status '{}'. Expected waiting or disabled.", other),
    }
}

pub fn print_device(device: &DeviceInfo, show_credentials: bool) {
    println!(
        "{}",
        format!(
            "{}/{} {}",
            device.device.brand, device.device.model, device.device.serial_number
        )
        .bold()
    );
    println!("  ID: {}", device.id);
    println!("  Organization: {}", device.organization_id);
    println!("  Status: {}", colored_status(device.status));
    if !device.device.store_id.is_empty() {
        println!("  Store: {}", device.device.store_id);
    }
    if !device.device.device_key.is_empty() {
        println!("  Device Key: {}", device.device.device_key);
    }
    if !device.device_data.is_empty() {
        println!("  Device Data: {}", device.device_data);
    }
    println!(
        "  MQTT: {}:{}",
        device.credentials.mqtt_url, device.credentials.mqtt_port
    );
    println!("  Created: {}", device.created_at);

    if show_credentials {
        println!("\n{}", device.credentials.certificate);
        if let Some(private_key) = &device.credentials.private_key {
            println!("{}", private_key);
        }
    }
}

fn colored_status(status: u8) -> ColoredString {
    match status {
        1 => status_name(status).yellow().bold(),
        2 => status_name(status).green().bold(),
        3 => status_name(status).red().bold(),
        _ => status_name(status).dimmed(),
    }
}
