//! Console front-end for the watch session core.
//!
//! Stands in for the out-of-scope UI layer: scan for the watch, pick a
//! device, browse the readable characteristics and read them.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use gshock_link::core::bluetooth::{
    BluetoothManager, ReadOutcome, UUID_BATTERY_LEVEL, UUID_BATTERY_SERVICE, UUID_DEVICE_NAME,
    UUID_DEVICE_INFORMATION_SERVICE, UUID_GENERIC_ACCESS_SERVICE, UUID_MANUFACTURER_NAME,
    UUID_MODEL_NUMBER, WATCH_NAME,
};
use uuid::Uuid;

/// Friendly label for well-known GATT UUIDs
fn known_label(uuid_str: &str) -> Option<&'static str> {
    let uuid: Uuid = uuid_str.parse().ok()?;
    Some(match uuid {
        u if u == UUID_GENERIC_ACCESS_SERVICE => "Generic Access",
        u if u == UUID_DEVICE_INFORMATION_SERVICE => "Device Information",
        u if u == UUID_BATTERY_SERVICE => "Battery",
        u if u == UUID_DEVICE_NAME => "Device Name",
        u if u == UUID_MANUFACTURER_NAME => "Manufacturer Name",
        u if u == UUID_MODEL_NUMBER => "Model Number",
        u if u == UUID_BATTERY_LEVEL => "Battery Level",
        _ => return None,
    })
}

fn labelled(uuid_str: &str) -> String {
    match known_label(uuid_str) {
        Some(label) => format!("{uuid_str} ({label})"),
        None => uuid_str.to_string(),
    }
}

fn prompt(text: &str) -> Result<String> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    gshock_link::logging::init();

    let mut manager = BluetoothManager::with_default_adapter().await?;

    if !manager.request_permissions().await {
        eprintln!("Bluetooth permissions were not granted.");
        return Ok(());
    }

    manager.scan_for_peripherals().await;
    println!("Scanning for \"{WATCH_NAME}\"...");

    let device = loop {
        let input = prompt("Press Enter to list devices (q to quit): ")?;
        if input == "q" {
            manager.stop_scan().await;
            return Ok(());
        }

        let devices = manager.discovered_devices();
        if devices.is_empty() {
            println!("No matching devices yet.");
            continue;
        }
        for (i, device) in devices.iter().enumerate() {
            println!("  [{i}] {} ({}) RSSI: {:?}", device.name, device.id, device.rssi);
        }

        let choice = prompt("Device to connect to (index, Enter to rescan): ")?;
        if let Ok(index) = choice.parse::<usize>() {
            if let Some(device) = devices.get(index) {
                break device.clone();
            }
            println!("No device at index {index}.");
        }
    };

    manager.connect_to_device(&device).await;
    if manager.connected_device().is_none() {
        eprintln!("Failed to connect to {}.", device.name);
        manager.stop_scan().await;
        return Ok(());
    }

    let catalog = manager.readable_characteristics();
    println!(
        "Connected to {}. {} readable characteristic(s):",
        device.name,
        catalog.len()
    );
    for (i, entry) in catalog.iter().enumerate() {
        println!(
            "  [{i}] service {} characteristic {}",
            labelled(&entry.service),
            labelled(&entry.characteristic)
        );
    }

    loop {
        let choice = prompt("Characteristic to read (index, q to quit): ")?;
        if choice == "q" {
            break;
        }
        let Ok(index) = choice.parse::<usize>() else {
            continue;
        };
        let Some(entry) = catalog.get(index) else {
            println!("No characteristic at index {index}.");
            continue;
        };

        match manager
            .read_characteristic(&entry.service, &entry.characteristic)
            .await
        {
            ReadOutcome::Value(text) => println!("  value: {text}"),
            ReadOutcome::ValueAbsent => println!("  (no value)"),
            ReadOutcome::Failed => println!("  (read failed, see log)"),
        }
    }

    manager.disconnect_from_device().await;
    Ok(())
}
