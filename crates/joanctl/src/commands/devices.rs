//! Device command handlers.

use tabled::Tabled;
use tracing::warn;

use joan_api::{Device, VisionectClient};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Rotation")]
    rotation: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        let status = d.status.as_ref();
        Self {
            uuid: d.uuid.clone(),
            name: d.name().unwrap_or("-").to_owned(),
            battery: status
                .and_then(|s| s.battery)
                .map_or_else(|| "-".into(), |b| format!("{b}%")),
            ip: status
                .and_then(|s| s.ip_address.clone())
                .unwrap_or_else(|| "-".into()),
            rotation: d
                .displays
                .first()
                .map_or_else(|| "-".into(), |disp| disp.rotation.to_string()),
        }
    }
}

fn detail(d: &Device) -> String {
    let status = d.status.as_ref();
    [
        format!("UUID:     {}", d.uuid),
        format!("Name:     {}", d.name().unwrap_or("-")),
        format!(
            "Battery:  {}",
            status
                .and_then(|s| s.battery)
                .map_or_else(|| "-".into(), |b| format!("{b}%"))
        ),
        format!(
            "Voltage:  {}",
            status
                .and_then(|s| s.battery_voltage)
                .map_or_else(|| "-".into(), |v| format!("{v}"))
        ),
        format!(
            "IP:       {}",
            status
                .and_then(|s| s.ip_address.as_deref())
                .unwrap_or("-")
        ),
        format!(
            "Rotation: {}",
            d.displays
                .first()
                .map_or_else(|| "-".into(), |disp| disp.rotation.to_string())
        ),
        format!("Displays: {}", d.displays.len()),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &VisionectClient,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let devices = client.get_all_devices().await?;
            let rendered = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.uuid.clone(),
            );
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        DevicesCommand::Show { uuid } => {
            let device = client
                .get_device(&uuid)
                .await
                .map_err(|e| CliError::from_api(e, Some(&uuid)))?;
            let rendered =
                output::render_single(&global.output, &device, detail, |d| d.uuid.clone());
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        DevicesCommand::Data { uuid } => {
            let data = client
                .get_device_data(&uuid)
                .await
                .map_err(|e| CliError::from_api(e, Some(&uuid)))?;
            let rendered = output::render_single(
                &global.output,
                &data,
                |d| serde_json::to_string_pretty(d).unwrap_or_default(),
                |_| uuid.clone(),
            );
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        DevicesCommand::SetUrl { url, uuids } => {
            // Per-device loop: one failing device must not abort the
            // rest. Failures are reported individually and summarized.
            let total = uuids.len();
            let mut failed = 0usize;

            for uuid in &uuids {
                match client.set_device_url(uuid, &url).await {
                    Ok(()) => {
                        output::print_success(&format!("{uuid}: url set"), global.quiet);
                    }
                    Err(e) => {
                        failed += 1;
                        warn!("{uuid}: {e}");
                        eprintln!("✗ {uuid}: {e}");
                    }
                }
            }

            if failed > 0 {
                return Err(CliError::PartialFailure { failed, total });
            }
            Ok(())
        }

        DevicesCommand::Rotate { uuid, rotation } => {
            if !(0..=3).contains(&rotation) {
                return Err(CliError::Validation {
                    field: "rotation".into(),
                    reason: format!("expected 0-3 quarter turns, got {rotation}"),
                });
            }
            client
                .set_display_rotation(&uuid, rotation)
                .await
                .map_err(|e| CliError::from_api(e, Some(&uuid)))?;
            output::print_success(&format!("{uuid}: rotation set to {rotation}"), global.quiet);
            Ok(())
        }

        DevicesCommand::Reboot { uuids } => {
            if let [uuid] = uuids.as_slice() {
                client
                    .reboot_device(uuid)
                    .await
                    .map_err(|e| CliError::from_api(e, Some(uuid)))?;
            } else {
                client.reboot_devices(&uuids).await?;
            }
            output::print_success(
                &format!("reboot requested for {} device(s)", uuids.len()),
                global.quiet,
            );
            Ok(())
        }

        DevicesCommand::Restart { uuids } => {
            if let [uuid] = uuids.as_slice() {
                client
                    .restart_session(uuid)
                    .await
                    .map_err(|e| CliError::from_api(e, Some(uuid)))?;
            } else {
                client.restart_sessions(&uuids).await?;
            }
            output::print_success(
                &format!("restart requested for {} device(s)", uuids.len()),
                global.quiet,
            );
            Ok(())
        }

        DevicesCommand::ClearCache { uuids } => {
            client.clear_device_caches(&uuids).await?;
            output::print_success(
                &format!("cache cleared for {} device(s)", uuids.len()),
                global.quiet,
            );
            Ok(())
        }

        DevicesCommand::SetOption { uuid, key, value } => {
            client
                .set_device_option(&uuid, &key, &value)
                .await
                .map_err(|e| CliError::from_api(e, Some(&uuid)))?;
            output::print_success(&format!("{uuid}: {key} = {value}"), global.quiet);
            Ok(())
        }

        DevicesCommand::Screenshot { uuid, file } => {
            let bytes = client
                .get_device_screenshot(&uuid)
                .await
                .map_err(|e| CliError::from_api(e, Some(&uuid)))?;
            std::fs::write(&file, bytes)?;
            output::print_success(
                &format!("{uuid}: screenshot saved to {}", file.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}
