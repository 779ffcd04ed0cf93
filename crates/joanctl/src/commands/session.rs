//! Session command handlers.

use joan_api::{Session, VisionectClient};

use crate::cli::{GlobalOpts, SessionArgs, SessionCommand};
use crate::error::CliError;
use crate::output;

fn detail(s: &Session) -> String {
    [
        format!("UUID:    {}", s.uuid),
        format!("Backend: {}", s.backend.name),
        format!(
            "URL:     {}",
            s.backend
                .fields
                .get("url")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("-")
        ),
        format!(
            "Options: {}",
            serde_json::to_string(&s.options).unwrap_or_default()
        ),
    ]
    .join("\n")
}

pub async fn handle(
    client: &VisionectClient,
    args: SessionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SessionCommand::Show { uuid } => {
            let session = client
                .get_session(&uuid)
                .await
                .map_err(|e| CliError::from_api(e, Some(&uuid)))?;
            let rendered =
                output::render_single(&global.output, &session, detail, |s| s.uuid.clone());
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        SessionCommand::Restart { uuids } => {
            if let [uuid] = uuids.as_slice() {
                client
                    .restart_session(uuid)
                    .await
                    .map_err(|e| CliError::from_api(e, Some(uuid)))?;
            } else {
                client.restart_sessions(&uuids).await?;
            }
            output::print_success(
                &format!("restart requested for {} session(s)", uuids.len()),
                global.quiet,
            );
            Ok(())
        }

        SessionCommand::SetOptions {
            uuid,
            encoding,
            dithering,
        } => {
            if encoding.is_none() && dithering.is_none() {
                return Err(CliError::Validation {
                    field: "options".into(),
                    reason: "pass --encoding and/or --dithering".into(),
                });
            }
            client
                .set_session_options(&uuid, encoding.as_deref(), dithering.as_deref())
                .await
                .map_err(|e| CliError::from_api(e, Some(&uuid)))?;
            output::print_success(&format!("{uuid}: session options updated"), global.quiet);
            Ok(())
        }
    }
}
