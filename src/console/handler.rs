use log::{error, info};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::console::parser::{ConsoleCommand, parse_command};
use crate::error::{SftpError, StatusCode};
use crate::gateway::{AccessGateway, Response};
use crate::storage::EntryInfo;

const MAX_COMMAND_LENGTH: usize = 4096;

/// Drive a session from a line-oriented reader until EOF or `quit`.
///
/// - One request per line, answered with `OK ...` or `ERR <code> <message>`.
/// - `get` prints the file content after the header line.
/// - `list` and `stat` print one tab-separated line per entry.
pub async fn run_console<R, W>(reader: R, mut writer: W, gateway: &AccessGateway) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let identity = gateway.session().identity().to_string();

    while let Some(line) = lines.next_line().await? {
        if line.len() > MAX_COMMAND_LENGTH {
            writer
                .write_all(status_line(StatusCode::BadMessage, "command too long").as_bytes())
                .await?;
            continue;
        }

        let (request, payload) = match parse_command(&line) {
            ConsoleCommand::Quit => {
                info!("[{}] console session closed", identity);
                break;
            }
            ConsoleCommand::Empty => continue,
            ConsoleCommand::Invalid(msg) => {
                writer
                    .write_all(status_line(StatusCode::BadMessage, &msg).as_bytes())
                    .await?;
                continue;
            }
            ConsoleCommand::Request { request, payload } => (request, payload),
        };

        let reply = match gateway.dispatch(request).await {
            Ok(response) => render(response, payload.as_deref(), &identity),
            Err(e) => error_line(e),
        };
        writer.write_all(reply.as_bytes()).await?;
        writer.flush().await?;
    }

    writer.flush().await
}

fn render(response: Response, payload: Option<&str>, identity: &str) -> String {
    match response {
        Response::Reader(reader) => match reader.read_to_end_at(0) {
            Ok(content) => format!(
                "OK {}\n{}\n",
                content.len(),
                String::from_utf8_lossy(&content)
            ),
            Err(e) => {
                error!("[{}] error streaming file content: {}", identity, e);
                error_line(SftpError::Failure)
            }
        },
        Response::Writer(writer) => {
            let data = payload.unwrap_or("").as_bytes();
            match writer.write_all_at(data, 0) {
                Ok(()) => format!("OK {}\n", data.len()),
                Err(e) => {
                    error!("[{}] error writing file content: {}", identity, e);
                    error_line(SftpError::Failure)
                }
            }
        }
        Response::Entries(entries) => {
            let mut out = format!("OK {}\n", entries.len());
            for entry in &entries {
                out.push_str(&entry_line(entry));
            }
            out
        }
        Response::Command(_) => "OK\n".to_string(),
    }
}

fn entry_line(entry: &EntryInfo) -> String {
    format!(
        "{}\t{}\t{:o}\t{}\t{}\n",
        entry.name,
        entry.size,
        entry.perm(),
        entry.modified,
        if entry.is_dir { "d" } else { "-" }
    )
}

fn error_line(err: SftpError) -> String {
    status_line(err.status_code(), &err.to_string())
}

fn status_line(code: StatusCode, message: &str) -> String {
    format!("ERR {} {}\n", code.code(), message)
}
