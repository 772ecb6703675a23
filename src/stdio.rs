// stdio channel - one json request per line in, one json response per line out

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::{Dispatcher, Error, Request, Response};

pub async fn run(dispatcher: Dispatcher) -> Result<(), Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    tracing::info!("stdio channel ready");

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| Error::Server(e.to_string()))?
    {
        let Some(response) = handle_line(&dispatcher, &line).await else {
            continue;
        };

        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        stdout
            .write_all(encoded.as_bytes())
            .await
            .map_err(|e| Error::Server(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| Error::Server(e.to_string()))?;
    }

    tracing::debug!("stdin closed, shutting down");
    Ok(())
}

/// One line in, at most one response out. Blank lines produce nothing;
/// unparseable lines and dispatch failures produce a failure response
/// instead of tearing the loop down.
pub async fn handle_line(dispatcher: &Dispatcher, line: &str) -> Option<Response> {
    if line.trim().is_empty() {
        return None;
    }

    Some(match serde_json::from_str::<Request>(line) {
        Ok(request) => match dispatcher.dispatch(&request).await {
            Ok(response) => response,
            Err(e) => Response::failure(&request.command, &e),
        },
        Err(e) => Response::failure("", &Error::BadRequest(format!("bad request line: {e}"))),
    })
}
