//! Console feed: turns stdin lines into recognition events
//!
//! One event per line. Lines beginning with `{` are parsed as JSON
//! [`RecognitionEvent`]s, which lets recorded event logs be replayed
//! verbatim (including failures and empty-text results); any other
//! non-blank line becomes a successful text event. EOF ends the feed, not
//! the daemon.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::recognition::{RecognitionEvent, RecognitionSource};

/// Read stdin until EOF, pushing one event per line.
pub async fn run(source: RecognitionSource) {
    feed_lines(BufReader::new(tokio::io::stdin()), &source).await;
    info!("stdin feed ended");
}

async fn feed_lines<R: AsyncBufRead + Unpin>(reader: R, source: &RecognitionSource) {
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => push_line(&line, source),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "feed read failed");
                break;
            }
        }
    }
}

fn push_line(line: &str, source: &RecognitionSource) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return;
    }
    let event = if trimmed.starts_with('{') {
        match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, line = %trimmed, "skipping unparseable event line");
                return;
            }
        }
    } else {
        RecognitionEvent::text(line)
    };
    if !source.push(event) {
        debug!(line = %trimmed, "feed event not delivered");
    }
}
