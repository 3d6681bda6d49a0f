use crate::job::Job;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Drive a WebSocket connection for one job: poll its log buffer at `tick`
/// and forward new lines as text frames. Once the job is terminal and the
/// buffer is fully drained, send a close frame carrying the terminal status
/// as its reason and return.
///
/// This is the full extent of this crate's WebSocket involvement — mounting
/// it behind an actual router path belongs to the host application.
pub async fn serve_log_stream(job: Arc<Job>, mut socket: WebSocket, tick: Duration) {
    let mut offset = 0usize;
    let mut interval = tokio::time::interval(tick);

    loop {
        interval.tick().await;

        let (lines, next_offset) = job.log_since(offset);
        offset = next_offset;

        for line in lines {
            if socket.send(Message::Text(line.into())).await.is_err() {
                debug!(job_id = %job.id, "log stream socket closed by peer");
                return;
            }
        }

        if job.status().is_terminal() && offset >= job.log_len() {
            let reason = job.status().to_string();
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::NORMAL,
                    reason: reason.into(),
                })))
                .await;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn terminal_check_requires_fully_drained_buffer() {
        let job = Job::new("run", "conn-1", Utc::now());
        job.append_log("one");
        job.complete(Utc::now());

        // Offset hasn't caught up yet: the stream must keep sending before
        // it is allowed to close.
        assert!(job.status().is_terminal());
        assert!(job.log_len() > 0);
    }
}
