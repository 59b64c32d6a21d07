//! One-shot query entry point.

use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;

use crate::config::LaunchConfig;

use super::{classify, Message, Session, SessionError};

/// Typed messages from one Claude Code run.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Message, SessionError>> + Send>>;

/// Start Claude Code with `config` and stream its typed messages.
///
/// The process is started before this returns. Unrecognized message kinds
/// are skipped. On any failure the process is shut down first and the
/// error is the last item. Dropping the stream early kills the process.
///
/// # Errors
///
/// Returns an error if the executable cannot be found or started.
pub fn query(config: LaunchConfig) -> Result<MessageStream, SessionError> {
    let mut session = Session::new(config);
    session.connect()?;

    Ok(Box::pin(async_stream::stream! {
        let mut failure = None;
        {
            let documents = session.receive_messages();
            futures_util::pin_mut!(documents);
            while let Some(item) = documents.next().await {
                match item.and_then(|doc| classify(doc).map_err(SessionError::from)) {
                    Ok(Some(message)) => yield Ok(message),
                    Ok(None) => {}
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        session.disconnect().await;
        if let Some(e) = failure {
            yield Err(e);
        }
    }))
}
