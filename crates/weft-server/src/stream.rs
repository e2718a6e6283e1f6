//! Chunked streaming render.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use thiserror::Error;
use tokio::sync::mpsc;
use weft_core::{Component, PropsMap};
use weft_dom::{escape_attr, to_html, VElement};

use crate::options::RenderOptions;
use crate::render;

/// Terminal failure of a streaming render.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The underlying render failed after the channel was opened.
    #[error("streaming render failed: {0}")]
    Render(String),
}

/// Handle to a chunked render in flight. Yields HTML chunks in document
/// order; after a terminal `Err` chunk no further items are yielded.
pub struct RenderStream {
    rx: mpsc::UnboundedReceiver<Result<String, StreamError>>,
}

impl RenderStream {
    /// Collect the remaining chunks into one string, or the terminal error.
    pub async fn collect_string(mut self) -> Result<String, StreamError> {
        let mut out = String::new();
        while let Some(chunk) = self.rx.recv().await {
            out.push_str(&chunk?);
        }
        Ok(out)
    }
}

impl Stream for RenderStream {
    type Item = Result<String, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Render a component as a chunk stream: the host open tag, the shadow
/// boundary open, one chunk per view child, then the closers.
///
/// The channel is closed once the tree has been fully emitted. A failure
/// after the channel has been opened leaves a terminal error chunk rather
/// than silently truncated output.
pub fn render_to_stream(
    component: Arc<Component>,
    props: PropsMap,
    options: RenderOptions,
) -> RenderStream {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        match render::materialize(&component, props, &options).await {
            Ok(rendered) => {
                let mut chunks = vec![
                    open_tag(&rendered.host),
                    "<template shadowroot=\"open\">".to_string(),
                ];
                chunks.extend(rendered.children.iter().map(to_html));
                chunks.push(format!("</template></{}>", rendered.host.tag));

                for chunk in chunks {
                    // The receiver dropping mid-stream ends the render.
                    if tx.send(Ok(chunk)).is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "streaming render failed");
                let _ = tx.send(Err(StreamError::Render(err.to_string())));
            }
        }
    });

    RenderStream { rx }
}

fn open_tag(el: &VElement) -> String {
    let mut out = format!("<{}", el.tag);
    for (name, value) in &el.attrs {
        if value.is_empty() {
            out.push_str(&format!(" {name}"));
        } else {
            out.push_str(&format!(r#" {name}="{}""#, escape_attr(value)));
        }
    }
    out.push('>');
    out
}
