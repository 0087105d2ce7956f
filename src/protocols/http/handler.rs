//! HTTP echo handler for the Tokio runtime.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use crate::echo::{BodyEncoding, EchoExchange};

/// Upper bound on buffered request-head bytes per connection.
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Serve one HTTP/1.1 connection until the client closes it or a request
/// opts out of keep-alive.
///
/// Framing (`Content-Length`, chunked), `Date`, `100 Continue`, HEAD and
/// malformed-request (`400`) handling come from hyper.
pub async fn handle_connection<S>(stream: S, encoding: BodyEncoding) -> Result<(), hyper::Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    http1::Builder::new()
        .keep_alive(true)
        .max_buf_size(MAX_HEAD_SIZE)
        .serve_connection(
            TokioIo::new(stream),
            service_fn(move |req| echo(req, encoding)),
        )
        .await
}

/// Answer `req` with `200 OK` and a body equal to the request body.
///
/// Body frames are appended to an `EchoExchange` in arrival order; the
/// response is built only once the body has ended.
pub async fn echo<B>(
    req: Request<B>,
    encoding: BodyEncoding,
) -> Result<Response<Full<Bytes>>, Box<dyn std::error::Error + Send + Sync>>
where
    B: Body<Data = Bytes>,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let mut body = std::pin::pin!(req.into_body());
    let mut exchange = EchoExchange::new(encoding);

    while let Some(frame) = body.frame().await {
        // Trailers carry no body bytes
        if let Ok(data) = frame?.into_data() {
            exchange.push_chunk(&data)?;
            trace!(len = data.len(), buffered = exchange.buffered(), "Body chunk");
        }
    }

    let echoed = exchange.finish()?;
    let bytes = echoed.len();
    let response = Response::new(Full::new(echoed));
    exchange.complete()?;

    debug!(
        %method,
        %path,
        bytes,
        chunks = exchange.chunks(),
        "Echoed request body"
    );

    Ok(response)
}
