//! Attaches a [`Negotiator`] to every request passing through a service

use std::{
    sync::Arc,
    task::{Context, Poll},
};

use hyper::Request;
use tower_layer::Layer;
use tower_service::Service;

use crate::{
    config::NegotiatorConfig,
    negotiator::Negotiator,
    registry::{DecoderRegistry, EncoderRegistry},
};

/// Layer that scopes a set of registries to the services it wraps
///
/// Handlers behind it can call the free [`bind`](crate::bind) and
/// [`write`](crate::write) functions and get this layer's registries instead
/// of the process-wide defaults.
#[derive(Clone, Debug)]
pub struct NegotiationLayer {
    negotiator: Arc<Negotiator>,
}

impl NegotiationLayer {
    /// Create a new layer from a negotiator
    pub fn new(negotiator: Negotiator) -> Self {
        Self {
            negotiator: Arc::new(negotiator),
        }
    }

    /// Create a new layer over the given registries
    pub fn with_registries(decoders: DecoderRegistry, encoders: EncoderRegistry) -> Self {
        Self::new(Negotiator::new(decoders, encoders))
    }

    /// Set the negotiator configuration
    pub fn with_config(self, config: NegotiatorConfig) -> Self {
        let negotiator = Negotiator::clone(&self.negotiator).with_config(config);
        Self::new(negotiator)
    }

    /// The negotiator attached to requests
    pub fn negotiator(&self) -> &Arc<Negotiator> {
        &self.negotiator
    }
}

impl Default for NegotiationLayer {
    fn default() -> Self {
        Self::new(Negotiator::default())
    }
}

impl<S> Layer<S> for NegotiationLayer {
    type Service = NegotiationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        NegotiationService {
            inner,
            negotiator: self.negotiator.clone(),
        }
    }
}

/// Service that inserts an `Arc<Negotiator>` into request extensions
#[derive(Clone, Debug)]
pub struct NegotiationService<S> {
    inner: S,
    negotiator: Arc<Negotiator>,
}

impl<S, B> Service<Request<B>> for NegotiationService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.negotiator.clone());
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http_body_util::Full;
    use hyper::{body::Bytes, header::ACCEPT};
    use tower::{service_fn, ServiceBuilder, ServiceExt};

    use super::*;
    use crate::{codec::YamlFormat, exchange::ResponseSink};

    #[tokio::test]
    async fn test_layer_attaches_negotiator() {
        let layer = NegotiationLayer::with_registries(
            DecoderRegistry::new(),
            EncoderRegistry::new().with("", YamlFormat),
        );
        let expected = layer.negotiator().clone();

        let service = ServiceBuilder::new()
            .layer(layer)
            .service(service_fn(move |req: Request<Full<Bytes>>| {
                let expected = expected.clone();
                async move {
                    let (parts, _) = req.into_parts();
                    let attached = Negotiator::for_request(&parts);
                    assert!(Arc::ptr_eq(&attached, &expected));

                    let mut sink = ResponseSink::new();
                    crate::write(&mut sink, &parts, &vec![1, 2]).unwrap();
                    Ok::<_, Infallible>(sink)
                }
            }));

        let request = Request::builder()
            .header(ACCEPT, "text/html")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let sink = service.oneshot(request).await.unwrap();

        // The empty token matches any Accept header
        assert_eq!(sink.body(), b"- 1\n- 2\n");
        assert_eq!(sink.content_type(), Some("text/yaml"));
    }

    #[test]
    fn test_with_config() {
        let layer = NegotiationLayer::default()
            .with_config(NegotiatorConfig::new().with_max_body_size(16));
        assert_eq!(layer.negotiator().config().max_body_size, Some(16));
        assert_eq!(layer.negotiator().encoders().len(), 3);
    }
}
