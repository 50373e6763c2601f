//! Tower middleware that rewrites the request query before calling the next
//! service.

use crate::modification::QueryModification;
use http::Request;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer wrapping services with a [`QueryModification`].
#[derive(Debug, Clone)]
pub struct QueryModificationLayer {
    modification: Arc<QueryModification>,
}

impl QueryModificationLayer {
    pub fn new(modification: QueryModification) -> Self {
        Self::from_shared(Arc::new(modification))
    }

    /// Share an existing engine between several layers.
    pub fn from_shared(modification: Arc<QueryModification>) -> Self {
        Self { modification }
    }
}

impl<S> Layer<S> for QueryModificationLayer {
    type Service = QueryModificationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        QueryModificationService {
            inner,
            modification: Arc::clone(&self.modification),
        }
    }
}

/// Service that rewrites the query and always forwards to the inner service.
#[derive(Debug, Clone)]
pub struct QueryModificationService<S> {
    inner: S,
    modification: Arc<QueryModification>,
}

impl<S> QueryModificationService<S> {
    pub fn modification(&self) -> &QueryModification {
        &self.modification
    }
}

impl<S, B> Service<Request<B>> for QueryModificationService<S>
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
        self.modification.apply(&mut req);
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryModificationConfig;
    use http::Uri;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceBuilder, ServiceExt};

    fn echo_uri() -> impl Service<Request<()>, Response = Uri, Error = Infallible> + Clone {
        service_fn(|req: Request<()>| async move { Ok::<_, Infallible>(req.uri().clone()) })
    }

    #[tokio::test]
    async fn test_forwards_rewritten_request() {
        let modification = QueryModification::new(
            "test",
            &QueryModificationConfig::delete().with_param_name("paramtodelete"),
        )
        .unwrap();

        let svc = ServiceBuilder::new()
            .layer(QueryModificationLayer::new(modification))
            .service(echo_uri());

        let req = Request::builder()
            .uri("/items?otherparam=stillhere&paramtodelete=away")
            .body(())
            .unwrap();
        let uri = svc.oneshot(req).await.unwrap();
        assert_eq!(uri.to_string(), "/items?otherparam=stillhere");
    }

    #[tokio::test]
    async fn test_forwards_when_nothing_matches() {
        let modification = QueryModification::new(
            "test",
            &QueryModificationConfig::modify("c").with_param_name("a"),
        )
        .unwrap();

        let svc = QueryModificationLayer::new(modification).layer(echo_uri());
        let req = Request::builder().uri("/x?d=b").body(()).unwrap();
        let uri = svc.oneshot(req).await.unwrap();
        assert_eq!(uri.to_string(), "/x?d=b");
    }

    #[tokio::test]
    async fn test_inner_errors_pass_through() {
        let modification =
            QueryModification::new("test", &QueryModificationConfig::add("a", "b")).unwrap();
        let failing = service_fn(|_req: Request<()>| async { Err::<(), _>("inner failure") });

        let svc = QueryModificationLayer::new(modification).layer(failing);
        let req = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(svc.oneshot(req).await.unwrap_err(), "inner failure");
    }

    #[test]
    fn test_layers_share_engine() {
        let shared = Arc::new(
            QueryModification::new("shared", &QueryModificationConfig::add("a", "b")).unwrap(),
        );
        let layer = QueryModificationLayer::from_shared(Arc::clone(&shared));
        let first = layer.layer(echo_uri());
        let second = layer.layer(echo_uri());

        assert_eq!(first.modification().name(), "shared");
        assert!(std::ptr::eq(first.modification(), second.modification()));
        assert_eq!(Arc::strong_count(&shared), 4);
    }
}
