//! Cloneable handle to a boxed tower service running behind a buffer.

use super::BoxFuture;
use std::{error::Error as StdError, future::Future, task::Poll};
use tower::{buffer::Buffer, util::BoxService, Service, ServiceExt};

const BUFFER_SIZE: usize = 32;

pub struct TowerClient<T, U, E> {
    inner: Buffer<BoxService<T, U, E>, T>,
    worker_error: fn(tower::BoxError) -> E,
}

impl<T, U, E> Clone for TowerClient<T, U, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            worker_error: self.worker_error,
        }
    }
}

impl<T, U, E> TowerClient<T, U, E>
where
    T: Send + 'static,
    U: Send + 'static,
    E: Into<tower::BoxError> + StdError + Send + Sync + 'static,
{
    /// The buffer worker is spawned on the current tokio runtime, if any.
    pub fn from_service<S>(s: S, worker_error: fn(tower::BoxError) -> E) -> Self
    where
        S: Service<T, Response = U, Error = E> + Send + 'static,
        S::Future: Send + 'static,
    {
        let (inner, worker) = Buffer::pair(BoxService::new(s), BUFFER_SIZE);
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                rt.spawn(worker);
            }
            Err(_) => tracing::warn!("no tokio runtime, service worker not started"),
        }
        Self {
            inner,
            worker_error,
        }
    }

    /// A service that fails every request with `error()`.
    pub fn unimplemented<F>(error: F, worker_error: fn(tower::BoxError) -> E) -> Self
    where
        F: Fn() -> E + Send + 'static,
    {
        Self::from_service(
            tower::service_fn(move |_: T| std::future::ready(Err::<U, E>(error()))),
            worker_error,
        )
    }

    pub async fn call_mut(&mut self, req: T) -> Result<U, E> {
        self.ready().await?.call(req).await
    }

    pub async fn call_ref(&self, req: T) -> Result<U, E> {
        self.clone().call_mut(req).await
    }
}

impl<T, U, E> Service<T> for TowerClient<T, U, E>
where
    E: Into<tower::BoxError> + StdError + Send + Sync + 'static,
{
    type Response = U;
    type Error = E;
    type Future = ResponseFuture<U, E>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(self.worker_error)
    }

    fn call(&mut self, req: T) -> Self::Future {
        ResponseFuture {
            fut: self.inner.call(req),
            worker_error: self.worker_error,
        }
    }
}

pin_project_lite::pin_project! {
    pub struct ResponseFuture<U, E> {
        #[pin]
        fut: tower::buffer::future::ResponseFuture<BoxFuture<'static, Result<U, E>>>,
        worker_error: fn(tower::BoxError) -> E,
    }
}

impl<U, E> Future for ResponseFuture<U, E>
where
    E: Into<tower::BoxError> + StdError + Send + Sync + 'static,
{
    type Output = Result<U, E>;

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Self::Output> {
        let result = std::task::ready!(self.as_mut().project().fut.poll(cx));
        // errors of the inner service come back boxed
        Poll::Ready(result.map_err(|boxed| match boxed.downcast::<E>() {
            Ok(error) => *error,
            Err(boxed) => (self.worker_error)(boxed),
        }))
    }
}
