//! Routing of typed operations to a backend through the interceptor chain.
//!
//! Interceptors run in registration order: the first one registered sees the
//! call first and the result last.
//!
//! ```text
//! execute ─▶ interceptor[0] ─▶ interceptor[1] ─▶ … ─▶ backend handler
//!         ◀─                ◀─                ◀─ … ◀─
//! ```

use crate::backend::FileSystemBackend;
use crate::errno::Errno;
use crate::error::OperationError;
use crate::ids::Fd;
use crate::op::{FileSystemOperation, OperationKind, PathTarget};
use std::fmt;
use std::sync::Arc;

/// A call in flight, as seen by one interceptor.
pub trait InterceptedCall {
    fn operation(&self) -> OperationKind;

    fn input(&self) -> &dyn fmt::Debug;

    /// Path argument of the call, open for rewriting. Changes are seen by the
    /// rest of the chain and the backend. `None` for descriptor operations.
    fn target(&mut self) -> Option<PathTarget<'_>>;

    /// Hand the call to the rest of the chain and return the errno of the
    /// outcome. Calling it again runs the rest of the chain again.
    fn proceed(&mut self) -> Result<(), Errno>;

    /// Successful result, once the call has completed.
    fn output(&self) -> Option<&dyn fmt::Debug>;

    /// Error, once the call has completed with one.
    fn error(&self) -> Option<&dyn fmt::Display>;

    /// Complete the call with `errno` without running the rest of the chain.
    /// An errno the operation does not define becomes `NotImplemented`.
    fn reject(&mut self, errno: Errno, message: String);
}

/// Wraps handler invocation, e.g. to log, jail or rewrite calls.
///
/// An interceptor that neither proceeds nor rejects completes the call with
/// `NotImplemented`.
pub trait FileSystemInterceptor: Send + Sync {
    fn intercept(&self, call: &mut dyn InterceptedCall);
}

impl<F> FileSystemInterceptor for F
where
    F: Fn(&mut dyn InterceptedCall) + Send + Sync,
{
    fn intercept(&self, call: &mut dyn InterceptedCall) {
        self(call)
    }
}

struct Call<'c, O: FileSystemOperation> {
    input: &'c mut O,
    backend: &'c dyn FileSystemBackend,
    rest: &'c [Arc<dyn FileSystemInterceptor>],
    result: Option<Result<O::Output, O::Error>>,
}

impl<O: FileSystemOperation> Call<'_, O> {
    fn dropped() -> O::Error {
        O::Error::not_implemented(format!(
            "{}: no interceptor passed the call on",
            O::KIND
        ))
    }

    fn into_result(self) -> Result<O::Output, O::Error> {
        self.result.unwrap_or_else(|| Err(Self::dropped()))
    }
}

impl<O: FileSystemOperation> InterceptedCall for Call<'_, O> {
    fn operation(&self) -> OperationKind {
        O::KIND
    }

    fn input(&self) -> &dyn fmt::Debug {
        &*self.input
    }

    fn target(&mut self) -> Option<PathTarget<'_>> {
        self.input.target_mut()
    }

    fn proceed(&mut self) -> Result<(), Errno> {
        let result = match self.rest.split_first() {
            Some((next, rest)) => {
                let mut inner = Call {
                    input: &mut *self.input,
                    backend: self.backend,
                    rest,
                    result: None,
                };
                next.intercept(&mut inner);
                inner.into_result()
            }
            None => self.input.dispatch(self.backend),
        };
        let outcome = match &result {
            Ok(_) => Ok(()),
            Err(err) => Err(err.errno()),
        };
        self.result = Some(result);
        outcome
    }

    fn output(&self) -> Option<&dyn fmt::Debug> {
        match &self.result {
            Some(Ok(output)) => Some(output),
            _ => None,
        }
    }

    fn error(&self) -> Option<&dyn fmt::Display> {
        match &self.result {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }

    fn reject(&mut self, errno: Errno, message: String) {
        let err = match O::Error::from_errno(errno, message.clone()) {
            Some(err) => err,
            None => O::Error::not_implemented(format!(
                "{message} ({} is not an error of {})",
                errno.name(),
                O::KIND
            )),
        };
        self.result = Some(Err(err));
    }
}

/// Entry point for every filesystem operation.
pub struct FileSystem {
    backend: Arc<dyn FileSystemBackend>,
    interceptors: Vec<Arc<dyn FileSystemInterceptor>>,
}

impl FileSystem {
    pub fn new(backend: Arc<dyn FileSystemBackend>) -> Self {
        Self {
            backend,
            interceptors: Vec::new(),
        }
    }

    pub fn builder(backend: Arc<dyn FileSystemBackend>) -> FileSystemBuilder {
        FileSystemBuilder {
            backend,
            interceptors: Vec::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn FileSystemBackend> {
        &self.backend
    }

    pub fn is_operation_supported(&self, kind: OperationKind) -> bool {
        self.backend.supported_operations().contains(kind)
    }

    /// Run `input` against the backend.
    ///
    /// Operations the backend does not support fail with `NotImplemented`
    /// before any interceptor runs.
    pub fn execute<O: FileSystemOperation>(&self, mut input: O) -> Result<O::Output, O::Error> {
        if !self.is_operation_supported(O::KIND) {
            return Err(crate::backend::not_implemented(self.backend.name(), O::KIND));
        }
        if self.interceptors.is_empty() {
            return input.dispatch(&*self.backend);
        }
        let mut call = Call {
            input: &mut input,
            backend: &*self.backend,
            rest: &self.interceptors,
            result: None,
        };
        let _ = call.proceed();
        call.into_result()
    }

    pub fn live_descriptors(&self) -> Vec<Fd> {
        self.backend.live_descriptors()
    }

    /// Force-close every open descriptor.
    pub fn close_all(&self) -> usize {
        let closed = self.backend.close_all();
        if closed > 0 {
            tracing::debug!(backend = self.backend.name(), closed, "closed all descriptors");
        }
        closed
    }
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("backend", &self.backend.name())
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

pub struct FileSystemBuilder {
    backend: Arc<dyn FileSystemBackend>,
    interceptors: Vec<Arc<dyn FileSystemInterceptor>>,
}

impl FileSystemBuilder {
    /// Append an interceptor. Earlier interceptors wrap later ones.
    pub fn interceptor(mut self, interceptor: impl FileSystemInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn shared_interceptor(mut self, interceptor: Arc<dyn FileSystemInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> FileSystem {
        FileSystem {
            backend: self.backend,
            interceptors: self.interceptors,
        }
    }
}
