use std::path::{Path, PathBuf};
use std::sync::Arc;

use enumset::{EnumSet, enum_set};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use vfs_core::op::{Close, CloseError, Open, OpenError, Stat, StatError};
use vfs_core::{
    BaseDirectory, Errno, Fd, FdTableConfig, FileDescriptorTable, FileMode, FileSystem,
    FileSystemBackend, InterceptedCall, LogLevel, LogVerbosity, Logger, LoggingEvents,
    LoggingInterceptor, OpenFileFlags, OpenHandle, OperationError, OperationKind, ResolvedBase,
    normalize_lexically, preflight,
};

struct Node {
    path: PathBuf,
}

impl OpenHandle for Node {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_directory(&self) -> bool {
        false
    }
}

/// Opens anything under `/ok`, nothing else.
struct FakeBackend {
    table: FileDescriptorTable<Node>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            table: FileDescriptorTable::new(FdTableConfig::default()),
        }
    }
}

impl FileSystemBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn supported_operations(&self) -> EnumSet<OperationKind> {
        enum_set!(OperationKind::Open | OperationKind::Close)
    }

    fn live_descriptors(&self) -> Vec<Fd> {
        self.table.live_descriptors()
    }

    fn close_all(&self) -> usize {
        self.table.drain().len()
    }

    fn open(&self, input: &Open) -> Result<Fd, OpenError> {
        let path = match preflight(&input.path, input.base_directory, false)? {
            ResolvedBase::Absolute(path) => path.to_path_buf(),
            _ => return Err(OpenError::InvalidArgument("relative".into())),
        };
        if !path.starts_with("/ok") {
            return Err(vfs_core::map_errno("open", Errno::Noent));
        }
        Ok(self.table.add(Node { path })?)
    }

    fn close(&self, input: &Close) -> Result<(), CloseError> {
        self.table.remove(input.fd)?;
        Ok(())
    }
}

fn open(path: &str) -> Open {
    Open {
        path: PathBuf::from(path),
        base_directory: BaseDirectory::CurrentWorkingDirectory,
        flags: OpenFileFlags::RDWR,
        mode: FileMode::empty(),
    }
}

#[derive(Default)]
struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl Logger for RecordingLogger {
    fn log(&self, _level: LogLevel, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

#[test]
fn unsupported_operation_is_not_implemented() {
    let fs = FileSystem::new(Arc::new(FakeBackend::new()));
    assert!(fs.is_operation_supported(OperationKind::Open));
    assert!(!fs.is_operation_supported(OperationKind::Stat));

    let err = fs
        .execute(Stat {
            path: PathBuf::from("/ok"),
            base_directory: BaseDirectory::CurrentWorkingDirectory,
            follow_symlinks: true,
        })
        .unwrap_err();
    assert!(matches!(err, StatError::NotImplemented(_)));
    assert_eq!(err.errno(), Errno::Nosys);
}

#[test]
fn execute_without_interceptors() {
    let fs = FileSystem::new(Arc::new(FakeBackend::new()));
    let fd = fs.execute(open("/ok/a")).unwrap();
    assert_eq!(fd, Fd(3));
    assert_eq!(fs.live_descriptors(), vec![Fd(3)]);

    fs.execute(Close { fd }).unwrap();
    let err = fs.execute(Close { fd }).unwrap_err();
    assert_eq!(err.errno(), Errno::Badf);

    let err = fs.execute(open("/missing")).unwrap_err();
    assert_eq!(err.errno(), Errno::Noent);
    assert!(fs.live_descriptors().is_empty());
}

#[test]
fn interceptors_run_in_registration_order() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let outer = {
        let trace = trace.clone();
        move |call: &mut dyn InterceptedCall| {
            trace.lock().push(format!("outer>{}", call.operation()));
            let _ = call.proceed();
            trace.lock().push("outer<".to_string());
        }
    };
    let inner = {
        let trace = trace.clone();
        move |call: &mut dyn InterceptedCall| {
            trace.lock().push(format!("inner>{}", call.operation()));
            let outcome = call.proceed();
            trace.lock().push(format!("inner<{outcome:?}"));
        }
    };
    let fs = FileSystem::builder(Arc::new(FakeBackend::new()))
        .interceptor(outer)
        .interceptor(inner)
        .build();

    let fd = fs.execute(open("/ok/a")).unwrap();
    assert_eq!(
        trace.lock().clone(),
        vec!["outer>open", "inner>open", "inner<Ok(())", "outer<"]
    );
    assert_eq!(fs.close_all(), 1);
    assert_eq!(fs.live_descriptors(), Vec::<Fd>::new());
    let _ = fd;
}

/// Confines every path to `/ok`, with `/ok` standing in for the working
/// directory. Paths that stay inside are rewritten to absolute ones.
fn jail(call: &mut dyn InterceptedCall) {
    let escapes = match call.target() {
        Some(target) => {
            let anchored = normalize_lexically(&Path::new("/ok").join(&*target.path));
            if anchored.starts_with("/ok") {
                *target.path = anchored;
                *target.base_directory = BaseDirectory::Absolute;
                false
            } else {
                true
            }
        }
        None => false,
    };
    if escapes {
        call.reject(Errno::Access, "outside of the jail".to_string());
    } else {
        let _ = call.proceed();
    }
}

#[test]
fn interceptor_can_reject_before_the_backend() {
    let fs = FileSystem::builder(Arc::new(FakeBackend::new()))
        .interceptor(jail)
        .build();

    let err = fs.execute(open("/etc/passwd")).unwrap_err();
    assert_eq!(err, OpenError::AccessDenied("outside of the jail".into()));
    let err = fs.execute(open("../etc/passwd")).unwrap_err();
    assert_eq!(err, OpenError::AccessDenied("outside of the jail".into()));
    let err = fs.execute(open("/ok/../etc")).unwrap_err();
    assert_eq!(err.errno(), Errno::Access);
    assert!(fs.live_descriptors().is_empty());

    // An errno the operation does not define degrades to NOSYS.
    let fs = FileSystem::builder(Arc::new(FakeBackend::new()))
        .interceptor(|call: &mut dyn InterceptedCall| call.reject(Errno::Dom, "nope".into()))
        .build();
    let err = fs.execute(open("/ok/a")).unwrap_err();
    assert_eq!(err.errno(), Errno::Nosys);
}

#[test]
fn interceptor_can_rewrite_the_path() {
    let backend = Arc::new(FakeBackend::new());
    let fs = FileSystem::builder(backend.clone())
        .interceptor(jail)
        .build();

    // The backend only takes absolute paths; the jail anchors relative ones.
    let fd = fs.execute(open("db/../main.db")).unwrap();
    let opened = backend.table.with_handle(fd, |node| node.path.clone()).unwrap();
    assert_eq!(opened, PathBuf::from("/ok/main.db"));

    // Descriptor operations carry no path and pass straight through.
    fs.execute(Close { fd }).unwrap();
    assert!(fs.live_descriptors().is_empty());
}

#[test]
fn interceptor_that_drops_the_call_yields_not_implemented() {
    let fs = FileSystem::builder(Arc::new(FakeBackend::new()))
        .interceptor(|_: &mut dyn InterceptedCall| {})
        .build();
    let err = fs.execute(open("/ok/a")).unwrap_err();
    assert!(matches!(err, OpenError::NotImplemented(_)));
    assert!(fs.live_descriptors().is_empty());
}

#[test]
fn logging_interceptor_formats_events() {
    let logger = Arc::new(RecordingLogger::default());
    let events = LoggingEvents {
        start: LogVerbosity::Name,
        end: LogVerbosity::Basic,
        track_duration: false,
    };
    let fs = FileSystem::builder(Arc::new(FakeBackend::new()))
        .interceptor(LoggingInterceptor::new(logger.clone(), events))
        .build();

    let fd = fs.execute(open("/ok/a")).unwrap();
    fs.execute(open("/nope")).unwrap_err();
    fs.execute(Close { fd }).unwrap();

    assert_eq!(
        logger.lines.lock().clone(),
        vec![
            "^open()",
            "open(): OK.",
            "^open()",
            "open(): NOENT(open: No such file or directory).",
            "^close()",
            "close(): OK.",
        ]
    );
}

#[test]
fn verbose_end_event_includes_inputs_and_outputs() {
    let logger = Arc::new(RecordingLogger::default());
    let events = LoggingEvents {
        start: LogVerbosity::None,
        end: LogVerbosity::Verbose,
        track_duration: true,
    };
    let fs = FileSystem::builder(Arc::new(FakeBackend::new()))
        .interceptor(LoggingInterceptor::new(logger.clone(), events))
        .build();

    let fd = fs.execute(open("/ok/a")).unwrap();
    let lines = logger.lines.lock().clone();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("open(): OK. Inputs: Open {"));
    assert!(lines[0].contains("Outputs: Fd(3)"));
    assert!(lines[0].contains(" Duration: "));
    fs.execute(Close { fd }).unwrap();
}

#[test]
fn supported_set_is_consulted_first() {
    let all: EnumSet<OperationKind> = EnumSet::all();
    let backend = FakeBackend::new();
    assert!(backend.supported_operations().is_subset(all));
    assert_eq!(backend.supported_operations().len(), 2);
}
