//! Services the embedder hands to the guest.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use vfs_core::{
    FileSystem, FileSystemBackend, FileSystemInterceptor, Logger, LoggingInterceptor,
    TracingLogger,
};

use crate::config::{BackendKind, ConfigError, HostConfig};

/// Wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Milliseconds since the Unix epoch, negative before it.
    fn epoch_millis(&self) -> f64 {
        match self.now().duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs_f64() * 1000.0,
            Err(before) => -(before.duration().as_secs_f64() * 1000.0),
        }
    }
}

/// Clock that never goes backwards, measured from an arbitrary origin.
pub trait MonotonicClock: Send + Sync {
    fn elapsed(&self) -> Duration;
}

#[derive(Debug, thiserror::Error)]
#[error("entropy source failed: {0}")]
pub struct EntropyError(pub String);

pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EntropyError>;
}

/// What `tzset` needs to fill `timezone`, `daylight` and `tzname`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeZoneInfo {
    /// Seconds west of UTC, as in the C `timezone` global.
    pub timezone: i32,
    pub daylight: bool,
    pub std_name: String,
    pub dst_name: String,
}

pub trait TimeZoneInfoProvider: Send + Sync {
    fn time_zone_info(&self) -> TimeZoneInfo;
}

/// Broken-down time, the fields of the C `struct tm`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StructTm {
    pub sec: i32,
    pub min: i32,
    pub hour: i32,
    /// Day of the month, from 1.
    pub mday: i32,
    /// Months since January.
    pub mon: i32,
    /// Years since 1900.
    pub year: i32,
    /// Days since Sunday.
    pub wday: i32,
    /// Days since January 1.
    pub yday: i32,
    /// Positive while daylight saving time is in effect.
    pub isdst: i32,
    /// Seconds east of UTC.
    pub gmtoff: i32,
}

impl StructTm {
    /// Break down `epoch_seconds` shifted by `gmtoff` seconds east of UTC.
    pub fn from_epoch(epoch_seconds: i64, gmtoff: i32, isdst: bool) -> Self {
        let local = epoch_seconds.saturating_add(gmtoff as i64);
        let days = local.div_euclid(86_400);
        let secs = local.rem_euclid(86_400);
        let (year, month, day) = civil_from_days(days);
        Self {
            sec: (secs % 60) as i32,
            min: (secs / 60 % 60) as i32,
            hour: (secs / 3600) as i32,
            mday: day as i32,
            mon: month as i32 - 1,
            year: (year - 1900) as i32,
            // 1970-01-01 was a Thursday
            wday: (days + 4).rem_euclid(7) as i32,
            yday: (days - days_from_civil(year, 1, 1)) as i32,
            isdst: isdst as i32,
            gmtoff,
        }
    }
}

// Proleptic Gregorian calendar, after Howard Hinnant's `chrono` algorithms.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + (month <= 2) as i64;
    (year, month, day)
}

fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Converts a point in time to the embedder's local time for `localtime`.
pub trait LocalTimeFormatter: Send + Sync {
    fn format(&self, epoch_seconds: i64) -> StructTm;
}

/// Variables for `environ_get`, as `KEY=VALUE` pairs.
pub trait EnvironmentProvider: Send + Sync {
    fn variables(&self) -> Vec<(String, String)>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InstantClock {
    origin: Instant,
}

impl Default for InstantClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl MonotonicClock for InstantClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Entropy from the operating system through `getrandom`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::getrandom(buf).map_err(|err| EntropyError(err.to_string()))
    }
}

/// Environment fixed when the host is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticEnvironment(BTreeMap<String, String>);

impl StaticEnvironment {
    pub fn new(variables: BTreeMap<String, String>) -> Self {
        Self(variables)
    }

    /// Snapshot of the host process environment. Variables that are not
    /// valid UTF-8 are skipped.
    pub fn inherit() -> Self {
        Self(std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect())
    }
}

impl EnvironmentProvider for StaticEnvironment {
    fn variables(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(key, value)| (key.clone(), value.clone())).collect()
    }
}

/// Reports UTC as the local time zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct UtcTimeZone;

impl LocalTimeFormatter for UtcTimeZone {
    fn format(&self, epoch_seconds: i64) -> StructTm {
        StructTm::from_epoch(epoch_seconds, 0, false)
    }
}

impl TimeZoneInfoProvider for UtcTimeZone {
    fn time_zone_info(&self) -> TimeZoneInfo {
        TimeZoneInfo {
            timezone: 0,
            daylight: false,
            std_name: "UTC".to_string(),
            dst_name: "UTC".to_string(),
        }
    }
}

/// Everything a guest instance talks to on the host side.
pub struct EmbedderHost {
    file_system: FileSystem,
    clock: Arc<dyn Clock>,
    monotonic_clock: Arc<dyn MonotonicClock>,
    entropy: Arc<dyn EntropySource>,
    time_zone: Arc<dyn TimeZoneInfoProvider>,
    local_time: Arc<dyn LocalTimeFormatter>,
    environment: Arc<dyn EnvironmentProvider>,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for EmbedderHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedderHost")
            .field("file_system", &self.file_system)
            .finish_non_exhaustive()
    }
}

impl EmbedderHost {
    pub fn builder() -> EmbedderHostBuilder {
        EmbedderHostBuilder::default()
    }

    /// Host with the default collaborators and the given configuration.
    pub fn from_config(config: HostConfig) -> Result<Self, ConfigError> {
        Self::builder().config(config).build()
    }

    pub fn file_system(&self) -> &FileSystem {
        &self.file_system
    }

    pub fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    pub fn monotonic_clock(&self) -> &dyn MonotonicClock {
        &*self.monotonic_clock
    }

    pub fn entropy(&self) -> &dyn EntropySource {
        &*self.entropy
    }

    pub fn time_zone(&self) -> &dyn TimeZoneInfoProvider {
        &*self.time_zone
    }

    pub fn local_time(&self) -> &dyn LocalTimeFormatter {
        &*self.local_time
    }

    pub fn environment(&self) -> &dyn EnvironmentProvider {
        &*self.environment
    }

    pub fn logger(&self) -> &dyn Logger {
        &*self.logger
    }
}

impl Drop for EmbedderHost {
    fn drop(&mut self) {
        let leaked = self.file_system.close_all();
        if leaked > 0 {
            tracing::warn!(leaked, "guest exited with open descriptors");
        }
    }
}

#[derive(Default)]
pub struct EmbedderHostBuilder {
    config: HostConfig,
    backend: Option<Arc<dyn FileSystemBackend>>,
    interceptors: Vec<Arc<dyn FileSystemInterceptor>>,
    clock: Option<Arc<dyn Clock>>,
    monotonic_clock: Option<Arc<dyn MonotonicClock>>,
    entropy: Option<Arc<dyn EntropySource>>,
    time_zone: Option<Arc<dyn TimeZoneInfoProvider>>,
    local_time: Option<Arc<dyn LocalTimeFormatter>>,
    environment: Option<Arc<dyn EnvironmentProvider>>,
    logger: Option<Arc<dyn Logger>>,
}

impl EmbedderHostBuilder {
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `backend` instead of the one named by the configuration.
    pub fn backend(mut self, backend: Arc<dyn FileSystemBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Add an interceptor. The logging interceptor, when enabled, always
    /// runs first; the others follow in the order they were added.
    pub fn interceptor(mut self, interceptor: impl FileSystemInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn monotonic_clock(mut self, clock: Arc<dyn MonotonicClock>) -> Self {
        self.monotonic_clock = Some(clock);
        self
    }

    pub fn entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = Some(entropy);
        self
    }

    pub fn time_zone(mut self, time_zone: Arc<dyn TimeZoneInfoProvider>) -> Self {
        self.time_zone = Some(time_zone);
        self
    }

    pub fn local_time(mut self, local_time: Arc<dyn LocalTimeFormatter>) -> Self {
        self.local_time = Some(local_time);
        self
    }

    /// Replace the `[environment]` table of the configuration.
    pub fn environment(mut self, environment: Arc<dyn EnvironmentProvider>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<EmbedderHost, ConfigError> {
        self.config.validate()?;
        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(&self.config)?,
        };
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger) as Arc<dyn Logger>);

        let mut file_system = FileSystem::builder(backend);
        let events = self.config.logging.events();
        if !events.is_silent() {
            file_system = file_system.interceptor(
                LoggingInterceptor::new(logger.clone(), events).with_level(self.config.logging.level),
            );
        }
        for interceptor in self.interceptors {
            file_system = file_system.shared_interceptor(interceptor);
        }
        let file_system = file_system.build();
        tracing::debug!(?file_system, "embedder host ready");

        Ok(EmbedderHost {
            file_system,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            monotonic_clock: self
                .monotonic_clock
                .unwrap_or_else(|| Arc::new(InstantClock::default())),
            entropy: self.entropy.unwrap_or_else(|| Arc::new(OsEntropy)),
            time_zone: self.time_zone.unwrap_or_else(|| Arc::new(UtcTimeZone)),
            local_time: self.local_time.unwrap_or_else(|| Arc::new(UtcTimeZone)),
            environment: self
                .environment
                .unwrap_or_else(|| Arc::new(StaticEnvironment::new(self.config.environment))),
            logger,
        })
    }
}

fn default_backend(config: &HostConfig) -> Result<Arc<dyn FileSystemBackend>, ConfigError> {
    match config.backend {
        BackendKind::Host => Ok(Arc::new(vfs_host::HostFileSystem::new(config.descriptors))),
        #[cfg(target_os = "linux")]
        BackendKind::Native => Ok(Arc::new(vfs_linux::NativeFileSystem::new(config.descriptors))),
        #[cfg(not(target_os = "linux"))]
        BackendKind::Native => Err(ConfigError::UnsupportedBackend(BackendKind::Native)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_collaborators() {
        let host = EmbedderHost::from_config(HostConfig::default()).unwrap();
        assert_eq!(host.file_system().backend().name(), "host");
        assert_eq!(host.time_zone().time_zone_info().std_name, "UTC");
        assert!(host.clock().epoch_millis() > 1_600_000_000_000.0);

        let first = host.monotonic_clock().elapsed();
        assert!(host.monotonic_clock().elapsed() >= first);

        let mut buf = [0u8; 32];
        host.entropy().fill(&mut buf).unwrap();
        assert!(buf.iter().any(|&b| b != 0));

        assert_eq!(host.local_time().format(0).year, 70);
        assert!(host.environment().variables().is_empty());
    }

    #[test]
    fn environment_comes_from_the_config_unless_replaced() {
        let config = HostConfig::from_toml_str("[environment]\nHOME = \"/home/web_user\"").unwrap();
        let host = EmbedderHost::from_config(config.clone()).unwrap();
        assert_eq!(
            host.environment().variables(),
            vec![("HOME".to_string(), "/home/web_user".to_string())]
        );

        let host = EmbedderHost::builder()
            .config(config)
            .environment(Arc::new(StaticEnvironment::default()))
            .build()
            .unwrap();
        assert!(host.environment().variables().is_empty());
    }

    #[test]
    fn broken_down_utc_time() {
        assert_eq!(
            StructTm::from_epoch(0, 0, false),
            StructTm {
                mday: 1,
                year: 70,
                wday: 4,
                ..StructTm::default()
            }
        );
        assert_eq!(
            StructTm::from_epoch(1_700_000_000, 0, false),
            StructTm {
                sec: 20,
                min: 13,
                hour: 22,
                mday: 14,
                mon: 10,
                year: 123,
                wday: 2,
                yday: 317,
                isdst: 0,
                gmtoff: 0,
            }
        );
        let leap_day = StructTm::from_epoch(951_782_400, 0, false);
        assert_eq!((leap_day.mon, leap_day.mday, leap_day.yday, leap_day.wday), (1, 29, 59, 2));

        let before_epoch = StructTm::from_epoch(-1, 0, false);
        assert_eq!(
            (before_epoch.year, before_epoch.mon, before_epoch.mday, before_epoch.hour, before_epoch.yday, before_epoch.wday),
            (69, 11, 31, 23, 364, 3)
        );
    }

    #[test]
    fn offset_moves_the_calendar() {
        let tm = StructTm::from_epoch(1_700_000_000, 3 * 3600, true);
        assert_eq!((tm.mday, tm.hour, tm.wday, tm.isdst, tm.gmtoff), (15, 1, 3, 1, 10_800));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn native_backend_from_config() {
        let config = HostConfig::from_toml_str("backend = \"native\"").unwrap();
        let host = EmbedderHost::from_config(config).unwrap();
        assert_eq!(host.file_system().backend().name(), "native");
    }

    #[tracing_test::traced_test]
    #[test]
    fn leaked_descriptors_are_reported_on_drop() {
        use vfs_core::op::Open;
        use vfs_core::{BaseDirectory, FileMode, OpenFileFlags};

        let dir = tempfile::tempdir().unwrap();
        let host = EmbedderHost::from_config(HostConfig::default()).unwrap();
        host.file_system()
            .execute(Open {
                path: dir.path().join("leak.db"),
                base_directory: BaseDirectory::Absolute,
                flags: OpenFileFlags::CREAT | OpenFileFlags::RDWR,
                mode: FileMode::from_raw(0o644),
            })
            .unwrap();
        drop(host);
        assert!(logs_contain("guest exited with open descriptors"));
    }

    #[test]
    fn clock_before_the_epoch() {
        struct Fixed;
        impl Clock for Fixed {
            fn now(&self) -> SystemTime {
                UNIX_EPOCH - Duration::from_millis(1500)
            }
        }
        assert_eq!(Fixed.epoch_millis(), -1500.0);
    }
}
