//! IP geolocation using a MaxMind GeoLite2-City database.

use std::net::IpAddr;
use std::path::Path;

use maxminddb::Reader;

use crate::error_handling::InitializationError;

/// Places an IP address on the map.
pub trait IpLocator: Send + Sync {
    /// Approximate `(latitude, longitude)` of `ip`, when known.
    fn locate(&self, ip: IpAddr) -> Option<(f64, f64)>;
}

/// Locator used when no database is configured or it failed to load.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLocator;

impl IpLocator for NoopLocator {
    fn locate(&self, _ip: IpAddr) -> Option<(f64, f64)> {
        None
    }
}

/// [`IpLocator`] backed by an in-memory GeoLite2-City reader.
pub struct GeoIpLocator {
    reader: Reader<Vec<u8>>,
}

impl GeoIpLocator {
    /// Reads and validates the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::GeoIpError` if the file is missing or is
    /// not a MaxMind database.
    pub fn open(path: &Path) -> Result<Self, InitializationError> {
        let bytes = std::fs::read(path).map_err(|e| {
            InitializationError::GeoIpError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, InitializationError> {
        let reader = Reader::from_source(bytes)
            .map_err(|e| InitializationError::GeoIpError(e.to_string()))?;
        log::info!(
            "GeoIP database loaded: {} (build epoch {})",
            reader.metadata.database_type,
            reader.metadata.build_epoch
        );
        Ok(Self { reader })
    }
}

impl IpLocator for GeoIpLocator {
    fn locate(&self, ip: IpAddr) -> Option<(f64, f64)> {
        // maxminddb 0.27: lookup() yields a LookupResult, decode() the record if any
        let found = self.reader.lookup(ip).ok()?;
        if !found.has_data() {
            return None;
        }
        let city: maxminddb::geoip2::City = found.decode().ok()??;
        Some((city.location.latitude?, city.location.longitude?))
    }
}
