//! Dataset-access capability consumed by the URL classifier.
//!
//! The crate does not link a netCDF binding itself. Hosts that want the
//! classifier's open-and-inspect fallback implement [`DatasetAccess`] over
//! whatever binding they already carry; hosts that skip it only get the
//! `Content-Description` header check.

/// On-disk/transport format reported by a netCDF-style binding for an opened
/// resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskFormat {
    NetCdf3,
    Hdf4,
    Hdf5,
    Dap2,
    Dap4,
    Pnetcdf,
    Undefined,
}

impl DiskFormat {
    /// True for formats served over the Data Access Protocol.
    pub fn is_dap(&self) -> bool {
        matches!(self, DiskFormat::Dap2 | DiskFormat::Dap4)
    }
}

/// Attempt to open the resource at `location` and report its format.
///
/// Implementations must release the opened resource before returning; the
/// classifier only wants the format, not a live handle. An unopenable
/// resource is an `Err`, which the classifier treats as "not DAP".
pub trait DatasetAccess {
    fn open_format(&self, location: &str) -> std::io::Result<DiskFormat>;
}
