use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Where the application server listens.
///
/// Written the way the proxy config refers to upstreams: `unix:/tmp/app.sock`
/// for a local socket, or a plain `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindAddr {
    Unix(PathBuf),
    Tcp(SocketAddr),
}

#[derive(Debug, thiserror::Error)]
pub enum BindAddrError {
    #[error("unix bind address has an empty path")]
    EmptyUnixPath,
    #[error("invalid bind address '{addr}': {source}")]
    InvalidTcp {
        addr: String,
        source: std::net::AddrParseError,
    },
}

impl FromStr for BindAddr {
    type Err = BindAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(BindAddrError::EmptyUnixPath);
            }
            return Ok(BindAddr::Unix(PathBuf::from(path)));
        }
        s.parse()
            .map(BindAddr::Tcp)
            .map_err(|source| BindAddrError::InvalidTcp {
                addr: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for BindAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindAddr::Unix(path) => write!(f, "unix:{}", path.display()),
            BindAddr::Tcp(addr) => write!(f, "{}", addr),
        }
    }
}
