//! Cached DNS Resolver
//!
//! Wraps a [`Resolve`] backend behind one shared [`Cache`]. Each lookup kind is
//! encoded into the cache key, and the loader dispatches on that kind.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::error::ResolveError;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::Resolver;
use tracing::info;

pub use hickory_resolver::config::{ResolverConfig, ResolverOpts};

use crate::cache::{downcast, erase, Cache, CacheStats, ErasedValue, LoadError, LoadResult, Loaded};
use crate::config::CacheConfig;
use crate::error::{BoxError, CacheError, Result};
use crate::key::CacheKey;

// == Records ==
/// A mail exchanger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mx {
    pub host: String,
    pub pref: u16,
}

/// A single service location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Srv {
    pub target: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,
}

/// Answer to a service lookup: the name that was queried and its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecords {
    pub cname: String,
    pub addrs: Vec<Srv>,
}

/// Name queried for a service lookup, `_service._proto.name`.
///
/// With both `service` and `proto` empty, `name` is queried directly.
pub fn srv_query_name(service: &str, proto: &str, name: &str) -> String {
    if service.is_empty() && proto.is_empty() {
        name.to_string()
    } else {
        format!("_{service}._{proto}.{name}")
    }
}

// == Resolver Backend ==
/// Performs uncached name resolution.
///
/// Only address lookups are required. Backends that cannot answer the other
/// record types keep the defaults, which fail with `ErrorKind::Unsupported`.
pub trait Resolve: Send + Sync + 'static {
    /// Addresses for `host`.
    fn lookup_ip(&self, host: &str) -> io::Result<Vec<IpAddr>>;

    /// Socket addresses for `host` on `port`.
    fn lookup_socket_addrs(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        Ok(self
            .lookup_ip(host)?
            .into_iter()
            .map(|ip| SocketAddr::new(ip, port))
            .collect())
    }

    /// Names pointing at `addr` (PTR).
    fn lookup_addr(&self, _addr: IpAddr) -> io::Result<Vec<String>> {
        Err(unsupported("PTR"))
    }

    /// Canonical name of `host`.
    fn lookup_cname(&self, _host: &str) -> io::Result<String> {
        Err(unsupported("CNAME"))
    }

    fn lookup_mx(&self, _host: &str) -> io::Result<Vec<Mx>> {
        Err(unsupported("MX"))
    }

    fn lookup_ns(&self, _host: &str) -> io::Result<Vec<String>> {
        Err(unsupported("NS"))
    }

    /// Service records for `_service._proto.name`.
    fn lookup_srv(&self, _service: &str, _proto: &str, _name: &str) -> io::Result<SrvRecords> {
        Err(unsupported("SRV"))
    }

    fn lookup_txt(&self, _host: &str) -> io::Result<Vec<String>> {
        Err(unsupported("TXT"))
    }
}

fn unsupported(record: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{record} lookups are not supported by this resolver"),
    )
}

// == System Resolver ==
/// Blocking DNS resolver backed by hickory.
///
/// Runs its own single-threaded runtime, so it must not be called from inside
/// an async task.
pub struct SystemResolver {
    inner: Resolver,
}

impl SystemResolver {
    /// Uses the host's resolver configuration (`/etc/resolv.conf` on unix).
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            inner: Resolver::from_system_conf()?,
        })
    }

    /// Uses explicit name servers and options, e.g. a shorter `timeout`.
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> io::Result<Self> {
        Ok(Self {
            inner: Resolver::new(config, opts)?,
        })
    }
}

fn to_io(err: ResolveError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

impl Resolve for SystemResolver {
    fn lookup_ip(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let lookup = self.inner.lookup_ip(host).map_err(to_io)?;
        Ok(lookup.iter().collect())
    }

    fn lookup_addr(&self, addr: IpAddr) -> io::Result<Vec<String>> {
        let lookup = self.inner.reverse_lookup(addr).map_err(to_io)?;
        Ok(lookup.iter().map(|name| name.to_string()).collect())
    }

    fn lookup_cname(&self, host: &str) -> io::Result<String> {
        let lookup = self
            .inner
            .lookup(host, RecordType::CNAME)
            .map_err(to_io)?;
        lookup
            .iter()
            .find_map(|rdata| match rdata {
                RData::CNAME(cname) => Some(cname.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no CNAME for {host}"))
            })
    }

    fn lookup_mx(&self, host: &str) -> io::Result<Vec<Mx>> {
        let lookup = self.inner.mx_lookup(host).map_err(to_io)?;
        Ok(lookup
            .iter()
            .map(|mx| Mx {
                host: mx.exchange().to_string(),
                pref: mx.preference(),
            })
            .collect())
    }

    fn lookup_ns(&self, host: &str) -> io::Result<Vec<String>> {
        let lookup = self.inner.ns_lookup(host).map_err(to_io)?;
        Ok(lookup.iter().map(|ns| ns.to_string()).collect())
    }

    fn lookup_srv(&self, service: &str, proto: &str, name: &str) -> io::Result<SrvRecords> {
        let query = srv_query_name(service, proto, name);
        let lookup = self.inner.srv_lookup(query.as_str()).map_err(to_io)?;
        Ok(SrvRecords {
            addrs: lookup
                .iter()
                .map(|srv| Srv {
                    target: srv.target().to_string(),
                    port: srv.port(),
                    priority: srv.priority(),
                    weight: srv.weight(),
                })
                .collect(),
            cname: query,
        })
    }

    fn lookup_txt(&self, host: &str) -> io::Result<Vec<String>> {
        let lookup = self.inner.txt_lookup(host).map_err(to_io)?;
        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect::<String>()
            })
            .collect())
    }
}

// == Lookup Kinds ==
const KIND_IP: &str = "ip";
const KIND_SOCKET: &str = "sock";
const KIND_ADDR: &str = "addr";
const KIND_CNAME: &str = "cname";
const KIND_MX: &str = "mx";
const KIND_NS: &str = "ns";
const KIND_SRV: &str = "srv";
const KIND_TXT: &str = "txt";

// == Cached Resolver ==
/// DNS lookups cached with LRU eviction and a cache-wide TTL.
pub struct CachedResolver {
    cache: Cache<ErasedValue>,
}

impl CachedResolver {
    // == Constructor ==
    /// Creates a resolver caching up to `capacity` answers for `ttl` each.
    pub fn new<R: Resolve>(resolver: R, capacity: usize, ttl: Duration) -> Self {
        info!(capacity, ttl_secs = ttl.as_secs(), "cached resolver initialized");
        let cache = Cache::new(capacity, ttl, move |key: &str| load(&resolver, key));
        Self { cache }
    }

    pub fn from_config<R: Resolve>(resolver: R, config: &CacheConfig) -> Self {
        Self::new(resolver, config.capacity, config.global_ttl())
    }

    // == Lookups ==
    /// Addresses for `host`.
    pub fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        let ips: Arc<Vec<IpAddr>> = self.fetch(KIND_IP, &[checked_host(host)?])?;
        Ok(ips.as_ref().clone())
    }

    /// Addresses for `host`, formatted as strings.
    ///
    /// Shares the cache entry of [`lookup_ip`](Self::lookup_ip).
    pub fn lookup_host(&self, host: &str) -> Result<Vec<String>> {
        Ok(self.lookup_ip(host)?.iter().map(IpAddr::to_string).collect())
    }

    /// Socket addresses for `host` on `port`.
    pub fn lookup_socket_addrs(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>> {
        let port = port.to_string();
        let addrs: Arc<Vec<SocketAddr>> =
            self.fetch(KIND_SOCKET, &[checked_host(host)?, port.as_str()])?;
        Ok(addrs.as_ref().clone())
    }

    /// Names pointing at `addr`.
    pub fn lookup_addr(&self, addr: IpAddr) -> Result<Vec<String>> {
        let addr = addr.to_string();
        let names: Arc<Vec<String>> = self.fetch(KIND_ADDR, &[addr.as_str()])?;
        Ok(names.as_ref().clone())
    }

    pub fn lookup_cname(&self, host: &str) -> Result<String> {
        let cname: Arc<String> = self.fetch(KIND_CNAME, &[checked_host(host)?])?;
        Ok(cname.as_ref().clone())
    }

    pub fn lookup_mx(&self, host: &str) -> Result<Vec<Mx>> {
        let mx: Arc<Vec<Mx>> = self.fetch(KIND_MX, &[checked_host(host)?])?;
        Ok(mx.as_ref().clone())
    }

    pub fn lookup_ns(&self, host: &str) -> Result<Vec<String>> {
        let ns: Arc<Vec<String>> = self.fetch(KIND_NS, &[checked_host(host)?])?;
        Ok(ns.as_ref().clone())
    }

    /// Service records for `_service._proto.name`.
    ///
    /// Returns the queried name and the records, like `net.LookupSRV`.
    pub fn lookup_srv(&self, service: &str, proto: &str, name: &str) -> Result<(String, Vec<Srv>)> {
        let srv: Arc<SrvRecords> =
            self.fetch(KIND_SRV, &[service, proto, checked_host(name)?])?;
        Ok((srv.cname.clone(), srv.addrs.clone()))
    }

    pub fn lookup_txt(&self, host: &str) -> Result<Vec<String>> {
        let txt: Arc<Vec<String>> = self.fetch(KIND_TXT, &[checked_host(host)?])?;
        Ok(txt.as_ref().clone())
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn fetch<T>(&self, kind: &str, args: &[&str]) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let key = CacheKey::encode_parts(kind, args)?;
        let value = self.cache.get(&key)?;
        Ok(downcast(&key, value))
    }
}

fn checked_host(host: &str) -> Result<&str> {
    if host.trim().is_empty() {
        return Err(CacheError::InvalidKey("host name is empty".to_string()));
    }
    Ok(host)
}

/// Loader shared by every lookup kind.
fn load<R: Resolve>(resolver: &R, key: &str) -> LoadResult<ErasedValue> {
    resolve_key(resolver, key)
        .map(Loaded::new)
        .map_err(LoadError::new)
}

fn resolve_key<R: Resolve>(resolver: &R, key: &str) -> std::result::Result<ErasedValue, BoxError> {
    let key = CacheKey::decode(key)?;

    let value = match key.kind.as_str() {
        KIND_IP => erase(resolver.lookup_ip(key.arg(0, "host")?)?),
        KIND_SOCKET => {
            let port: u16 = key.arg(1, "port")?.parse()?;
            erase(resolver.lookup_socket_addrs(key.arg(0, "host")?, port)?)
        }
        KIND_ADDR => {
            let addr: IpAddr = key.arg(0, "address")?.parse()?;
            erase(resolver.lookup_addr(addr)?)
        }
        KIND_CNAME => erase(resolver.lookup_cname(key.arg(0, "host")?)?),
        KIND_MX => erase(resolver.lookup_mx(key.arg(0, "host")?)?),
        KIND_NS => erase(resolver.lookup_ns(key.arg(0, "host")?)?),
        KIND_SRV => erase(resolver.lookup_srv(
            key.arg(0, "service")?,
            key.arg(1, "proto")?,
            key.arg(2, "name")?,
        )?),
        KIND_TXT => erase(resolver.lookup_txt(key.arg(0, "host")?)?),
        other => {
            return Err(CacheError::InvalidKey(format!("unsupported lookup kind '{other}'")).into())
        }
    };
    Ok(value)
}
