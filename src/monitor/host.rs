//! Host inventory read from procfs: processes, memory, partitions, sockets
//! and the combined status report.
//!
//! Every read here blocks. Callers on the async side go through
//! `spawn_blocking`.

use crate::monitor::command::output_within;
use crate::monitor::metrics::{HostSample, Metric};
use crate::monitor::sampler::parse_cpu_times;
use crate::types::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn gib(bytes: u64) -> f64 {
    round_to(bytes as f64 / GIB, 2)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_to(part as f64 / whole as f64 * 100.0, 1)
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Combined host report returned by `get_system_status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatus {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuStatus,
    pub memory: Option<MemoryStatus>,
    pub disk: Option<DiskStatus>,
    pub network: Option<NetworkCounters>,
    pub temperature_celsius: Option<f64>,
    pub load_average: Option<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuStatus {
    pub usage_percent: Option<f64>,
    pub cores: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStatus {
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskStatus {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub percent: f64,
}

/// Byte counters summed over every interface in `/proc/net/dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

/// Memory figures in bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryDetails {
    pub virtual_memory: VirtualMemory,
    pub swap_memory: SwapMemory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualMemory {
    pub total: u64,
    pub available: u64,
    pub percent: f64,
    pub used: u64,
    pub free: u64,
    pub active: Option<u64>,
    pub inactive: Option<u64>,
    pub buffers: Option<u64>,
    pub cached: Option<u64>,
    pub shared: Option<u64>,
}

/// Swap usage. `sin_pages`/`sout_pages` are cumulative pages swapped in
/// and out since boot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapMemory {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
    pub sin_pages: Option<u64>,
    pub sout_pages: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskPartition {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub fd: Option<u32>,
    pub family: &'static str,
    #[serde(rename = "type")]
    pub socket_type: &'static str,
    pub laddr: Option<String>,
    pub raddr: Option<String>,
    pub status: &'static str,
    pub pid: Option<u32>,
}

// =============================================================================
// Connection kinds
// =============================================================================

/// Socket table selector accepted by `get_network_connections`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Inet,
    Inet4,
    Inet6,
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
}

impl ConnectionKind {
    pub const NAMES: [&'static str; 9] = [
        "inet", "inet4", "inet6", "tcp", "tcp4", "tcp6", "udp", "udp4", "udp6",
    ];

    fn tables(&self) -> &'static [SocketTable] {
        use SocketTable::{Tcp4, Tcp6, Udp4, Udp6};
        match self {
            ConnectionKind::Inet => &[Tcp4, Tcp6, Udp4, Udp6],
            ConnectionKind::Inet4 => &[Tcp4, Udp4],
            ConnectionKind::Inet6 => &[Tcp6, Udp6],
            ConnectionKind::Tcp => &[Tcp4, Tcp6],
            ConnectionKind::Tcp4 => &[Tcp4],
            ConnectionKind::Tcp6 => &[Tcp6],
            ConnectionKind::Udp => &[Udp4, Udp6],
            ConnectionKind::Udp4 => &[Udp4],
            ConnectionKind::Udp6 => &[Udp6],
        }
    }
}

impl FromStr for ConnectionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "inet" => ConnectionKind::Inet,
            "inet4" => ConnectionKind::Inet4,
            "inet6" => ConnectionKind::Inet6,
            "tcp" => ConnectionKind::Tcp,
            "tcp4" => ConnectionKind::Tcp4,
            "tcp6" => ConnectionKind::Tcp6,
            "udp" => ConnectionKind::Udp,
            "udp4" => ConnectionKind::Udp4,
            "udp6" => ConnectionKind::Udp6,
            other => {
                return Err(Error::validation(format!(
                    "unknown connection kind '{}'",
                    other
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocketTable {
    Tcp4,
    Tcp6,
    Udp4,
    Udp6,
}

impl SocketTable {
    fn file(&self) -> &'static str {
        match self {
            SocketTable::Tcp4 => "net/tcp",
            SocketTable::Tcp6 => "net/tcp6",
            SocketTable::Udp4 => "net/udp",
            SocketTable::Udp6 => "net/udp6",
        }
    }

    fn is_v6(&self) -> bool {
        matches!(self, SocketTable::Tcp6 | SocketTable::Udp6)
    }

    fn is_tcp(&self) -> bool {
        matches!(self, SocketTable::Tcp4 | SocketTable::Tcp6)
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Reads host inventory from a procfs root.
#[derive(Debug, Clone)]
pub struct HostInventory {
    proc_root: PathBuf,
    disk_path: PathBuf,
    cpu_window: Duration,
    command_timeout: Duration,
}

impl Default for HostInventory {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            disk_path: PathBuf::from("/"),
            cpu_window: Duration::from_millis(500),
            command_timeout: Duration::from_secs(5),
        }
    }
}

impl HostInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            ..Self::default()
        }
    }

    /// Interval over which per-process CPU usage is measured.
    pub fn cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window;
        self
    }

    /// Upper bound for each `df` run.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn read(&self, relative: impl AsRef<Path>) -> Option<String> {
        let path = self.proc_root.join(relative);
        std::fs::read_to_string(&path)
            .map_err(|e| tracing::debug!("cannot read {}: {}", path.display(), e))
            .ok()
    }

    fn require(&self, relative: &str) -> Result<String> {
        self.read(relative)
            .ok_or_else(|| Error::internal(format!("cannot read {}", self.proc_root.join(relative).display())))
    }

    /// Status report around a watchdog sample.
    pub fn system_status(&self, sample: &HostSample) -> SystemStatus {
        let meminfo = self.read("meminfo").map(|m| parse_meminfo_fields(&m));
        let memory = meminfo.as_ref().and_then(|m| {
            let total = *m.get("MemTotal")?;
            let available = mem_available(m)?;
            let used = total.saturating_sub(available);
            Some(MemoryStatus {
                total_gb: gib(total),
                used_gb: gib(used),
                available_gb: gib(available),
                percent: percent(used, total),
            })
        });

        let disk_path = self.disk_path.to_string_lossy();
        let disk = output_within("df", &["-P", "-k", &disk_path], self.command_timeout)
            .and_then(|out| parse_df_rows(&out).into_iter().next())
            .map(|row| DiskStatus {
                total_gb: gib(row.total),
                used_gb: gib(row.used),
                free_gb: gib(row.available),
                percent: percent(row.used, row.used + row.available),
            });

        SystemStatus {
            timestamp: sample.timestamp,
            cpu: CpuStatus {
                usage_percent: sample.get(Metric::Cpu),
                cores: self.read("stat").map(|s| count_cores(&s)).filter(|n| *n > 0),
            },
            memory,
            disk,
            network: self.read("net/dev").and_then(|s| parse_net_dev(&s)),
            temperature_celsius: sample.get(Metric::Temperature),
            load_average: self.read("loadavg").and_then(|s| parse_loadavg(&s)),
        }
    }

    /// Top `limit` processes by CPU usage over the measurement window.
    pub fn processes(&self, limit: usize) -> Result<Vec<ProcessInfo>> {
        let stat_before = self.require("stat")?;
        let cores = count_cores(&stat_before).max(1);
        let total_before = parse_cpu_times(&stat_before)
            .ok_or_else(|| Error::internal("unparsable /proc/stat"))?;
        let before = self.process_ticks();

        std::thread::sleep(self.cpu_window);

        let total_after = parse_cpu_times(&self.require("stat")?)
            .ok_or_else(|| Error::internal("unparsable /proc/stat"))?;
        let after = self.process_ticks();
        let elapsed = total_after.total.saturating_sub(total_before.total);

        let mem_total = self
            .read("meminfo")
            .and_then(|m| parse_meminfo_fields(&m).get("MemTotal").copied())
            .unwrap_or(0);

        let mut processes: Vec<ProcessInfo> = after
            .into_iter()
            .map(|(pid, (name, ticks))| {
                let cpu_percent = match before.get(&pid) {
                    Some((_, earlier)) if elapsed > 0 => round_to(
                        ticks.saturating_sub(*earlier) as f64 / elapsed as f64
                            * cores as f64
                            * 100.0,
                        1,
                    ),
                    _ => 0.0,
                };
                let rss_kb = self
                    .read(format!("{}/status", pid))
                    .and_then(|s| parse_vm_rss_kb(&s))
                    .unwrap_or(0);
                ProcessInfo {
                    pid,
                    name,
                    cpu_percent,
                    memory_percent: percent(rss_kb * 1024, mem_total),
                }
            })
            .collect();

        processes.sort_by(|a, b| {
            b.cpu_percent
                .total_cmp(&a.cpu_percent)
                .then_with(|| a.pid.cmp(&b.pid))
        });
        processes.truncate(limit);
        Ok(processes)
    }

    fn pids(&self) -> Vec<u32> {
        match std::fs::read_dir(&self.proc_root) {
            Ok(entries) => entries
                .filter_map(|e| e.ok()?.file_name().to_str()?.parse().ok())
                .collect(),
            Err(e) => {
                tracing::debug!("cannot list {}: {}", self.proc_root.display(), e);
                Vec::new()
            }
        }
    }

    /// `pid -> (name, utime + stime)`. Processes that exit mid-scan are skipped.
    fn process_ticks(&self) -> BTreeMap<u32, (String, u64)> {
        self.pids()
            .into_iter()
            .filter_map(|pid| {
                let stat = self.read(format!("{}/stat", pid))?;
                Some((pid, parse_process_stat(&stat)?))
            })
            .collect()
    }

    pub fn memory_details(&self) -> Result<MemoryDetails> {
        let fields = parse_meminfo_fields(&self.require("meminfo")?);
        let vmstat = self.read("vmstat").map(|s| parse_vmstat(&s)).unwrap_or_default();
        memory_details_from(&fields, &vmstat)
            .ok_or_else(|| Error::internal("meminfo has no MemTotal"))
    }

    /// Usage of every device-backed mount.
    pub fn disk_usage(&self) -> Result<Vec<DiskPartition>> {
        let mounts = parse_mounts(&self.require("mounts")?);
        if mounts.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec!["-P", "-k"];
        args.extend(mounts.iter().map(|m| m.mountpoint.as_str()));
        let output = output_within("df", &args, self.command_timeout)
            .ok_or_else(|| Error::timeout("df did not report disk usage"))?;
        let usage: HashMap<String, DfRow> = parse_df_rows(&output)
            .into_iter()
            .map(|row| (row.mountpoint.clone(), row))
            .collect();

        // Mounts df could not stat are left out.
        Ok(mounts
            .into_iter()
            .filter_map(|m| {
                let row = usage.get(&m.mountpoint)?;
                Some(DiskPartition {
                    device: m.device,
                    mountpoint: m.mountpoint,
                    fstype: m.fstype,
                    total_gb: gib(row.total),
                    used_gb: gib(row.used),
                    free_gb: gib(row.available),
                    percent: percent(row.used, row.used + row.available),
                })
            })
            .collect())
    }

    pub fn connections(&self, kind: ConnectionKind) -> Result<Vec<Connection>> {
        let mut entries = Vec::new();
        let mut readable = false;
        for table in kind.tables() {
            if let Some(text) = self.read(table.file()) {
                readable = true;
                entries.extend(parse_socket_table(&text, *table));
            }
        }
        if !readable {
            return Err(Error::internal(format!(
                "no socket tables readable under {}",
                self.proc_root.join("net").display()
            )));
        }

        let owners = self.socket_owners();
        Ok(entries
            .into_iter()
            .map(|entry| {
                let owner = owners.get(&entry.inode);
                Connection {
                    fd: owner.map(|o| o.1),
                    family: if entry.table.is_v6() { "AF_INET6" } else { "AF_INET" },
                    socket_type: if entry.table.is_tcp() { "SOCK_STREAM" } else { "SOCK_DGRAM" },
                    laddr: Some(format_addr(&entry.local)),
                    raddr: (!is_unset(&entry.remote)).then(|| format_addr(&entry.remote)),
                    status: if entry.table.is_tcp() { tcp_state(entry.state) } else { "NONE" },
                    pid: owner.map(|o| o.0),
                }
            })
            .collect())
    }

    /// `socket inode -> (pid, fd)` for the processes whose fds we may read.
    fn socket_owners(&self) -> HashMap<u64, (u32, u32)> {
        let mut owners = HashMap::new();
        for pid in self.pids() {
            let Ok(fds) = std::fs::read_dir(self.proc_root.join(format!("{}/fd", pid))) else {
                continue;
            };
            for entry in fds.flatten() {
                let Some(fd) = entry.file_name().to_str().and_then(|s| s.parse().ok()) else {
                    continue;
                };
                let Ok(target) = std::fs::read_link(entry.path()) else {
                    continue;
                };
                if let Some(inode) = socket_inode(&target.to_string_lossy()) {
                    owners.entry(inode).or_insert((pid, fd));
                }
            }
        }
        owners
    }
}

// =============================================================================
// Parsers
// =============================================================================

/// `/proc/meminfo` as bytes, keyed by field name.
pub fn parse_meminfo_fields(meminfo: &str) -> HashMap<String, u64> {
    meminfo
        .lines()
        .filter_map(|line| {
            let (name, rest) = line.split_once(':')?;
            let mut parts = rest.split_whitespace();
            let value: u64 = parts.next()?.parse().ok()?;
            let scale = if parts.next() == Some("kB") { 1024 } else { 1 };
            Some((name.trim().to_string(), value * scale))
        })
        .collect()
}

fn mem_available(fields: &HashMap<String, u64>) -> Option<u64> {
    fields.get("MemAvailable").copied().or_else(|| {
        Some(
            fields.get("MemFree")?
                + fields.get("Buffers").copied().unwrap_or(0)
                + fields.get("Cached").copied().unwrap_or(0),
        )
    })
}

/// `pswpin`/`pswpout` from `/proc/vmstat`.
pub fn parse_vmstat(vmstat: &str) -> HashMap<String, u64> {
    vmstat
        .lines()
        .filter_map(|line| {
            let (name, value) = line.split_once(' ')?;
            Some((name.to_string(), value.trim().parse().ok()?))
        })
        .collect()
}

pub fn memory_details_from(
    fields: &HashMap<String, u64>,
    vmstat: &HashMap<String, u64>,
) -> Option<MemoryDetails> {
    let get = |name: &str| fields.get(name).copied();
    let total = get("MemTotal")?;
    let free = get("MemFree").unwrap_or(0);
    let available = mem_available(fields).unwrap_or(free);
    let buffers = get("Buffers");
    let cached = get("Cached").map(|c| c + get("SReclaimable").unwrap_or(0));
    let used = total
        .saturating_sub(free)
        .saturating_sub(buffers.unwrap_or(0))
        .saturating_sub(cached.unwrap_or(0));

    let swap_total = get("SwapTotal").unwrap_or(0);
    let swap_free = get("SwapFree").unwrap_or(0);
    let swap_used = swap_total.saturating_sub(swap_free);

    Some(MemoryDetails {
        virtual_memory: VirtualMemory {
            total,
            available,
            percent: percent(total.saturating_sub(available), total),
            used,
            free,
            active: get("Active"),
            inactive: get("Inactive"),
            buffers,
            cached,
            shared: get("Shmem"),
        },
        swap_memory: SwapMemory {
            total: swap_total,
            used: swap_used,
            free: swap_free,
            percent: percent(swap_used, swap_total),
            sin_pages: vmstat.get("pswpin").copied(),
            sout_pages: vmstat.get("pswpout").copied(),
        },
    })
}

/// Number of `cpuN` lines in `/proc/stat`.
pub fn count_cores(stat: &str) -> usize {
    stat.lines()
        .filter(|l| {
            l.strip_prefix("cpu")
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_digit())
        })
        .count()
}

pub fn parse_loadavg(raw: &str) -> Option<[f64; 3]> {
    let mut fields = raw.split_whitespace().map(|f| f.parse::<f64>().ok());
    Some([fields.next()??, fields.next()??, fields.next()??])
}

pub fn parse_net_dev(raw: &str) -> Option<NetworkCounters> {
    let mut counters = NetworkCounters {
        bytes_sent: 0,
        bytes_recv: 0,
    };
    let mut seen = false;
    for line in raw.lines().skip(2) {
        let Some((_, data)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<u64> = data
            .split_whitespace()
            .filter_map(|f| f.parse().ok())
            .collect();
        if fields.len() < 9 {
            continue;
        }
        counters.bytes_recv += fields[0];
        counters.bytes_sent += fields[8];
        seen = true;
    }
    seen.then_some(counters)
}

/// `(name, utime + stime)` from `/proc/[pid]/stat`.
pub fn parse_process_stat(stat: &str) -> Option<(String, u64)> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    let name = stat.get(open + 1..close)?.to_string();
    // Fields after the name start at `state` (field 3); utime and stime are
    // fields 14 and 15.
    let rest: Vec<&str> = stat.get(close + 1..)?.split_whitespace().collect();
    let utime: u64 = rest.get(11)?.parse().ok()?;
    let stime: u64 = rest.get(12)?.parse().ok()?;
    Some((name, utime + stime))
}

pub fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|l| l.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next()?.parse().ok())
}

/// A line of `/proc/mounts` backed by a device node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
}

/// Device-backed mounts, first occurrence of each mountpoint kept.
pub fn parse_mounts(raw: &str) -> Vec<MountEntry> {
    let mut seen = HashSet::new();
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = unescape_mount(fields.next()?);
            let mountpoint = unescape_mount(fields.next()?);
            let fstype = fields.next()?.to_string();
            device.starts_with('/').then_some(MountEntry {
                device,
                mountpoint,
                fstype,
            })
        })
        .filter(|m| seen.insert(m.mountpoint.clone()))
        .collect()
}

/// Undo the octal escapes (`\040` etc.) the kernel writes in mount paths.
fn unescape_mount(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            if let Some(b) = std::str::from_utf8(&bytes[i + 1..i + 4])
                .ok()
                .and_then(|oct| u8::from_str_radix(oct, 8).ok())
            {
                out.push(b);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// One data row of `df -P -k`, in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfRow {
    pub filesystem: String,
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub mountpoint: String,
}

pub fn parse_df_rows(output: &str) -> Vec<DfRow> {
    output
        .lines()
        .skip(1)
        .filter_map(|row| {
            let fields: Vec<&str> = row.split_whitespace().collect();
            if fields.len() < 6 {
                return None;
            }
            let kib = |f: &str| f.parse::<u64>().ok().map(|v| v * 1024);
            Some(DfRow {
                filesystem: fields[0].to_string(),
                total: kib(fields[1])?,
                used: kib(fields[2])?,
                available: kib(fields[3])?,
                mountpoint: fields[5..].join(" "),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SocketEntry {
    table: SocketTable,
    local: SocketAddr,
    remote: SocketAddr,
    state: u8,
    inode: u64,
}

fn parse_socket_table(raw: &str, table: SocketTable) -> Vec<SocketEntry> {
    raw.lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 {
                return None;
            }
            Some(SocketEntry {
                table,
                local: parse_socket_addr(fields[1], table.is_v6())?,
                remote: parse_socket_addr(fields[2], table.is_v6())?,
                state: u8::from_str_radix(fields[3], 16).ok()?,
                inode: fields[9].parse().ok()?,
            })
        })
        .collect()
}

/// Decode a `/proc/net/*` address such as `0100007F:1F90`. Address words
/// are printed in host byte order, the port in network order.
pub fn parse_socket_addr(raw: &str, v6: bool) -> Option<SocketAddr> {
    let (addr, port) = raw.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;
    let ip = if v6 {
        if addr.len() != 32 {
            return None;
        }
        let mut octets = [0u8; 16];
        for (i, chunk) in octets.chunks_mut(4).enumerate() {
            let word = u32::from_str_radix(addr.get(i * 8..i * 8 + 8)?, 16).ok()?;
            chunk.copy_from_slice(&word.to_ne_bytes());
        }
        IpAddr::V6(Ipv6Addr::from(octets))
    } else {
        let word = u32::from_str_radix(addr, 16).ok()?;
        IpAddr::V4(Ipv4Addr::from(word.to_ne_bytes()))
    };
    Some(SocketAddr::new(ip, port))
}

fn format_addr(addr: &SocketAddr) -> String {
    format!("{}:{}", addr.ip(), addr.port())
}

fn is_unset(addr: &SocketAddr) -> bool {
    addr.ip().is_unspecified() && addr.port() == 0
}

fn tcp_state(code: u8) -> &'static str {
    match code {
        0x01 => "ESTABLISHED",
        0x02 => "SYN_SENT",
        0x03 => "SYN_RECV",
        0x04 => "FIN_WAIT1",
        0x05 => "FIN_WAIT2",
        0x06 => "TIME_WAIT",
        0x07 => "CLOSE",
        0x08 => "CLOSE_WAIT",
        0x09 => "LAST_ACK",
        0x0A => "LISTEN",
        0x0B => "CLOSING",
        _ => "NONE",
    }
}

fn socket_inode(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?.strip_suffix(']')?.parse().ok()
}
