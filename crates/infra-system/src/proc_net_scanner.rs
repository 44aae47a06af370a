// Port scanner over /proc/net
// reason: the kernel socket tables plus /proc/<pid>/fd give socket owners
// without shelling out to ss/netstat
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use hostspec_core::domain::{PortTable, ProcessDescriptor, Protocol};
use hostspec_core::port::PortScanner;

/// Kernel TCP state code for LISTEN
const TCP_LISTEN: u8 = 0x0A;

/// Socket tables in scan order; earlier tables win key collisions
const SOCKET_TABLES: [(&str, Protocol); 4] = [
    ("net/tcp", Protocol::Tcp),
    ("net/tcp6", Protocol::Tcp6),
    ("net/udp", Protocol::Udp),
    ("net/udp6", Protocol::Udp6),
];

/// One row of a /proc/net socket table
#[derive(Debug, Clone, PartialEq, Eq)]
struct SocketRow {
    protocol: Protocol,
    local_addr: IpAddr,
    local_port: u16,
    state: u8,
    inode: u64,
}

impl SocketRow {
    /// TCP sockets in LISTEN, and every UDP socket
    fn is_listening(&self) -> bool {
        self.protocol.is_udp() || self.state == TCP_LISTEN
    }
}

pub struct ProcNetScanner {
    proc_root: PathBuf,
}

impl ProcNetScanner {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Scan a procfs mounted somewhere other than /proc
    pub fn with_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl Default for ProcNetScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PortScanner for ProcNetScanner {
    async fn scan(&self) -> PortTable {
        let root = self.proc_root.clone();
        match tokio::task::spawn_blocking(move || scan_blocking(&root)).await {
            Ok(descriptors) => PortTable::from_descriptors(Utc::now(), descriptors),
            Err(e) => {
                warn!(error = %e, "Port scan task failed; using empty table");
                PortTable::from_descriptors(Utc::now(), Vec::new())
            }
        }
    }
}

fn scan_blocking(root: &Path) -> Vec<ProcessDescriptor> {
    let mut rows = Vec::new();
    for (table, protocol) in SOCKET_TABLES {
        match fs::read_to_string(root.join(table)) {
            Ok(content) => rows.extend(
                parse_proc_net(&content, protocol)
                    .into_iter()
                    .filter(SocketRow::is_listening),
            ),
            Err(e) => debug!(table = %table, error = %e, "Socket table unreadable; skipped"),
        }
    }

    let owners = build_inode_pid_map(root);
    let mut names: HashMap<u32, Option<String>> = HashMap::new();

    let descriptors: Vec<ProcessDescriptor> = rows
        .into_iter()
        .map(|row| {
            let pid = owners.get(&row.inode).copied();
            let name = pid.and_then(|pid| {
                names
                    .entry(pid)
                    .or_insert_with(|| process_name(root, pid))
                    .clone()
            });
            ProcessDescriptor {
                pid,
                name,
                local_addr: row.local_addr,
                local_port: row.local_port,
                protocol: row.protocol,
            }
        })
        .collect();

    debug!(
        sockets = descriptors.len(),
        owned = descriptors.iter().filter(|d| d.pid.is_some()).count(),
        "Socket tables read"
    );
    descriptors
}

/// Rows of one socket table. Malformed lines are skipped.
fn parse_proc_net(content: &str, protocol: Protocol) -> Vec<SocketRow> {
    let is_ipv6 = matches!(protocol, Protocol::Tcp6 | Protocol::Udp6);

    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 10 {
                return None;
            }
            let (addr_hex, port_hex) = parts[1].split_once(':')?;
            Some(SocketRow {
                protocol,
                local_addr: parse_hex_addr(addr_hex, is_ipv6)?,
                local_port: u16::from_str_radix(port_hex, 16).ok()?,
                state: u8::from_str_radix(parts[3], 16).ok()?,
                inode: parts[9].parse().ok()?,
            })
        })
        .collect()
}

/// Kernel address text: each 32-bit word printed in host byte order
fn parse_hex_addr(hex: &str, is_ipv6: bool) -> Option<IpAddr> {
    let words = hex_words(hex)?;
    match (is_ipv6, words.as_slice()) {
        (false, [word]) => Some(IpAddr::V4(Ipv4Addr::from(word.to_ne_bytes()))),
        (true, [a, b, c, d]) => {
            let mut bytes = [0u8; 16];
            for (chunk, word) in bytes.chunks_exact_mut(4).zip([a, b, c, d]) {
                chunk.copy_from_slice(&word.to_ne_bytes());
            }
            Some(IpAddr::V6(Ipv6Addr::from(bytes)))
        }
        _ => None,
    }
}

fn hex_words(hex: &str) -> Option<Vec<u32>> {
    if hex.is_empty() || hex.len() % 8 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(8)
        .map(|i| u32::from_str_radix(&hex[i..i + 8], 16).ok())
        .collect()
}

/// Socket inode -> owning pid, from the `socket:[N]` links under /proc/<pid>/fd.
/// Processes whose fd directory cannot be read (permissions, exited) are skipped.
fn build_inode_pid_map(root: &Path) -> HashMap<u64, u32> {
    let mut map = HashMap::new();

    let Ok(entries) = fs::read_dir(root) else {
        return map;
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else {
            continue;
        };
        let Ok(fds) = fs::read_dir(entry.path().join("fd")) else {
            continue;
        };
        for fd in fds.filter_map(|e| e.ok()) {
            let Ok(link) = fs::read_link(fd.path()) else {
                continue;
            };
            let inode = link
                .to_str()
                .and_then(|s| s.strip_prefix("socket:["))
                .and_then(|s| s.strip_suffix(']'))
                .and_then(|s| s.parse::<u64>().ok());
            if let Some(inode) = inode {
                map.entry(inode).or_insert(pid);
            }
        }
    }

    map
}

fn process_name(root: &Path, pid: u32) -> Option<String> {
    fs::read_to_string(root.join(pid.to_string()).join("comm"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostspec_core::domain::PortKey;

    const TCP_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

    fn tcp_line(local: &str, state: &str, inode: u64) -> String {
        format!(
            "   0: {} 00000000:0000 {} 00000000:00000000 00:00000000 00000000     0        0 {} 1 0000000000000000 100 0 0 10 0",
            local, state, inode
        )
    }

    #[test]
    fn test_parse_proc_net_rows() {
        let content = format!(
            "{}\n{}\n{}\ngarbage line\n",
            TCP_HEADER,
            tcp_line("0100007F:0016", "0A", 1001),
            tcp_line("0100007F:C350", "01", 1002),
        );

        let rows = parse_proc_net(&content, Protocol::Tcp);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].local_port, 22);
        assert_eq!(rows[0].inode, 1001);
        assert!(rows[0].is_listening());
        assert_eq!(rows[1].local_port, 50000);
        assert!(!rows[1].is_listening());
    }

    #[test]
    fn test_udp_rows_always_listening() {
        let content = format!("{}\n{}\n", TCP_HEADER, tcp_line("00000000:0035", "07", 7));
        let rows = parse_proc_net(&content, Protocol::Udp);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_listening());
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_parse_hex_addr() {
        assert_eq!(
            parse_hex_addr("0100007F", false),
            Some(IpAddr::V4(Ipv4Addr::LOCALHOST))
        );
        assert_eq!(
            parse_hex_addr("00000000000000000000000001000000", true),
            Some(IpAddr::V6(Ipv6Addr::LOCALHOST))
        );
        assert_eq!(parse_hex_addr("7F", false), None);
        assert_eq!(parse_hex_addr("0100007F", true), None);
        assert_eq!(parse_hex_addr("zz00007F", false), None);
    }

    #[tokio::test]
    async fn test_scan_fixture_root() {
        let root = tempfile::tempdir().unwrap();
        let net = root.path().join("net");
        fs::create_dir(&net).unwrap();
        fs::write(
            net.join("tcp"),
            format!(
                "{}\n{}\n{}\n",
                TCP_HEADER,
                tcp_line("00000000:0016", "0A", 4001),
                tcp_line("0100007F:1F90", "0A", 4002),
            ),
        )
        .unwrap();
        fs::write(
            net.join("udp"),
            format!("{}\n{}\n", TCP_HEADER, tcp_line("00000000:0044", "07", 4003)),
        )
        .unwrap();

        let proc_dir = root.path().join("812");
        fs::create_dir_all(proc_dir.join("fd")).unwrap();
        fs::write(proc_dir.join("comm"), "sshd\n").unwrap();
        std::os::unix::fs::symlink("socket:[4001]", proc_dir.join("fd").join("3")).unwrap();
        std::os::unix::fs::symlink("/dev/null", proc_dir.join("fd").join("0")).unwrap();

        let table = ProcNetScanner::with_root(root.path()).scan().await;
        assert_eq!(table.len(), 3);

        let ssh = table.get(&PortKey::new(Protocol::Tcp, 22)).unwrap();
        assert_eq!(ssh.pid, Some(812));
        assert_eq!(ssh.name.as_deref(), Some("sshd"));

        let web = table.get(&PortKey::new(Protocol::Tcp, 8080)).unwrap();
        assert_eq!(web.pid, None);
        assert_eq!(web.name, None);

        assert!(table.get(&PortKey::new(Protocol::Udp, 68)).is_some());
        assert!(table.get(&PortKey::new(Protocol::Tcp6, 22)).is_none());
    }

    #[tokio::test]
    async fn test_missing_root_yields_empty_table() {
        let table = ProcNetScanner::with_root("/nonexistent/proc").scan().await;
        assert!(table.is_empty());
    }
}
