// src/monitor/netdev.rs

//! Parser for the `/proc/<pid>/net/dev` table.

use super::telemetry::NetDevCounters;

/// Parse the contents of a `net/dev` file.
///
/// The first two lines are headers. Each following line looks like
///
/// ```text
///   eth0: 1234 10 0 0 0 0 0 0 5678 12 0 0 0 0 0 0
/// ```
///
/// where the first eight numbers are receive counters and the next eight are
/// transmit counters. Malformed lines are skipped.
pub fn parse_net_dev(contents: &str) -> Vec<NetDevCounters> {
    contents
        .lines()
        .skip(2)
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<NetDevCounters> {
    let (interface, counters) = line.split_once(':')?;
    let fields: Vec<u64> = counters
        .split_whitespace()
        .map(|f| f.parse().ok())
        .collect::<Option<Vec<_>>>()?;

    if fields.len() < 10 {
        return None;
    }

    Some(NetDevCounters {
        interface: interface.trim().to_string(),
        rx_bytes: fields[0],
        rx_packets: fields[1],
        tx_bytes: fields[8],
        tx_packets: fields[9],
    })
}
