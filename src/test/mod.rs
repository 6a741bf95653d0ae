// FRR-FCT: Flow Completion Times of Fast-Reroute Experiments
// Copyright (C) 2024-2025 The FRR-FCT authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Fixtures shared by the tests: synthetic traces written to per-test temporary directories.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use etherparse::PacketBuilder;
use flate2::{write::GzEncoder, Compression};
use pcap_file::DataLink;

use fct_utils::pcap_utils::{tcp_flags, write_pcap};

mod pipeline;

/// Capture time in seconds and the raw frame.
pub type Frame = (f64, Vec<u8>);

/// Temporary directory that is removed when dropped.
pub struct TestDir(PathBuf);

impl TestDir {
    pub fn new(name: &str) -> Self {
        let mut path = std::env::temp_dir();
        path.push(format!("frr-fct-{}-{name}", std::process::id()));
        if path.exists() {
            fs::remove_dir_all(&path).unwrap();
        }
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// PPP framed packet as written by ns-3 point-to-point devices.
fn ppp(time: f64, ip_packet: Vec<u8>) -> Frame {
    let mut frame = vec![0x00, 0x21];
    frame.extend(ip_packet);
    (time, frame)
}

/// TCP segment from the traffic sender with the given flags.
pub fn tcp(time: f64, flags: u8) -> Frame {
    let mut builder =
        PacketBuilder::ipv4([10, 1, 1, 1], [10, 1, 4, 2], 64).tcp(49153, 50000, 1000, 65535);
    if flags & tcp_flags::FIN != 0 {
        builder = builder.fin();
    }
    if flags & tcp_flags::SYN != 0 {
        builder = builder.syn();
    }
    if flags & tcp_flags::RST != 0 {
        builder = builder.rst();
    }
    if flags & tcp_flags::PSH != 0 {
        builder = builder.psh();
    }
    if flags & tcp_flags::ACK != 0 {
        builder = builder.ack(1);
    }
    let mut packet = Vec::with_capacity(builder.size(0));
    builder.write(&mut packet, &[]).unwrap();
    ppp(time, packet)
}

/// UDP datagram of the congestion traffic.
pub fn udp(time: f64) -> Frame {
    let builder = PacketBuilder::ipv4([10, 1, 3, 1], [10, 1, 4, 2], 64).udp(49153, 9);
    let payload = [0u8; 32];
    let mut packet = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut packet, &payload).unwrap();
    ppp(time, packet)
}

/// Write a PPP trace, creating all parent directories.
pub fn write_trace(path: impl AsRef<Path>, frames: &[Frame]) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    write_pcap(path, DataLink::PPP, frames.iter().map(|(t, f)| (*t, f))).unwrap();
}

/// Write a gzip-compressed PPP trace, creating all parent directories.
pub fn write_gz_trace(path: impl AsRef<Path>, frames: &[Frame]) {
    let path = path.as_ref();
    let mut plain = path.to_path_buf();
    plain.set_extension("");
    write_trace(&plain, frames);
    let mut encoder = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
    encoder.write_all(&fs::read(&plain).unwrap()).unwrap();
    encoder.finish().unwrap();
    fs::remove_file(plain).unwrap();
}

/// Trace of a complete flow that closes at `fct`.
pub fn flow(fct: f64) -> Vec<Frame> {
    vec![
        tcp(0.1, tcp_flags::SYN),
        tcp(0.2, tcp_flags::ACK),
        udp(0.3),
        tcp(fct, tcp_flags::FIN | tcp_flags::ACK),
        tcp(fct + 0.5, tcp_flags::FIN | tcp_flags::ACK),
    ]
}
