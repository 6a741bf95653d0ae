//! Module to read captured packet traces into an ordered list of decoded packet records.

use std::{
    borrow::Borrow,
    fs::File,
    io::{BufReader, BufWriter, Read},
    net::IpAddr,
    path::Path,
    time::Duration,
};

use etherparse::{InternetSlice, SlicedPacket, TransportSlice};
use flate2::bufread::GzDecoder;
use pcap_file::{
    pcap::{PcapHeader, PcapPacket, PcapReader, PcapWriter},
    DataLink,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pcap error: {0}")]
    Pcap(#[from] pcap_file::PcapError),
    #[error("Unsupported link type: {0:?}")]
    UnsupportedLinkType(DataLink),
}

/// Bits of the TCP flag byte.
pub mod tcp_flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
    pub const ECE: u8 = 0x40;
    pub const CWR: u8 = 0x80;
}

/// TCP header fields of a decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TcpRecord {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub ack: u32,
    pub window: u16,
    pub flags: u8,
}

impl TcpRecord {
    /// Check that all bits of `mask` are set in the flag byte.
    pub fn has_flags(&self, mask: u8) -> bool {
        self.flags & mask == mask
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transport {
    Tcp(TcpRecord),
    Udp { src_port: u16, dst_port: u16 },
}

/// A single packet as read from a capture file.
///
/// Frames that cannot be decoded down to the network layer are still kept (with only their
/// timestamp and length), such that the record sequence mirrors the capture one to one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketRecord {
    /// capture timestamp in seconds
    pub time: f64,
    /// original length of the frame on the wire
    pub len: u32,
    pub src_ip: Option<IpAddr>,
    pub dst_ip: Option<IpAddr>,
    pub transport: Option<Transport>,
}

impl PacketRecord {
    /// Returns the TCP layer of this packet, if it has one.
    pub fn tcp(&self) -> Option<&TcpRecord> {
        match &self.transport {
            Some(Transport::Tcp(tcp)) => Some(tcp),
            _ => None,
        }
    }
}

/// Read all packets of a capture file, in capture order. Files ending in `.gz` are decompressed
/// on the fly. The file handle is released before returning.
pub fn read_pcap(filename: impl AsRef<Path>) -> Result<Vec<PacketRecord>, Error> {
    let filename = filename.as_ref();
    log::trace!("reading packets from {filename:?}");
    let bufreader = BufReader::new(File::open(filename)?);
    if filename.extension().is_some_and(|ext| ext == "gz") {
        read_packets(GzDecoder::new(bufreader))
    } else {
        read_packets(bufreader)
    }
}

/// Decode all packets of a pcap stream.
pub fn read_packets<R: Read>(reader: R) -> Result<Vec<PacketRecord>, Error> {
    let mut cap = PcapReader::new(reader)?;
    let datalink = cap.header().datalink;
    if !is_supported(datalink) {
        return Err(Error::UnsupportedLinkType(datalink));
    }

    let mut packets = Vec::new();
    while let Some(packet) = cap.next_packet() {
        let packet = packet?;
        packets.push(decode(datalink, &packet));
    }
    Ok(packets)
}

fn is_supported(datalink: DataLink) -> bool {
    matches!(
        datalink,
        DataLink::ETHERNET
            | DataLink::PPP
            | DataLink::RAW
            | DataLink::IPV4
            | DataLink::IPV6
            | DataLink::LINUX_SLL
    )
}

fn decode(datalink: DataLink, packet: &PcapPacket<'_>) -> PacketRecord {
    let mut record = PacketRecord {
        time: packet.timestamp.as_secs_f64(),
        len: packet.orig_len,
        src_ip: None,
        dst_ip: None,
        transport: None,
    };

    let data: &[u8] = packet.data.borrow();
    let sliced = match datalink {
        DataLink::ETHERNET => SlicedPacket::from_ethernet(data).ok(),
        DataLink::PPP => strip_ppp(data).and_then(|ip| SlicedPacket::from_ip(ip).ok()),
        DataLink::LINUX_SLL => strip_sll(data).and_then(|ip| SlicedPacket::from_ip(ip).ok()),
        _ => SlicedPacket::from_ip(data).ok(),
    };
    let Some(pkt) = sliced else {
        return record;
    };

    match &pkt.net {
        Some(InternetSlice::Ipv4(ip)) => {
            record.src_ip = Some(ip.header().source_addr().into());
            record.dst_ip = Some(ip.header().destination_addr().into());
        }
        Some(InternetSlice::Ipv6(ip)) => {
            record.src_ip = Some(ip.header().source_addr().into());
            record.dst_ip = Some(ip.header().destination_addr().into());
        }
        _ => {}
    }

    record.transport = match &pkt.transport {
        Some(TransportSlice::Tcp(tcp)) => Some(Transport::Tcp(TcpRecord {
            src_port: tcp.source_port(),
            dst_port: tcp.destination_port(),
            seq: tcp.sequence_number(),
            ack: tcp.acknowledgment_number(),
            window: tcp.window_size(),
            flags: [
                (tcp.fin(), tcp_flags::FIN),
                (tcp.syn(), tcp_flags::SYN),
                (tcp.rst(), tcp_flags::RST),
                (tcp.psh(), tcp_flags::PSH),
                (tcp.ack(), tcp_flags::ACK),
                (tcp.urg(), tcp_flags::URG),
                (tcp.ece(), tcp_flags::ECE),
                (tcp.cwr(), tcp_flags::CWR),
            ]
            .into_iter()
            .filter(|(set, _)| *set)
            .fold(0, |flags, (_, bit)| flags | bit),
        })),
        Some(TransportSlice::Udp(udp)) => Some(Transport::Udp {
            src_port: udp.source_port(),
            dst_port: udp.destination_port(),
        }),
        _ => None,
    };

    record
}

/// Strip the PPP header (as written by ns-3 point-to-point devices), returning the IP payload.
/// The address and control fields (`0xff 0x03`) are optional.
fn strip_ppp(data: &[u8]) -> Option<&[u8]> {
    let data = data.strip_prefix(&[0xff, 0x03]).unwrap_or(data);
    match data {
        [0x00, 0x21, payload @ ..] | [0x00, 0x57, payload @ ..] => Some(payload),
        _ => None,
    }
}

/// Strip the 16 byte Linux cooked capture header, returning the IP payload.
fn strip_sll(data: &[u8]) -> Option<&[u8]> {
    if data.len() < 16 {
        return None;
    }
    match u16::from_be_bytes([data[14], data[15]]) {
        0x0800 | 0x86dd => Some(&data[16..]),
        _ => None,
    }
}

/// Write raw frames of the given link type to a new pcap file. Each frame is given as a
/// timestamp in seconds and the frame bytes.
pub fn write_pcap<P, I, D>(filename: P, datalink: DataLink, frames: I) -> Result<(), Error>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (f64, D)>,
    D: AsRef<[u8]>,
{
    let file = BufWriter::new(File::create(filename)?);
    let header = PcapHeader {
        datalink,
        ..Default::default()
    };
    let mut writer = PcapWriter::with_header(file, header)?;
    for (time, frame) in frames {
        let frame = frame.as_ref();
        writer.write_packet(&PcapPacket::new(
            Duration::from_secs_f64(time),
            frame.len() as u32,
            frame,
        ))?;
    }
    Ok(())
}
