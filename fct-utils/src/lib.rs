//! Utility library for reading packet traces of the FRR experiments

pub mod pcap_utils;
