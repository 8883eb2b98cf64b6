//! # nsisim - Configuration generator for simulated NSI network federations
//!
//! This library turns the NSA and NML topology documents published by an
//! NSI-DDS discovery service into the configuration files needed to run a
//! simulated copy of the federation: one provider (OpenNSA-style) and one
//! resource-manager (SENSE-RM-style) instance per discovered network,
//! plus the scripts to start, stop, and bootstrap them.
//!
//! ## Overview
//!
//! The heart of the crate is the topology resolution engine in
//! [`resolver`]: it walks every discovered topology document, produces one
//! port descriptor per bidirectional port, and resolves cross-topology
//! `isAlias` references into human-readable remote endpoints. Everything
//! around it is document fetching, parsing, and file rendering.
//!
//! ## Architecture
//!
//! - `stp`: URN identifier parsing, canonicalization, and sanitization
//! - `nml`: DDS/NSA/NML document parsing (including a small XML subset
//!   parser)
//! - `resolver`: the topology resolution engine
//! - `dds`: synchronous DDS document-store client
//! - `peers`: optional hand-authored port overlay (YAML)
//! - `writer`: template filling and configuration file emission
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nsisim::{dds::DdsClient, resolver};
//!
//! let dds = DdsClient::new("http://localhost:8401/dds");
//! let nsas = dds.get_nsa_documents()?;
//! let topologies = dds.get_topology_documents(&nsas)?;
//!
//! // One descriptor per simulated physical port, aliases resolved
//! // across all topologies.
//! let ports = resolver::resolve(&topologies);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library modules expose typed errors (`StpError`, `NmlError`,
//! `DdsError`) via `thiserror`; the wiring layers use
//! `color_eyre::Result` with context. Field-level anomalies inside a
//! topology (a malformed port identifier, an unresolvable alias) are
//! logged and skipped rather than failing the run.

pub mod dds;
pub mod nml;
pub mod peers;
pub mod resolver;
pub mod stp;
pub mod writer;
