pub mod builder;
pub mod diagnostics;
pub mod dot;
pub mod fingerprint;
pub mod graph;
pub mod key;
pub mod node;
pub mod ports;
pub mod semantic;
