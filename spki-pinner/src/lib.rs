//! Public-key pinning for TLS clients.
//!
//! A [`pinning::PinValidator`] accepts a server chain only when standard trust
//! evaluation succeeds *and* some certificate in the evaluated chain carries a
//! public key whose SPKI SHA-256 digest is in the configured [`pinning::PinSet`].

pub mod pinning;
