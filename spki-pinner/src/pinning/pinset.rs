use crate::pinning::digest::SpkiDigest;
use crate::pinning::errors::PinError;
use std::collections::HashSet;

/// Immutable allow-list of SPKI digests.
///
/// `PinSet::default()` is empty. A validator holding an empty set rejects every
/// chain; it never treats "no pins" as "pinning disabled".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinSet {
    digests: HashSet<SpkiDigest>,
}

impl PinSet {
    /// Builds a pin set from base64 pins. Fails on an empty list or on any
    /// entry that is not a 32-byte SHA-256 digest.
    pub fn new<I, S>(pins: I) -> Result<Self, PinError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let digests = pins
            .into_iter()
            .map(|pin| SpkiDigest::from_base64(pin.as_ref()))
            .collect::<Result<HashSet<_>, _>>()?;
        if digests.is_empty() {
            return Err(PinError::EmptyPinSet);
        }
        Ok(Self { digests })
    }

    pub fn from_digests<I: IntoIterator<Item = SpkiDigest>>(digests: I) -> Self {
        Self {
            digests: digests.into_iter().collect(),
        }
    }

    pub fn contains(&self, digest: &SpkiDigest) -> bool {
        self.digests.contains(digest)
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpkiDigest> {
        self.digests.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIN_A: &str = "TsshcWS7+i8HqvxNXGlWB7MciqndwD5+pLaEf3v1c7o=";
    const PIN_B: &str = "klO23nT2ehFDXCfx3eHTDRESMz3asj1muO+4aIdjiuY=";

    #[test]
    fn empty_list_is_a_configuration_error() {
        let err = PinSet::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, PinError::EmptyPinSet));
    }

    #[test]
    fn one_bad_entry_fails_the_whole_set() {
        let err = PinSet::new([PIN_A, "definitely-not-a-pin"]).unwrap_err();
        assert!(matches!(err, PinError::InvalidPin(_)));
    }

    #[test]
    fn order_and_duplicates_do_not_matter() {
        let forward = PinSet::new([PIN_A, PIN_B]).unwrap();
        let reversed = PinSet::new([PIN_B, PIN_A, PIN_B]).unwrap();
        assert_eq!(forward, reversed);
        assert_eq!(reversed.len(), 2);
        assert!(reversed.contains(&SpkiDigest::from_base64(PIN_A).unwrap()));
    }

    #[test]
    fn error_messages_do_not_echo_pins() {
        let err = PinSet::new([PIN_A, "AAAA"]).unwrap_err();
        assert!(!err.to_string().contains(PIN_A));
    }
}
