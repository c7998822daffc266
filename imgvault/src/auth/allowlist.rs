use std::collections::HashSet;

/// Public keys approved for uploading, as hex strings.
///
/// Built once from configuration. An empty list disables the check and every syntactically valid
/// key is permitted. Membership is exact string equality on the hex as received, so `ABCD..` and
/// `abcd..` are different keys.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    keys: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether any keys are configured
    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns true if `pubkey_hex` may upload.
    pub fn permits(&self, pubkey_hex: &str) -> bool {
        !self.is_enabled() || self.keys.contains(pubkey_hex)
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
