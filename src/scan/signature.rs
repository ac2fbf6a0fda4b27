// Mon Oct 19 2026 - Alex

use crate::scan::ScanError;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Signature {
    bytes: Vec<u8>,
    mask: Vec<bool>,
    name: Option<String>,
}

impl Signature {
    pub fn new(bytes: Vec<u8>, mask: Vec<bool>) -> Result<Self, ScanError> {
        if bytes.len() != mask.len() {
            return Err(ScanError::InvalidSignature(format!(
                "{} bytes but {} mask entries",
                bytes.len(),
                mask.len()
            )));
        }

        Ok(Self {
            bytes,
            mask,
            name: None,
        })
    }

    /// Parses `"84 C0 ?? 75"` style text. `?` and `??` are wildcards.
    pub fn from_hex(hex: &str) -> Result<Self, ScanError> {
        let mut bytes = Vec::new();
        let mut mask = Vec::new();

        for part in hex.split_whitespace() {
            if part == "??" || part == "?" {
                bytes.push(0);
                mask.push(false);
            } else {
                let byte = u8::from_str_radix(part, 16)
                    .map_err(|_| ScanError::InvalidSignature(format!("bad token '{}'", part)))?;
                bytes.push(byte);
                mask.push(true);
            }
        }

        if bytes.is_empty() {
            return Err(ScanError::EmptySignature);
        }

        Ok(Self {
            bytes,
            mask,
            name: None,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            mask: vec![true; bytes.len()],
            name: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        if data.len() < self.bytes.len() {
            return false;
        }

        self.bytes.iter()
            .zip(self.mask.iter())
            .zip(data.iter())
            .all(|((expected, &significant), &actual)| !significant || *expected == actual)
    }

    pub fn significant_byte_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn to_hex_string(&self) -> String {
        self.bytes.iter()
            .zip(self.mask.iter())
            .map(|(b, &m)| if m { format!("{:02X}", b) } else { "??".to_string() })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.name {
            write!(f, "{}: ", name)?;
        }
        write!(f, "{}", self.to_hex_string())
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.mask == other.mask
    }
}

impl Eq for Signature {}

#[derive(Default)]
pub struct SignatureBuilder {
    bytes: Vec<u8>,
    mask: Vec<bool>,
    name: Option<String>,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte(mut self, b: u8) -> Self {
        self.bytes.push(b);
        self.mask.push(true);
        self
    }

    pub fn bytes(mut self, bs: &[u8]) -> Self {
        for &b in bs {
            self.bytes.push(b);
            self.mask.push(true);
        }
        self
    }

    pub fn wildcards(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.bytes.push(0);
            self.mask.push(false);
        }
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<Signature, ScanError> {
        if self.bytes.is_empty() {
            return Err(ScanError::EmptySignature);
        }

        Ok(Signature {
            bytes: self.bytes,
            mask: self.mask,
            name: self.name,
        })
    }
}
