/// Fixed-length face embedding used for similarity matching.
///
/// The length is fixed by whichever engine produced the descriptor; the
/// session layer never inspects individual components, it only forwards
/// them to the backend in wire form.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor(Vec<f32>);

impl Descriptor {
    pub fn new(components: Vec<f32>) -> Self {
        Self(components)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn components(&self) -> &[f32] {
        &self.0
    }

    /// Wire form: each component as a 4-byte IEEE-754 little-endian float,
    /// concatenated in order.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len() * 4);
        for component in &self.0 {
            bytes.extend_from_slice(&component.to_le_bytes());
        }
        bytes
    }

    /// Inverse of [`to_wire_bytes`](Self::to_wire_bytes). Fails when the
    /// byte count is not a multiple of 4.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, DescriptorWireError> {
        if bytes.len() % 4 != 0 {
            return Err(DescriptorWireError {
                byte_len: bytes.len(),
            });
        }
        let components = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(Self(components))
    }
}

#[derive(thiserror::Error, Debug)]
#[error("descriptor wire data must be a multiple of 4 bytes, got {byte_len}")]
pub struct DescriptorWireError {
    byte_len: usize,
}
