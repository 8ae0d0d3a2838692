//! Message opcodes understood by the appearance layer.

/// Appearance message opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Client -> Server: rez a batch of attachments from inventory.
    RezMultipleAttachmentsFromInv = 0,
    /// Client -> Server: detach objects by local id.
    ObjectDetach = 1,
    /// Client -> Server: item worn in layer 0 of every type.
    AgentIsNowWearing = 2,
    /// Client -> Server: ask for cached bakes by fingerprint.
    AgentCachedTexture = 3,
    /// Server -> Client: answer to a cached bake query.
    AgentCachedTextureResponse = 4,
    /// Server -> Client: wearables worn at login.
    AgentWearablesUpdate = 5,
}

impl Opcode {
    /// All opcodes in wire order.
    pub const ALL: [Self; 6] = [
        Self::RezMultipleAttachmentsFromInv,
        Self::ObjectDetach,
        Self::AgentIsNowWearing,
        Self::AgentCachedTexture,
        Self::AgentCachedTextureResponse,
        Self::AgentWearablesUpdate,
    ];

    /// Converts a wire value.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Returns true for messages the client sends.
    #[must_use]
    pub const fn is_outbound(self) -> bool {
        !matches!(
            self,
            Self::AgentCachedTextureResponse | Self::AgentWearablesUpdate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(*op as usize, i);
            assert_eq!(Opcode::from_u8(i as u8), Some(*op));
        }
        assert_eq!(Opcode::from_u8(6), None);
        assert!(Opcode::ObjectDetach.is_outbound());
        assert!(!Opcode::AgentWearablesUpdate.is_outbound());
    }
}
