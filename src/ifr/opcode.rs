// Mon Oct 19 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;

/// The subset of UEFI IFR opcodes the engine cares about. Anything else is
/// carried as `Unknown` and skipped by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IfrOpcode {
    Form,
    SuppressIf,
    FormSet,
    EqIdVal,
    EqIdId,
    EqIdValList,
    And,
    Or,
    Not,
    GrayOutIf,
    DisableIf,
    End,
    True,
    False,
    Unknown(u8),
}

impl IfrOpcode {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x01 => IfrOpcode::Form,
            0x0A => IfrOpcode::SuppressIf,
            0x0E => IfrOpcode::FormSet,
            0x12 => IfrOpcode::EqIdVal,
            0x13 => IfrOpcode::EqIdId,
            0x14 => IfrOpcode::EqIdValList,
            0x15 => IfrOpcode::And,
            0x16 => IfrOpcode::Or,
            0x17 => IfrOpcode::Not,
            0x19 => IfrOpcode::GrayOutIf,
            0x1E => IfrOpcode::DisableIf,
            0x29 => IfrOpcode::End,
            0x46 => IfrOpcode::True,
            0x47 => IfrOpcode::False,
            other => IfrOpcode::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            IfrOpcode::Form => 0x01,
            IfrOpcode::SuppressIf => 0x0A,
            IfrOpcode::FormSet => 0x0E,
            IfrOpcode::EqIdVal => 0x12,
            IfrOpcode::EqIdId => 0x13,
            IfrOpcode::EqIdValList => 0x14,
            IfrOpcode::And => 0x15,
            IfrOpcode::Or => 0x16,
            IfrOpcode::Not => 0x17,
            IfrOpcode::GrayOutIf => 0x19,
            IfrOpcode::DisableIf => 0x1E,
            IfrOpcode::End => 0x29,
            IfrOpcode::True => 0x46,
            IfrOpcode::False => 0x47,
            IfrOpcode::Unknown(b) => b,
        }
    }

    pub fn guard_kind(self) -> Option<GuardKind> {
        match self {
            IfrOpcode::SuppressIf => Some(GuardKind::SuppressIf),
            IfrOpcode::GrayOutIf => Some(GuardKind::GrayOutIf),
            IfrOpcode::DisableIf => Some(GuardKind::DisableIf),
            _ => None,
        }
    }

    /// Conditions a guard may consume that are safe to swap for `False`.
    pub fn is_patchable_condition(self) -> bool {
        matches!(
            self,
            IfrOpcode::True | IfrOpcode::EqIdVal | IfrOpcode::EqIdId | IfrOpcode::Not
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            IfrOpcode::Form => "Form",
            IfrOpcode::SuppressIf => "SuppressIf",
            IfrOpcode::FormSet => "FormSet",
            IfrOpcode::EqIdVal => "EqIdVal",
            IfrOpcode::EqIdId => "EqIdId",
            IfrOpcode::EqIdValList => "EqIdValList",
            IfrOpcode::And => "And",
            IfrOpcode::Or => "Or",
            IfrOpcode::Not => "Not",
            IfrOpcode::GrayOutIf => "GrayOutIf",
            IfrOpcode::DisableIf => "DisableIf",
            IfrOpcode::End => "End",
            IfrOpcode::True => "True",
            IfrOpcode::False => "False",
            IfrOpcode::Unknown(_) => "Unknown",
        }
    }
}

impl From<u8> for IfrOpcode {
    fn from(byte: u8) -> Self {
        IfrOpcode::from_byte(byte)
    }
}

impl fmt::Display for IfrOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IfrOpcode::Unknown(b) => write!(f, "Unknown(0x{:02X})", b),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardKind {
    SuppressIf,
    GrayOutIf,
    DisableIf,
}

impl GuardKind {
    pub const ALL: [GuardKind; 3] = [GuardKind::SuppressIf, GuardKind::GrayOutIf, GuardKind::DisableIf];

    pub fn opcode(self) -> IfrOpcode {
        match self {
            GuardKind::SuppressIf => IfrOpcode::SuppressIf,
            GuardKind::GrayOutIf => IfrOpcode::GrayOutIf,
            GuardKind::DisableIf => IfrOpcode::DisableIf,
        }
    }
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode().name())
    }
}
