// Mon Oct 19 2026 - Alex

pub const TEST_AL_AL: [u8; 2] = [0x84, 0xC0];
pub const TEST_EAX_EAX: [u8; 2] = [0x85, 0xC0];

pub const JZ_SHORT: u8 = 0x74;
pub const JNZ_SHORT: u8 = 0x75;
pub const JMP_SHORT: u8 = 0xEB;

pub const CMP_EAX_ZERO_IMM8: [u8; 3] = [0x83, 0xF8, 0x00];
pub const CMP_EAX_ZERO_IMM32: [u8; 5] = [0x3D, 0x00, 0x00, 0x00, 0x00];

// xor eax, eax; nop
pub const ZERO_EAX_NOP: [u8; 3] = [0x31, 0xC0, 0x90];

pub const DEFAULT_LOOKAHEAD: usize = 32;

pub fn is_boolean_test(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && (bytes[..2] == TEST_AL_AL || bytes[..2] == TEST_EAX_EAX)
}

pub fn is_short_conditional(byte: u8) -> bool {
    byte == JZ_SHORT || byte == JNZ_SHORT
}
