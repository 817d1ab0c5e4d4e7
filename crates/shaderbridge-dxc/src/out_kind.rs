/// Output kinds a compile result can carry (`DXC_OUT_KIND`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutKind {
    None = 0,
    /// DXIL or SPIR-V object code
    Object = 1,
    /// Warnings and errors as text
    Errors = 2,
    Pdb = 3,
    ShaderHash = 4,
    Disassembly = 5,
    /// Preprocessed or rewritten HLSL
    Hlsl = 6,
    Text = 7,
    Reflection = 8,
    RootSignature = 9,
    ExtraOutputs = 10,
    Remarks = 11,
    TimeReport = 12,
    TimeTrace = 13,
}

impl OutKind {
    pub fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::Object,
            2 => Self::Errors,
            3 => Self::Pdb,
            4 => Self::ShaderHash,
            5 => Self::Disassembly,
            6 => Self::Hlsl,
            7 => Self::Text,
            8 => Self::Reflection,
            9 => Self::RootSignature,
            10 => Self::ExtraOutputs,
            11 => Self::Remarks,
            12 => Self::TimeReport,
            13 => Self::TimeTrace,
            _ => return None,
        })
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }
}
