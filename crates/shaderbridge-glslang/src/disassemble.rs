//! SPIR-V disassembly
//!
//! Instructions are listed in binary order without rebuilding the module layout, so
//! module-scope `OpExtInst` (non-semantic debug info) is printed rather than rejected.
//! Extended instructions from `GLSL.std.450` and `OpenCL.std` are named; every other
//! set prints its instruction number.

use rspirv::binary::{Consumer, Disassemble, ParseAction};
use rspirv::dr;
use rspirv::grammar::{GlslStd450InstructionTable, OpenCLStd100InstructionTable};
use rspirv::spirv::{self, Word};
use std::collections::HashMap;

/// Human-readable text for a SPIR-V module
///
/// Returns `None` for an empty or malformed module.
pub fn disassemble(words: &[u32]) -> Option<String> {
    if words.is_empty() {
        log::error!("Invalid SPIR-V binary size: 0");
        return None;
    }

    let mut listing = Listing::default();
    match rspirv::binary::parse_words(words, &mut listing) {
        Ok(()) => Some(listing.render()),
        Err(err) => {
            log::error!("Failed to parse SPIR-V module of {} words: {:?}", words.len(), err);
            None
        }
    }
}

/// [`disassemble`] for a module stored as native-endian bytes
pub fn disassemble_bytes(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 4 != 0 {
        log::error!("Invalid SPIR-V binary size: {} bytes", bytes.len());
        return None;
    }
    let words: Vec<u32> = bytemuck::pod_collect_to_vec(bytes);
    disassemble(&words)
}

#[derive(Default)]
struct Listing {
    header: Option<dr::ModuleHeader>,
    instructions: Vec<dr::Instruction>,
    ext_inst_sets: HashMap<Word, String>,
}

impl Consumer for Listing {
    fn initialize(&mut self) -> ParseAction {
        ParseAction::Continue
    }

    fn finalize(&mut self) -> ParseAction {
        ParseAction::Continue
    }

    fn consume_header(&mut self, header: dr::ModuleHeader) -> ParseAction {
        self.header = Some(header);
        ParseAction::Continue
    }

    fn consume_instruction(&mut self, inst: dr::Instruction) -> ParseAction {
        if inst.class.opcode == spirv::Op::ExtInstImport {
            if let (Some(id), Some(dr::Operand::LiteralString(name))) =
                (inst.result_id, inst.operands.first())
            {
                self.ext_inst_sets.insert(id, name.clone());
            }
        }
        self.instructions.push(inst);
        ParseAction::Continue
    }
}

impl Listing {
    fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.instructions.len() + 1);
        if let Some(header) = &self.header {
            lines.push(header.disassemble());
        }
        for inst in &self.instructions {
            lines.push(match inst.class.opcode {
                spirv::Op::ExtInst => self.ext_inst(inst),
                _ => inst.disassemble(),
            });
        }
        lines.join("\n")
    }

    fn ext_inst(&self, inst: &dr::Instruction) -> String {
        let (Some(dr::Operand::IdRef(set)), Some(dr::Operand::LiteralExtInstInteger(opcode))) =
            (inst.operands.first(), inst.operands.get(1))
        else {
            return inst.disassemble();
        };

        let opname = match self.ext_inst_sets.get(set).map(String::as_str) {
            Some("GLSL.std.450") => GlslStd450InstructionTable::lookup_opcode(*opcode).map(|g| g.opname),
            Some("OpenCL.std") => OpenCLStd100InstructionTable::lookup_opcode(*opcode).map(|g| g.opname),
            _ => None,
        };
        let Some(opname) = opname else {
            return inst.disassemble();
        };

        let operands: Vec<String> = std::iter::once(format!("%{}", set))
            .chain(std::iter::once(opname.to_string()))
            .chain(inst.operands[2..].iter().map(|operand| operand.disassemble()))
            .collect();
        format!(
            "{}OpExtInst{} {}",
            inst.result_id.map_or(String::new(), |id| format!("%{} = ", id)),
            inst.result_type.map_or(String::new(), |ty| format!("  %{}", ty)),
            operands.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rspirv::binary::Assemble;

    fn minimal_module() -> Vec<u32> {
        let mut builder = dr::Builder::new();
        builder.set_version(1, 0);
        builder.capability(spirv::Capability::Shader);
        builder.memory_model(spirv::AddressingModel::Logical, spirv::MemoryModel::GLSL450);
        builder.type_void();
        builder.module().assemble()
    }

    /// A module whose non-semantic debug info lives at module scope, as glslang emits it
    fn debug_info_module() -> Vec<u32> {
        let mut builder = dr::Builder::new();
        builder.set_version(1, 5);
        builder.capability(spirv::Capability::Shader);
        builder.extension("SPV_KHR_non_semantic_info");
        let set = builder.ext_inst_import("NonSemantic.Shader.DebugInfo.100");
        builder.memory_model(spirv::AddressingModel::Logical, spirv::MemoryModel::GLSL450);
        let file = builder.string("shader.vert");
        let void = builder.type_void();
        let source = builder.id();
        builder.module_mut().types_global_values.push(dr::Instruction::new(
            spirv::Op::ExtInst,
            Some(void),
            Some(source),
            vec![
                dr::Operand::IdRef(set),
                dr::Operand::LiteralExtInstInteger(35),
                dr::Operand::IdRef(file),
            ],
        ));
        builder.module().assemble()
    }

    /// `debugPrintfEXT` style call inside a function, next to a GLSL.std.450 call
    fn printf_module() -> Vec<u32> {
        let mut builder = dr::Builder::new();
        builder.set_version(1, 5);
        builder.capability(spirv::Capability::Shader);
        let printf = builder.ext_inst_import("NonSemantic.DebugPrintf");
        let glsl = builder.ext_inst_import("GLSL.std.450");
        builder.memory_model(spirv::AddressingModel::Logical, spirv::MemoryModel::GLSL450);
        let format = builder.string("value %f");
        let void = builder.type_void();
        let float = builder.type_float(32);
        let one = builder.constant_f32(float, 1.0);
        let fn_type = builder.type_function(void, vec![]);
        builder
            .begin_function(void, None, spirv::FunctionControl::NONE, fn_type)
            .unwrap();
        builder.begin_block(None).unwrap();
        let root = builder
            .ext_inst(float, None, glsl, spirv::GLOp::Sqrt as u32, vec![dr::Operand::IdRef(one)])
            .unwrap();
        builder
            .ext_inst(
                void,
                None,
                printf,
                1,
                vec![dr::Operand::IdRef(format), dr::Operand::IdRef(root)],
            )
            .unwrap();
        builder.ret().unwrap();
        builder.end_function().unwrap();
        builder.module().assemble()
    }

    #[test]
    fn empty_input_returns_none() {
        let _ = env_logger::builder().is_test(true).try_init();
        assert_eq!(disassemble(&[]), None);
        assert_eq!(disassemble_bytes(&[]), None);
    }

    #[test]
    fn minimal_module_disassembles() {
        let text = disassemble(&minimal_module()).unwrap();
        assert!(text.starts_with("; SPIR-V\n; Version: 1.0"));
        assert!(text.contains("OpCapability Shader"));
        assert!(text.contains("OpMemoryModel Logical GLSL450"));
        assert!(text.contains("OpTypeVoid"));
    }

    #[test]
    fn module_scope_debug_info_is_listed() {
        let text = disassemble(&debug_info_module()).unwrap();
        assert!(text.contains("OpExtInstImport \"NonSemantic.Shader.DebugInfo.100\""));
        assert!(text.contains("OpString \"shader.vert\""));
        // %1 set, %2 string, %3 void, %4 the instruction
        assert!(text.contains("%4 = OpExtInst  %3 %1 35 %2"), "{}", text);
    }

    #[test]
    fn unknown_sets_print_numbers_known_sets_print_names() {
        let text = disassemble(&printf_module()).unwrap();
        assert!(text.contains("OpExtInstImport \"NonSemantic.DebugPrintf\""));
        assert!(text.contains("Sqrt"));
        let printf = text
            .lines()
            .find(|line| line.contains("OpExtInst ") && line.contains("%1 1 "))
            .unwrap_or_else(|| panic!("no debug printf call in:\n{}", text));
        assert!(printf.contains("OpExtInst  %"));
        assert!(text.contains("OpReturn"));
        assert!(text.contains("OpFunctionEnd"));
    }

    #[test]
    fn bytes_are_read_as_words() {
        let bytes: Vec<u8> = minimal_module()
            .iter()
            .flat_map(|word| word.to_ne_bytes())
            .collect();
        assert!(disassemble_bytes(&bytes).unwrap().contains("OpCapability Shader"));
        assert_eq!(disassemble_bytes(&bytes[..bytes.len() - 1]), None);
    }

    #[test]
    fn malformed_module_returns_none() {
        assert_eq!(disassemble(&[0xdead_beef, 0, 0, 0, 0]), None);
    }

    #[test]
    fn truncated_module_returns_none() {
        let words = minimal_module();
        assert_eq!(disassemble(&words[..words.len() - 1]), None);
    }
}
