//! SPIR-V disassembly entry point

use crate::{guard, into_c_string};
use std::os::raw::c_char;
use std::ptr;

/// Disassemble `count` SPIR-V words into a string released with `shaderbridge_free_string`
///
/// Returns null, allocating nothing, for an empty or malformed module.
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_spirv_disassemble(words: *const u32, count: usize) -> *mut c_char {
    let words: &[u32] = if count == 0 {
        &[]
    } else if words.is_null() {
        log::error!("Null SPIR-V binary with {} words", count);
        return ptr::null_mut();
    } else {
        std::slice::from_raw_parts(words, count)
    };

    guard("shaderbridge_spirv_disassemble", ptr::null_mut(), || {
        shaderbridge_glslang::disassemble(words).map_or(ptr::null_mut(), into_c_string)
    })
}
