//! Encodes a [`Module`] to binary format.
//!
//! The inverse of [`crate::parser::decode`]. Sections are written in the
//! order the module stores them, each as:
//!
//! ```text
//! section_id: u8 | byte_length: vu32 | contents: byte*
//! ```
//!
//! All integers use minimal LEB128, so a module decoded from canonical bytes
//! encodes back to the same bytes.
//!
//! # Example
//!
//! ```
//! use wasmtiny::encoder;
//! use wasmtiny::parser::module::Module;
//!
//! let bytes = encoder::encode(&Module::new()).unwrap();
//! assert_eq!(bytes, b"\0asm\x01\x00\x00\x00");
//! ```

use crate::parser::encoding::{
    write_name, write_u8vec, write_vec, write_vu32, DATA_ACTIVE, DATA_ACTIVE_EXPLICIT, DATA_PASSIVE, DESC_FUNC,
    DESC_GLOBAL, DESC_MEMORY, DESC_TABLE, ELEM_ACTIVE_FUNCS, LIMITS_MIN, LIMITS_MIN_MAX, MUT_CONST, MUT_VAR, TYPE_FUNC,
};
use crate::parser::instruction::encode_expr;
use crate::parser::module::{
    Code, Data, DataMode, Element, Export, ExportDesc, FuncType, Global, GlobalType, Import, ImportDesc, Limits, Module,
    Mutability, Section, TableType,
};

// ===========================================================================
// Error type
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// A construct the decoder also refuses, such as type-indexed block types
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("invalid limits: {0}")]
    InvalidLimits(Limits),
}

// ===========================================================================
// Public API
// ===========================================================================

/// Encodes a module to binary format.
pub fn encode(module: &Module) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&module.magic());
    buf.extend_from_slice(&module.version());

    for section in module.sections() {
        let mut contents = Vec::new();
        encode_section_contents(&mut contents, section)?;
        emit_section(&mut buf, section.id(), &contents);
    }

    Ok(buf)
}

fn encode_section_contents(buf: &mut Vec<u8>, section: &Section) -> Result<(), EncodeError> {
    match section {
        Section::Custom(custom) => {
            write_name(buf, &custom.name);
            buf.extend_from_slice(&custom.bytes);
        }
        Section::Type(types) => write_vec(buf, types, emit_func_type),
        Section::Import(imports) => try_write_vec(buf, imports, emit_import)?,
        Section::Function(indices) => write_vec(buf, indices, |b, idx| write_vu32(b, *idx)),
        Section::Table(tables) => try_write_vec(buf, tables, emit_table_type)?,
        Section::Memory(memories) => try_write_vec(buf, memories, |b, m| emit_limits(b, &m.limits))?,
        Section::Global(globals) => try_write_vec(buf, globals, emit_global)?,
        Section::Export(exports) => write_vec(buf, exports, emit_export),
        Section::Start(idx) => write_vu32(buf, *idx),
        Section::Element(elements) => try_write_vec(buf, elements, emit_element)?,
        Section::Code(codes) => try_write_vec(buf, codes, emit_code)?,
        Section::Data(data) => try_write_vec(buf, data, emit_data)?,
        Section::DataCount(count) => write_vu32(buf, *count),
    }
    Ok(())
}

// ===========================================================================
// Section entries
// ===========================================================================

/// ```text
/// functype ::= 0x60 vec(valtype) vec(valtype)
/// ```
fn emit_func_type(buf: &mut Vec<u8>, ft: &FuncType) {
    buf.push(TYPE_FUNC);
    write_vec(buf, &ft.params, |b, vt| b.push(vt.to_byte()));
    write_vec(buf, &ft.results, |b, vt| b.push(vt.to_byte()));
}

/// ```text
/// import     ::= module:name name:name importdesc
/// importdesc ::= 0x00 typeidx | 0x01 tabletype | 0x02 memtype | 0x03 globaltype
/// ```
fn emit_import(buf: &mut Vec<u8>, import: &Import) -> Result<(), EncodeError> {
    write_name(buf, &import.module);
    write_name(buf, &import.name);
    match &import.desc {
        ImportDesc::Func(type_idx) => {
            buf.push(DESC_FUNC);
            write_vu32(buf, *type_idx);
        }
        ImportDesc::Table(table_type) => {
            buf.push(DESC_TABLE);
            emit_table_type(buf, table_type)?;
        }
        ImportDesc::Memory(memory_type) => {
            buf.push(DESC_MEMORY);
            emit_limits(buf, &memory_type.limits)?;
        }
        ImportDesc::Global(global_type) => {
            buf.push(DESC_GLOBAL);
            emit_global_type(buf, global_type);
        }
    }
    Ok(())
}

fn emit_table_type(buf: &mut Vec<u8>, table_type: &TableType) -> Result<(), EncodeError> {
    buf.push(table_type.ref_type.to_byte());
    emit_limits(buf, &table_type.limits)
}

/// ```text
/// limits ::= 0x00 min:u32 | 0x01 min:u32 max:u32
/// ```
fn emit_limits(buf: &mut Vec<u8>, limits: &Limits) -> Result<(), EncodeError> {
    if !limits.is_valid() {
        return Err(EncodeError::InvalidLimits(*limits));
    }
    match limits.max {
        None => {
            buf.push(LIMITS_MIN);
            write_vu32(buf, limits.min);
        }
        Some(max) => {
            buf.push(LIMITS_MIN_MAX);
            write_vu32(buf, limits.min);
            write_vu32(buf, max);
        }
    }
    Ok(())
}

fn emit_global_type(buf: &mut Vec<u8>, global_type: &GlobalType) {
    buf.push(global_type.value_type.to_byte());
    buf.push(match global_type.mutability {
        Mutability::Const => MUT_CONST,
        Mutability::Var => MUT_VAR,
    });
}

/// ```text
/// global ::= globaltype expr
/// ```
fn emit_global(buf: &mut Vec<u8>, global: &Global) -> Result<(), EncodeError> {
    emit_global_type(buf, &global.ty);
    encode_expr(&global.init, buf)
}

/// ```text
/// export     ::= name exportdesc
/// exportdesc ::= 0x00 funcidx | 0x01 tableidx | 0x02 memidx | 0x03 globalidx
/// ```
fn emit_export(buf: &mut Vec<u8>, export: &Export) {
    write_name(buf, &export.name);
    let (kind, idx) = match export.desc {
        ExportDesc::Func(idx) => (DESC_FUNC, idx),
        ExportDesc::Table(idx) => (DESC_TABLE, idx),
        ExportDesc::Memory(idx) => (DESC_MEMORY, idx),
        ExportDesc::Global(idx) => (DESC_GLOBAL, idx),
    };
    buf.push(kind);
    write_vu32(buf, idx);
}

/// ```text
/// elem ::= 0:u32 e:expr y*:vec(funcidx)
/// ```
fn emit_element(buf: &mut Vec<u8>, element: &Element) -> Result<(), EncodeError> {
    write_vu32(buf, ELEM_ACTIVE_FUNCS);
    encode_expr(&element.offset, buf)?;
    write_vec(buf, &element.func_indices, |b, idx| write_vu32(b, *idx));
    Ok(())
}

/// ```text
/// code   ::= size:u32 func
/// func   ::= vec(locals) expr
/// locals ::= n:u32 t:valtype
/// ```
fn emit_code(buf: &mut Vec<u8>, code: &Code) -> Result<(), EncodeError> {
    let mut body = Vec::new();
    write_vec(&mut body, &code.locals, |b, run| {
        write_vu32(b, run.count);
        b.push(run.value_type.to_byte());
    });
    encode_expr(&code.body, &mut body)?;
    write_u8vec(buf, &body);
    Ok(())
}

/// ```text
/// data ::= 0:u32 e:expr b*:vec(byte)
///        | 1:u32 b*:vec(byte)
///        | 2:u32 x:memidx e:expr b*:vec(byte)
/// ```
fn emit_data(buf: &mut Vec<u8>, data: &Data) -> Result<(), EncodeError> {
    match &data.mode {
        DataMode::Active { offset } => {
            write_vu32(buf, DATA_ACTIVE);
            encode_expr(offset, buf)?;
        }
        DataMode::Passive => write_vu32(buf, DATA_PASSIVE),
        DataMode::ActiveExplicit { memory, offset } => {
            write_vu32(buf, DATA_ACTIVE_EXPLICIT);
            write_vu32(buf, *memory);
            encode_expr(offset, buf)?;
        }
    }
    write_u8vec(buf, &data.bytes);
    Ok(())
}

// ===========================================================================
// Helpers
// ===========================================================================

fn emit_section(buf: &mut Vec<u8>, id: u8, contents: &[u8]) {
    buf.push(id);
    write_u8vec(buf, contents);
}

fn try_write_vec<T, F>(buf: &mut Vec<u8>, items: &[T], mut write_one: F) -> Result<(), EncodeError>
where
    F: FnMut(&mut Vec<u8>, &T) -> Result<(), EncodeError>,
{
    write_vu32(buf, items.len() as u32);
    for item in items {
        write_one(buf, item)?;
    }
    Ok(())
}
