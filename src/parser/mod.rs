//! Binary module decoder
//!
//! Turns the bytes of a module into a [`module::Module`]. Each section is
//! decoded inside a viewport of its declared size, so a section that reads
//! past its size fails with [`DecodeError::SectionOverrun`] and a section
//! that reads short is skipped to its boundary.

pub mod encoding;
pub mod instruction;
pub mod module;
pub mod reader;

use log::debug;

use crate::config::Config;
use instruction::decode_expr;
use module::{
    Code, CustomSection, Data, DataMode, Element, Export, ExportDesc, FuncType, Global, GlobalType, Import, ImportDesc,
    Limits, Locals, MemoryType, Module, Mutability, RefType, Section, TableType, ValueType, MAX_LOCALS,
};
use reader::Reader;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {0}")]
    TruncatedInput(usize),
    #[error("read past section boundary at offset {boundary}")]
    SectionOverrun { boundary: usize },
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),
    #[error("unknown instruction: {0:#04x} {1}")]
    UnknownPrefixedOpcode(u8, u32),
    #[error("malformed module: {0}")]
    MalformedModule(String),
    #[error("invalid value type: {0:#04x}")]
    InvalidValueType(u8),
    #[error("integer representation too long")]
    IntegerTooLong,
    #[error("malformed UTF-8 encoding")]
    InvalidUtf8,
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// Decodes module bytes according to a [`Config`]
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: Config,
}

impl Decoder {
    pub fn new(config: Config) -> Self {
        Decoder { config }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Module, DecodeError> {
        let mut reader = Reader::new(bytes).with_max_nesting(self.config.max_nesting_depth);
        let mut module = Module::new();

        module.set_magic(read_array(&mut reader)?)?;
        module.set_version(read_array(&mut reader)?)?;

        while !reader.is_empty() {
            let start = reader.pos();
            let id = reader.read_byte()?;
            let size = reader.read_vu32()? as usize;
            let section = reader.viewport(size, |r| decode_section(id, r))?;
            if self.config.debug {
                debug!("section #{} ({}) at {:#x}, size {}", id, section.name(), start, size);
            }
            module.push_section(section)?;
        }

        Ok(module)
    }
}

/// Decodes `bytes` with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<Module, DecodeError> {
    Decoder::default().decode(bytes)
}

fn read_array(reader: &mut Reader) -> Result<[u8; 4], DecodeError> {
    let mut out = [0u8; 4];
    out.copy_from_slice(reader.read(4)?);
    Ok(out)
}

fn decode_section(id: u8, reader: &mut Reader) -> Result<Section, DecodeError> {
    Ok(match id {
        encoding::SECTION_CUSTOM => Section::Custom(decode_custom(reader)?),
        encoding::SECTION_TYPE => Section::Type(reader.read_vec(decode_func_type)?),
        encoding::SECTION_IMPORT => Section::Import(reader.read_vec(decode_import)?),
        encoding::SECTION_FUNCTION => Section::Function(reader.read_vec(|r| r.read_vu32())?),
        encoding::SECTION_TABLE => Section::Table(reader.read_vec(decode_table_type)?),
        encoding::SECTION_MEMORY => Section::Memory(reader.read_vec(decode_memory_type)?),
        encoding::SECTION_GLOBAL => Section::Global(reader.read_vec(decode_global)?),
        encoding::SECTION_EXPORT => Section::Export(reader.read_vec(decode_export)?),
        encoding::SECTION_START => Section::Start(reader.read_vu32()?),
        encoding::SECTION_ELEMENT => Section::Element(reader.read_vec(decode_element)?),
        encoding::SECTION_CODE => Section::Code(reader.read_vec(decode_code)?),
        encoding::SECTION_DATA => Section::Data(reader.read_vec(decode_data)?),
        encoding::SECTION_DATA_COUNT => Section::DataCount(reader.read_vu32()?),
        _ => {
            return Err(DecodeError::MalformedModule(format!("unknown section id {id}")))
        }
    })
}

fn decode_custom(reader: &mut Reader) -> Result<CustomSection, DecodeError> {
    let name = reader.read_name()?;
    let bytes = reader.read(reader.remaining())?.to_vec();
    Ok(CustomSection { name, bytes })
}

pub(crate) fn decode_value_type(reader: &mut Reader) -> Result<ValueType, DecodeError> {
    let byte = reader.read_byte()?;
    ValueType::from_byte(byte).ok_or(DecodeError::InvalidValueType(byte))
}

fn decode_ref_type(reader: &mut Reader) -> Result<RefType, DecodeError> {
    let byte = reader.read_byte()?;
    RefType::from_byte(byte).ok_or(DecodeError::InvalidValueType(byte))
}

fn decode_func_type(reader: &mut Reader) -> Result<FuncType, DecodeError> {
    let form = reader.read_byte()?;
    if form != encoding::TYPE_FUNC {
        return Err(DecodeError::MalformedModule(format!(
            "expected function type {:#04x}, got {:#04x}",
            encoding::TYPE_FUNC,
            form
        )));
    }
    let params = reader.read_vec(decode_value_type)?;
    let results = reader.read_vec(decode_value_type)?;
    Ok(FuncType { params, results })
}

fn decode_limits(reader: &mut Reader) -> Result<Limits, DecodeError> {
    let flag = reader.read_byte()?;
    let limits = match flag {
        encoding::LIMITS_MIN => Limits::new(reader.read_vu32()?, None),
        encoding::LIMITS_MIN_MAX => {
            let min = reader.read_vu32()?;
            Limits::new(min, Some(reader.read_vu32()?))
        }
        _ => {
            return Err(DecodeError::MalformedModule(format!("invalid limits flag {flag:#04x}")))
        }
    };
    if !limits.is_valid() {
        return Err(DecodeError::MalformedModule(format!(
            "limits maximum below minimum: {limits}"
        )));
    }
    Ok(limits)
}

fn decode_table_type(reader: &mut Reader) -> Result<TableType, DecodeError> {
    let ref_type = decode_ref_type(reader)?;
    let limits = decode_limits(reader)?;
    Ok(TableType { ref_type, limits })
}

fn decode_memory_type(reader: &mut Reader) -> Result<MemoryType, DecodeError> {
    Ok(MemoryType {
        limits: decode_limits(reader)?,
    })
}

fn decode_global_type(reader: &mut Reader) -> Result<GlobalType, DecodeError> {
    let value_type = decode_value_type(reader)?;
    let mutability = match reader.read_byte()? {
        encoding::MUT_CONST => Mutability::Const,
        encoding::MUT_VAR => Mutability::Var,
        other => {
            return Err(DecodeError::MalformedModule(format!("invalid mutability {other:#04x}")))
        }
    };
    Ok(GlobalType {
        value_type,
        mutability,
    })
}

fn decode_import(reader: &mut Reader) -> Result<Import, DecodeError> {
    let module = reader.read_name()?;
    let name = reader.read_name()?;
    let desc = match reader.read_byte()? {
        encoding::DESC_FUNC => ImportDesc::Func(reader.read_vu32()?),
        encoding::DESC_TABLE => ImportDesc::Table(decode_table_type(reader)?),
        encoding::DESC_MEMORY => ImportDesc::Memory(decode_memory_type(reader)?),
        encoding::DESC_GLOBAL => ImportDesc::Global(decode_global_type(reader)?),
        other => {
            return Err(DecodeError::MalformedModule(format!(
                "invalid import kind {other:#04x}"
            )))
        }
    };
    Ok(Import { module, name, desc })
}

fn decode_export(reader: &mut Reader) -> Result<Export, DecodeError> {
    let name = reader.read_name()?;
    let kind = reader.read_byte()?;
    let idx = reader.read_vu32()?;
    let desc = match kind {
        encoding::DESC_FUNC => ExportDesc::Func(idx),
        encoding::DESC_TABLE => ExportDesc::Table(idx),
        encoding::DESC_MEMORY => ExportDesc::Memory(idx),
        encoding::DESC_GLOBAL => ExportDesc::Global(idx),
        other => {
            return Err(DecodeError::MalformedModule(format!(
                "invalid export kind {other:#04x}"
            )))
        }
    };
    Ok(Export { name, desc })
}

fn decode_global(reader: &mut Reader) -> Result<Global, DecodeError> {
    let ty = decode_global_type(reader)?;
    let init = decode_expr(reader)?;
    Ok(Global { ty, init })
}

fn decode_element(reader: &mut Reader) -> Result<Element, DecodeError> {
    let flags = reader.read_vu32()?;
    match flags {
        encoding::ELEM_ACTIVE_FUNCS => {
            let offset = decode_expr(reader)?;
            let func_indices = reader.read_vec(|r| r.read_vu32())?;
            Ok(Element {
                offset,
                func_indices,
            })
        }
        1..=encoding::ELEM_MAX_FLAGS => Err(DecodeError::NotImplemented(format!("element segment form {flags}"))),
        _ => Err(DecodeError::MalformedModule(format!(
            "invalid element segment flags {flags}"
        ))),
    }
}

fn decode_code(reader: &mut Reader) -> Result<Code, DecodeError> {
    let size = reader.read_vu32()? as usize;
    reader.viewport(size, |r| {
        let locals = r.read_vec(|r| {
            let count = r.read_vu32()?;
            let value_type = decode_value_type(r)?;
            Ok(Locals { count, value_type })
        })?;
        let code = Code::new(locals, Vec::new());
        if code.local_count() > MAX_LOCALS {
            return Err(DecodeError::MalformedModule(format!(
                "{} locals declared, at most {MAX_LOCALS} allowed",
                code.local_count()
            )));
        }
        Ok(Code {
            body: decode_expr(r)?,
            ..code
        })
    })
}

fn decode_data(reader: &mut Reader) -> Result<Data, DecodeError> {
    let flags = reader.read_vu32()?;
    let mode = match flags {
        encoding::DATA_ACTIVE => DataMode::Active {
            offset: decode_expr(reader)?,
        },
        encoding::DATA_PASSIVE => DataMode::Passive,
        encoding::DATA_ACTIVE_EXPLICIT => {
            let memory = reader.read_vu32()?;
            DataMode::ActiveExplicit {
                memory,
                offset: decode_expr(reader)?,
            }
        }
        _ => {
            return Err(DecodeError::MalformedModule(format!(
                "invalid data segment flags {flags}"
            )))
        }
    };
    let bytes = reader.read_u8vec()?;
    Ok(Data { mode, bytes })
}
