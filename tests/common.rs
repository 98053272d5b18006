//! Common test utilities shared between integration tests
#![allow(dead_code)]

use wasmtiny::parser::instruction::Instruction;
use wasmtiny::parser::module::{
    Code, Data, DataMode, Element, Export, ExportDesc, FuncType, Global, GlobalType, Import, ImportDesc, Limits, Locals,
    MemoryType, Module, RefType, Section, TableType, ValueType,
};
use wasmtiny::runtime::{self, ImportObject, Instance, RuntimeError};
use wasmtiny::{encoder, parser};

/// Every section kind: an imported logger, a table filled by an element
/// segment, a bounded memory with a data segment, a global, a start
/// function and a trailing custom section.
pub const ALL_SECTIONS: &str = "
        01 09 02 60 00 01 7f 60 01 7f 00
        02 0b 01 03 656e76 03 6c6f67 00 01
        03 02 01 00
        04 04 01 70 00 01
        05 04 01 01 01 02
        06 06 01 7f 01 41 2a 0b
        07 07 01 03 72756e 00 01
        08 01 01
        09 07 01 00 41 00 0b 01 01
        0c 01 01
        0a 0a 01 08 00 41 0d 10 00 23 00 0b
        0b 08 01 00 41 10 0b 02 6869
        00 07 04 6d657461 0102";

/// Installs `env_logger` once for the test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Decodes a hex fixture; whitespace is ignored.
pub fn hex_bytes(fixture: &str) -> Vec<u8> {
    let digits: String = fixture.split_whitespace().collect();
    hex::decode(digits).unwrap_or_else(|e| panic!("bad hex fixture: {e}"))
}

/// `\0asm` version 1 followed by `sections`
pub fn hex_module(sections: &str) -> Vec<u8> {
    hex_bytes(&format!("0061736d 01000000 {sections}"))
}

/// Encodes then decodes `module`, asserting the re-encoded bytes are stable.
pub fn round_trip(module: &Module) -> Module {
    let bytes = encoder::encode(module).unwrap_or_else(|e| panic!("encode failed: {e}"));
    let decoded = parser::decode(&bytes).unwrap_or_else(|e| panic!("decode failed: {e}"));
    let again = encoder::encode(&decoded).unwrap_or_else(|e| panic!("re-encode failed: {e}"));
    assert_eq!(bytes, again, "encode stability failed");
    decoded
}

pub fn i32_const(value: i32) -> Instruction {
    Instruction::I32Const { value }
}

pub fn local_get(local_idx: u32) -> Instruction {
    Instruction::LocalGet { local_idx }
}

pub fn local_set(local_idx: u32) -> Instruction {
    Instruction::LocalSet { local_idx }
}

/// Assembles a module section by section. Functions are numbered after the
/// imported functions, in the order they are added.
#[derive(Default)]
pub struct ModuleBuilder {
    types: Vec<FuncType>,
    imports: Vec<Import>,
    functions: Vec<u32>,
    codes: Vec<Code>,
    tables: Vec<TableType>,
    memories: Vec<MemoryType>,
    globals: Vec<Global>,
    exports: Vec<Export>,
    start: Option<u32>,
    elements: Vec<Element>,
    data: Vec<Data>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn type_idx(&mut self, ty: FuncType) -> u32 {
        match self.types.iter().position(|t| *t == ty) {
            Some(idx) => idx as u32,
            None => {
                self.types.push(ty);
                self.types.len() as u32 - 1
            }
        }
    }

    fn import(mut self, module: &str, name: &str, desc: ImportDesc) -> Self {
        self.imports.push(Import {
            module: module.to_string(),
            name: name.to_string(),
            desc,
        });
        self
    }

    fn export(&mut self, name: Option<&str>, desc: ExportDesc) {
        if let Some(name) = name {
            self.exports.push(Export {
                name: name.to_string(),
                desc,
            });
        }
    }

    pub fn import_func(mut self, module: &str, name: &str, ty: FuncType) -> Self {
        let idx = self.type_idx(ty);
        self.import(module, name, ImportDesc::Func(idx))
    }

    pub fn import_memory(self, module: &str, name: &str, min: u32) -> Self {
        self.import(
            module,
            name,
            ImportDesc::Memory(MemoryType {
                limits: Limits::new(min, None),
            }),
        )
    }

    pub fn import_table(self, module: &str, name: &str, min: u32) -> Self {
        self.import(
            module,
            name,
            ImportDesc::Table(TableType {
                ref_type: RefType::FuncRef,
                limits: Limits::new(min, None),
            }),
        )
    }

    pub fn import_global(self, module: &str, name: &str, ty: GlobalType) -> Self {
        self.import(module, name, ImportDesc::Global(ty))
    }

    fn imported(&self, kind: &str) -> u32 {
        self.imports.iter().filter(|i| i.desc.kind() == kind).count() as u32
    }

    /// Adds a function; `locals` are declared one slot each.
    pub fn func(mut self, export: Option<&str>, ty: FuncType, locals: Vec<ValueType>, body: Vec<Instruction>) -> Self {
        let idx = self.imported("function") + self.functions.len() as u32;
        let type_idx = self.type_idx(ty);
        self.functions.push(type_idx);
        let locals = locals
            .into_iter()
            .map(|value_type| Locals { count: 1, value_type })
            .collect();
        self.codes.push(Code::new(locals, body));
        self.export(export, ExportDesc::Func(idx));
        self
    }

    pub fn table(mut self, export: Option<&str>, min: u32) -> Self {
        let idx = self.imported("table") + self.tables.len() as u32;
        self.tables.push(TableType {
            ref_type: RefType::FuncRef,
            limits: Limits::new(min, None),
        });
        self.export(export, ExportDesc::Table(idx));
        self
    }

    pub fn memory(mut self, export: Option<&str>, min: u32, max: Option<u32>) -> Self {
        let idx = self.imported("memory") + self.memories.len() as u32;
        self.memories.push(MemoryType {
            limits: Limits::new(min, max),
        });
        self.export(export, ExportDesc::Memory(idx));
        self
    }

    pub fn global(mut self, export: Option<&str>, ty: GlobalType, init: Vec<Instruction>) -> Self {
        let idx = self.imported("global") + self.globals.len() as u32;
        self.globals.push(Global { ty, init });
        self.export(export, ExportDesc::Global(idx));
        self
    }

    /// Re-exports an imported or defined object under another name
    pub fn export_as(mut self, name: &str, desc: ExportDesc) -> Self {
        self.export(Some(name), desc);
        self
    }

    pub fn start(mut self, func_idx: u32) -> Self {
        self.start = Some(func_idx);
        self
    }

    pub fn element(mut self, offset: i32, func_indices: Vec<u32>) -> Self {
        self.elements.push(Element {
            offset: vec![i32_const(offset)],
            func_indices,
        });
        self
    }

    pub fn data(mut self, offset: i32, bytes: &[u8]) -> Self {
        self.data.push(Data {
            mode: DataMode::Active {
                offset: vec![i32_const(offset)],
            },
            bytes: bytes.to_vec(),
        });
        self
    }

    pub fn passive_data(mut self, bytes: &[u8]) -> Self {
        self.data.push(Data {
            mode: DataMode::Passive,
            bytes: bytes.to_vec(),
        });
        self
    }

    pub fn build(self) -> Module {
        let mut sections = Vec::new();
        if !self.types.is_empty() {
            sections.push(Section::Type(self.types));
        }
        if !self.imports.is_empty() {
            sections.push(Section::Import(self.imports));
        }
        if !self.functions.is_empty() {
            sections.push(Section::Function(self.functions));
        }
        if !self.tables.is_empty() {
            sections.push(Section::Table(self.tables));
        }
        if !self.memories.is_empty() {
            sections.push(Section::Memory(self.memories));
        }
        if !self.globals.is_empty() {
            sections.push(Section::Global(self.globals));
        }
        if !self.exports.is_empty() {
            sections.push(Section::Export(self.exports));
        }
        if let Some(start) = self.start {
            sections.push(Section::Start(start));
        }
        if !self.elements.is_empty() {
            sections.push(Section::Element(self.elements));
        }
        if !self.codes.is_empty() {
            sections.push(Section::Code(self.codes));
        }
        if !self.data.is_empty() {
            sections.push(Section::Data(self.data));
        }

        sections
            .into_iter()
            .try_fold(Module::new(), Module::with_section)
            .unwrap_or_else(|e| panic!("invalid test module: {e}"))
    }

    /// Builds the module and passes it through the binary format.
    pub fn load(self) -> Module {
        round_trip(&self.build())
    }

    pub fn instantiate(self, imports: &ImportObject) -> Result<Instance, RuntimeError> {
        runtime::instantiate(&self.load(), imports)
    }
}
