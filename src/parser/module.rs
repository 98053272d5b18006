//! Structural model of a decoded module
//!
//! A [`Module`] is the magic and version header plus an ordered list of
//! [`Section`]s. Non-custom sections appear at most once; custom sections are
//! kept in place so the module re-encodes to the same bytes.

use std::fmt;

use serde::Serialize;

use super::encoding::{self, MAGIC, VERSION};
use super::instruction::Instruction;
use super::DecodeError;

/// A constant or function-body instruction sequence (without its `end`)
pub type Expr = Vec<Instruction>;

#[derive(Debug, Clone, Serialize)]
pub struct Module {
    magic: [u8; 4],
    version: [u8; 4],
    sections: Vec<Section>,
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl Module {
    /// An empty module with the standard magic and version
    pub fn new() -> Self {
        Module {
            magic: MAGIC,
            version: VERSION,
            sections: Vec::new(),
        }
    }

    pub fn magic(&self) -> [u8; 4] {
        self.magic
    }

    pub fn version(&self) -> [u8; 4] {
        self.version
    }

    /// Sets the magic constant; anything but `\0asm` is rejected.
    pub fn set_magic(&mut self, magic: [u8; 4]) -> Result<(), DecodeError> {
        if magic != MAGIC {
            return Err(DecodeError::MalformedModule(format!(
                "magic header not detected: {}",
                hex::encode(magic)
            )));
        }
        self.magic = magic;
        Ok(())
    }

    /// Sets the version; only version 1 is accepted.
    pub fn set_version(&mut self, version: [u8; 4]) -> Result<(), DecodeError> {
        if version != VERSION {
            return Err(DecodeError::MalformedModule(format!(
                "unknown binary version: {}",
                hex::encode(version)
            )));
        }
        self.version = version;
        Ok(())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Appends a section. A second non-custom section with the same id is a
    /// malformed module.
    pub fn push_section(&mut self, section: Section) -> Result<(), DecodeError> {
        let id = section.id();
        if id != encoding::SECTION_CUSTOM && self.sections.iter().any(|s| s.id() == id) {
            return Err(DecodeError::MalformedModule(format!("duplicate section id {id}")));
        }
        self.sections.push(section);
        Ok(())
    }

    /// Builder form of [`Module::push_section`]
    pub fn with_section(mut self, section: Section) -> Result<Self, DecodeError> {
        self.push_section(section)?;
        Ok(self)
    }

    fn find<'a, T>(&'a self, pick: impl Fn(&'a Section) -> Option<T>) -> Option<T> {
        self.sections.iter().find_map(pick)
    }

    pub fn types(&self) -> &[FuncType] {
        self.find(|s| match s {
            Section::Type(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn imports(&self) -> &[Import] {
        self.find(|s| match s {
            Section::Import(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    /// Type indices of the functions defined by this module
    pub fn functions(&self) -> &[u32] {
        self.find(|s| match s {
            Section::Function(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn tables(&self) -> &[TableType] {
        self.find(|s| match s {
            Section::Table(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn memories(&self) -> &[MemoryType] {
        self.find(|s| match s {
            Section::Memory(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn globals(&self) -> &[Global] {
        self.find(|s| match s {
            Section::Global(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn exports(&self) -> &[Export] {
        self.find(|s| match s {
            Section::Export(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn start(&self) -> Option<u32> {
        self.find(|s| match s {
            Section::Start(idx) => Some(*idx),
            _ => None,
        })
    }

    pub fn elements(&self) -> &[Element] {
        self.find(|s| match s {
            Section::Element(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn codes(&self) -> &[Code] {
        self.find(|s| match s {
            Section::Code(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn data(&self) -> &[Data] {
        self.find(|s| match s {
            Section::Data(v) => Some(v.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
    }

    pub fn data_count(&self) -> Option<u32> {
        self.find(|s| match s {
            Section::DataCount(n) => Some(*n),
            _ => None,
        })
    }

    pub fn customs(&self) -> impl Iterator<Item = &CustomSection> {
        self.sections.iter().filter_map(|s| match s {
            Section::Custom(c) => Some(c),
            _ => None,
        })
    }

    /// Structural snapshot of the module as JSON
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module version={}", u32::from_le_bytes(self.version))?;
        for section in &self.sections {
            write!(f, " {}", section.name())?;
        }
        Ok(())
    }
}

/// One section payload, tagged by its id
#[derive(Debug, Clone, Serialize)]
pub enum Section {
    Custom(CustomSection),
    Type(Vec<FuncType>),
    Import(Vec<Import>),
    /// Type index of each defined function
    Function(Vec<u32>),
    Table(Vec<TableType>),
    Memory(Vec<MemoryType>),
    Global(Vec<Global>),
    Export(Vec<Export>),
    Start(u32),
    Element(Vec<Element>),
    Code(Vec<Code>),
    Data(Vec<Data>),
    DataCount(u32),
}

impl Section {
    pub fn id(&self) -> u8 {
        match self {
            Section::Custom(_) => encoding::SECTION_CUSTOM,
            Section::Type(_) => encoding::SECTION_TYPE,
            Section::Import(_) => encoding::SECTION_IMPORT,
            Section::Function(_) => encoding::SECTION_FUNCTION,
            Section::Table(_) => encoding::SECTION_TABLE,
            Section::Memory(_) => encoding::SECTION_MEMORY,
            Section::Global(_) => encoding::SECTION_GLOBAL,
            Section::Export(_) => encoding::SECTION_EXPORT,
            Section::Start(_) => encoding::SECTION_START,
            Section::Element(_) => encoding::SECTION_ELEMENT,
            Section::Code(_) => encoding::SECTION_CODE,
            Section::Data(_) => encoding::SECTION_DATA,
            Section::DataCount(_) => encoding::SECTION_DATA_COUNT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Section::Custom(_) => "custom",
            Section::Type(_) => "type",
            Section::Import(_) => "import",
            Section::Function(_) => "function",
            Section::Table(_) => "table",
            Section::Memory(_) => "memory",
            Section::Global(_) => "global",
            Section::Export(_) => "export",
            Section::Start(_) => "start",
            Section::Element(_) => "element",
            Section::Code(_) => "code",
            Section::Data(_) => "data",
            Section::DataCount(_) => "datacount",
        }
    }
}

/// A named payload with no meaning to execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomSection {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
    FuncRef,
    ExternRef,
}

impl ValueType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            encoding::VALTYPE_I32 => Some(ValueType::I32),
            encoding::VALTYPE_I64 => Some(ValueType::I64),
            encoding::VALTYPE_F32 => Some(ValueType::F32),
            encoding::VALTYPE_F64 => Some(ValueType::F64),
            encoding::VALTYPE_FUNCREF => Some(ValueType::FuncRef),
            encoding::VALTYPE_EXTERNREF => Some(ValueType::ExternRef),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ValueType::I32 => encoding::VALTYPE_I32,
            ValueType::I64 => encoding::VALTYPE_I64,
            ValueType::F32 => encoding::VALTYPE_F32,
            ValueType::F64 => encoding::VALTYPE_F64,
            ValueType::FuncRef => encoding::VALTYPE_FUNCREF,
            ValueType::ExternRef => encoding::VALTYPE_EXTERNREF,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefType {
    FuncRef,
    ExternRef,
}

impl RefType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            encoding::VALTYPE_FUNCREF => Some(RefType::FuncRef),
            encoding::VALTYPE_EXTERNREF => Some(RefType::ExternRef),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        ValueType::from(self).to_byte()
    }
}

impl From<RefType> for ValueType {
    fn from(rt: RefType) -> Self {
        match rt {
            RefType::FuncRef => ValueType::FuncRef,
            RefType::ExternRef => ValueType::ExternRef,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FuncType {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl FuncType {
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        FuncType { params, results }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let join = |types: &[ValueType]| {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<String>>()
                .join(", ")
        };
        write!(f, "({}) -> ({})", join(&self.params), join(&self.results))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
}

impl Limits {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Limits { min, max }
    }

    /// `max`, when present, must not be below `min`
    pub fn is_valid(&self) -> bool {
        self.max.map_or(true, |max| max >= self.min)
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "min={} max={}", self.min, max),
            None => write!(f, "min={}", self.min),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableType {
    pub ref_type: RefType,
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryType {
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mutability {
    Const,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlobalType {
    pub value_type: ValueType,
    pub mutability: Mutability,
}

impl GlobalType {
    pub fn is_mutable(&self) -> bool {
        self.mutability == Mutability::Var
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImportDesc {
    /// Index into the type section
    Func(u32),
    Table(TableType),
    Memory(MemoryType),
    Global(GlobalType),
}

impl ImportDesc {
    pub fn kind(&self) -> &'static str {
        match self {
            ImportDesc::Func(_) => "function",
            ImportDesc::Table(_) => "table",
            ImportDesc::Memory(_) => "memory",
            ImportDesc::Global(_) => "global",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub desc: ImportDesc,
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} <- {}.{}", self.desc.kind(), self.module, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportDesc {
    Func(u32),
    Table(u32),
    Memory(u32),
    Global(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Export {
    pub name: String,
    pub desc: ExportDesc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Global {
    pub ty: GlobalType,
    pub init: Expr,
}

/// Active element segment for table 0 holding function indices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub offset: Expr,
    pub func_indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DataMode {
    /// Active in memory 0, memory index implicit
    Active { offset: Expr },
    Passive,
    /// Active with the memory index written out
    ActiveExplicit { memory: u32, offset: Expr },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Data {
    pub mode: DataMode,
    pub bytes: Vec<u8>,
}

impl Data {
    pub fn memory_index(&self) -> u32 {
        match &self.mode {
            DataMode::ActiveExplicit { memory, .. } => *memory,
            _ => 0,
        }
    }

    /// The offset expression; `None` for passive segments
    pub fn offset(&self) -> Option<&Expr> {
        match &self.mode {
            DataMode::Active { offset } | DataMode::ActiveExplicit { offset, .. } => Some(offset),
            DataMode::Passive => None,
        }
    }
}

/// A run of `count` locals of one type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Locals {
    pub count: u32,
    pub value_type: ValueType,
}

/// Most declared locals one function may have
pub const MAX_LOCALS: u64 = 50_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Code {
    pub locals: Vec<Locals>,
    pub body: Expr,
}

impl Code {
    pub fn new(locals: Vec<Locals>, body: Expr) -> Self {
        Code { locals, body }
    }

    /// Number of declared locals, summed over the runs
    pub fn local_count(&self) -> u64 {
        self.locals.iter().map(|run| u64::from(run.count)).sum()
    }

    /// Declared local types, one per slot, following the parameters
    pub fn local_types(&self) -> impl Iterator<Item = ValueType> + '_ {
        self.locals
            .iter()
            .flat_map(|run| std::iter::repeat(run.value_type).take(run.count as usize))
    }
}
