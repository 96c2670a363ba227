//! DWARF constant enumerations (DW_TAG_*, DW_AT_*, DW_FORM_*, DW_LANG_*).
//!
//! Each enum has one variant per known constant plus an `Unknown` variant
//! carrying the raw value, so unrecognized vendor codes survive decoding.

use std::fmt;

// `dw_enum!` expands a table of `Variant = value` pairs into the enum,
// `From<raw>`, `value()` and a Display impl printing the DWARF name.
macro_rules! dw_enum {
    (
        $(#[$meta:meta])*
        $name:ident($raw:ty), $prefix:literal {
            $($variant:ident = $value:literal => $dw:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown($raw),
        }

        impl From<$raw> for $name {
            fn from(value: $raw) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl $name {
            /// The raw numeric value.
            pub fn value(self) -> $raw {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Unknown(other) => other,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(concat!($prefix, $dw)),)+
                    Self::Unknown(other) => write!(f, "{}<{:#x}>", $prefix, other),
                }
            }
        }
    };
}

dw_enum! {
    /// DIE tag (DW_TAG_*).
    DwTag(u16), "DW_TAG_" {
        ArrayType = 0x01 => "array_type",
        ClassType = 0x02 => "class_type",
        EntryPoint = 0x03 => "entry_point",
        EnumerationType = 0x04 => "enumeration_type",
        FormalParameter = 0x05 => "formal_parameter",
        ImportedDeclaration = 0x08 => "imported_declaration",
        Label = 0x0A => "label",
        LexicalBlock = 0x0B => "lexical_block",
        Member = 0x0D => "member",
        PointerType = 0x0F => "pointer_type",
        ReferenceType = 0x10 => "reference_type",
        CompileUnit = 0x11 => "compile_unit",
        StringType = 0x12 => "string_type",
        StructureType = 0x13 => "structure_type",
        SubroutineType = 0x15 => "subroutine_type",
        Typedef = 0x16 => "typedef",
        UnionType = 0x17 => "union_type",
        UnspecifiedParameters = 0x18 => "unspecified_parameters",
        Variant = 0x19 => "variant",
        CommonBlock = 0x1A => "common_block",
        CommonInclusion = 0x1B => "common_inclusion",
        Inheritance = 0x1C => "inheritance",
        InlinedSubroutine = 0x1D => "inlined_subroutine",
        Module = 0x1E => "module",
        PtrToMemberType = 0x1F => "ptr_to_member_type",
        SetType = 0x20 => "set_type",
        SubrangeType = 0x21 => "subrange_type",
        WithStmt = 0x22 => "with_stmt",
        AccessDeclaration = 0x23 => "access_declaration",
        BaseType = 0x24 => "base_type",
        CatchBlock = 0x25 => "catch_block",
        ConstType = 0x26 => "const_type",
        Constant = 0x27 => "constant",
        Enumerator = 0x28 => "enumerator",
        FileType = 0x29 => "file_type",
        Friend = 0x2A => "friend",
        Namelist = 0x2B => "namelist",
        NamelistItem = 0x2C => "namelist_item",
        PackedType = 0x2D => "packed_type",
        Subprogram = 0x2E => "subprogram",
        TemplateTypeParameter = 0x2F => "template_type_parameter",
        TemplateValueParameter = 0x30 => "template_value_parameter",
        ThrownType = 0x31 => "thrown_type",
        TryBlock = 0x32 => "try_block",
        VariantPart = 0x33 => "variant_part",
        Variable = 0x34 => "variable",
        VolatileType = 0x35 => "volatile_type",
        DwarfProcedure = 0x36 => "dwarf_procedure",
        RestrictType = 0x37 => "restrict_type",
        InterfaceType = 0x38 => "interface_type",
        Namespace = 0x39 => "namespace",
        ImportedModule = 0x3A => "imported_module",
        UnspecifiedType = 0x3B => "unspecified_type",
        PartialUnit = 0x3C => "partial_unit",
        ImportedUnit = 0x3D => "imported_unit",
        Condition = 0x3F => "condition",
        SharedType = 0x40 => "shared_type",
        TypeUnit = 0x41 => "type_unit",
        RvalueReferenceType = 0x42 => "rvalue_reference_type",
        TemplateAlias = 0x43 => "template_alias",
    }
}

dw_enum! {
    /// Attribute name (DW_AT_*).
    DwAt(u16), "DW_AT_" {
        Sibling = 0x01 => "sibling",
        Location = 0x02 => "location",
        Name = 0x03 => "name",
        Ordering = 0x09 => "ordering",
        ByteSize = 0x0B => "byte_size",
        BitOffset = 0x0C => "bit_offset",
        BitSize = 0x0D => "bit_size",
        StmtList = 0x10 => "stmt_list",
        LowPc = 0x11 => "low_pc",
        HighPc = 0x12 => "high_pc",
        Language = 0x13 => "language",
        Discr = 0x15 => "discr",
        DiscrValue = 0x16 => "discr_value",
        Visibility = 0x17 => "visibility",
        Import = 0x18 => "import",
        StringLength = 0x19 => "string_length",
        CommonReference = 0x1A => "common_reference",
        CompDir = 0x1B => "comp_dir",
        ConstValue = 0x1C => "const_value",
        ContainingType = 0x1D => "containing_type",
        DefaultValue = 0x1E => "default_value",
        Inline = 0x20 => "inline",
        IsOptional = 0x21 => "is_optional",
        LowerBound = 0x22 => "lower_bound",
        Producer = 0x25 => "producer",
        Prototyped = 0x27 => "prototyped",
        ReturnAddr = 0x2A => "return_addr",
        StartScope = 0x2C => "start_scope",
        BitStride = 0x2E => "bit_stride",
        UpperBound = 0x2F => "upper_bound",
        AbstractOrigin = 0x31 => "abstract_origin",
        Accessibility = 0x32 => "accessibility",
        AddressClass = 0x33 => "address_class",
        Artificial = 0x34 => "artificial",
        BaseTypes = 0x35 => "base_types",
        CallingConvention = 0x36 => "calling_convention",
        Count = 0x37 => "count",
        DataMemberLocation = 0x38 => "data_member_location",
        DeclColumn = 0x39 => "decl_column",
        DeclFile = 0x3A => "decl_file",
        DeclLine = 0x3B => "decl_line",
        Declaration = 0x3C => "declaration",
        DiscrList = 0x3D => "discr_list",
        Encoding = 0x3E => "encoding",
        External = 0x3F => "external",
        FrameBase = 0x40 => "frame_base",
        Friend = 0x41 => "friend",
        IdentifierCase = 0x42 => "identifier_case",
        MacroInfo = 0x43 => "macro_info",
        NamelistItem = 0x44 => "namelist_item",
        Priority = 0x45 => "priority",
        Segment = 0x46 => "segment",
        Specification = 0x47 => "specification",
        StaticLink = 0x48 => "static_link",
        Type = 0x49 => "type",
        UseLocation = 0x4A => "use_location",
        VariableParameter = 0x4B => "variable_parameter",
        Virtuality = 0x4C => "virtuality",
        VtableElemLocation = 0x4D => "vtable_elem_location",
        Allocated = 0x4E => "allocated",
        Associated = 0x4F => "associated",
        DataLocation = 0x50 => "data_location",
        ByteStride = 0x51 => "byte_stride",
        EntryPc = 0x52 => "entry_pc",
        UseUtf8 = 0x53 => "use_UTF8",
        Extension = 0x54 => "extension",
        Ranges = 0x55 => "ranges",
        Trampoline = 0x56 => "trampoline",
        CallColumn = 0x57 => "call_column",
        CallFile = 0x58 => "call_file",
        CallLine = 0x59 => "call_line",
        Description = 0x5A => "description",
        BinaryScale = 0x5B => "binary_scale",
        DecimalScale = 0x5C => "decimal_scale",
        Small = 0x5D => "small",
        DecimalSign = 0x5E => "decimal_sign",
        DigitCount = 0x5F => "digit_count",
        PictureString = 0x60 => "picture_string",
        Mutable = 0x61 => "mutable",
        ThreadsScaled = 0x62 => "threads_scaled",
        Explicit = 0x63 => "explicit",
        ObjectPointer = 0x64 => "object_pointer",
        Endianity = 0x65 => "endianity",
        Elemental = 0x66 => "elemental",
        Pure = 0x67 => "pure",
        Recursive = 0x68 => "recursive",
        Signature = 0x69 => "signature",
        MainSubprogram = 0x6A => "main_subprogram",
        DataBitOffset = 0x6B => "data_bit_offset",
        ConstExpr = 0x6C => "const_expr",
        EnumClass = 0x6D => "enum_class",
        LinkageName = 0x6E => "linkage_name",
        MipsLinkageName = 0x2007 => "MIPS_linkage_name",
    }
}

dw_enum! {
    /// Attribute encoding form (DW_FORM_*), DWARF 2 through 4.
    DwForm(u8), "DW_FORM_" {
        Addr = 0x01 => "addr",
        Block2 = 0x03 => "block2",
        Block4 = 0x04 => "block4",
        Data2 = 0x05 => "data2",
        Data4 = 0x06 => "data4",
        Data8 = 0x07 => "data8",
        String = 0x08 => "string",
        Block = 0x09 => "block",
        Block1 = 0x0A => "block1",
        Data1 = 0x0B => "data1",
        Flag = 0x0C => "flag",
        Sdata = 0x0D => "sdata",
        Strp = 0x0E => "strp",
        Udata = 0x0F => "udata",
        RefAddr = 0x10 => "ref_addr",
        Ref1 = 0x11 => "ref1",
        Ref2 = 0x12 => "ref2",
        Ref4 = 0x13 => "ref4",
        Ref8 = 0x14 => "ref8",
        RefUdata = 0x15 => "ref_udata",
        Indirect = 0x16 => "indirect",
        SecOffset = 0x17 => "sec_offset",
        Exprloc = 0x18 => "exprloc",
        FlagPresent = 0x19 => "flag_present",
        RefSig8 = 0x20 => "ref_sig8",
    }
}

dw_enum! {
    /// Source language (DW_LANG_*).
    DwLang(u16), "DW_LANG_" {
        C89 = 0x0001 => "C89",
        C = 0x0002 => "C",
        Ada83 = 0x0003 => "Ada83",
        CPlusPlus = 0x0004 => "C_plus_plus",
        Cobol74 = 0x0005 => "Cobol74",
        Cobol85 = 0x0006 => "Cobol85",
        Fortran77 = 0x0007 => "Fortran77",
        Fortran90 = 0x0008 => "Fortran90",
        Pascal83 = 0x0009 => "Pascal83",
        Modula2 = 0x000A => "Modula2",
        Java = 0x000B => "Java",
        C99 = 0x000C => "C99",
        Ada95 = 0x000D => "Ada95",
        Fortran95 = 0x000E => "Fortran95",
        Pli = 0x000F => "PLI",
        ObjC = 0x0010 => "ObjC",
        ObjCPlusPlus = 0x0011 => "ObjC_plus_plus",
        Upc = 0x0012 => "UPC",
        D = 0x0013 => "D",
        Python = 0x0014 => "Python",
        Go = 0x0016 => "Go",
        CPlusPlus11 = 0x001A => "C_plus_plus_11",
        Rust = 0x001C => "Rust",
        C11 = 0x001D => "C11",
        CPlusPlus14 = 0x0021 => "C_plus_plus_14",
        MipsAssembler = 0x8001 => "Mips_Assembler",
    }
}

impl DwForm {
    /// True for forms that are known to this decoder.
    pub fn is_known(self) -> bool {
        !matches!(self, DwForm::Unknown(_))
    }
}
