//! The ASN.1→packer compiler (C6): lowers a [`crate::tree`] semantic tree
//! into packer-program bytes and a navigation recipe per type assignment.
//!
//! Every [`compile_statement`](CompileSession::compile_statement) call
//! returns a *self-contained* `(bytes, recipe, slot_count)` triple whose
//! recipe is numbered locally from slot `0`, as if it were the only thing
//! in the program. Whichever caller places several such statements
//! side-by-side in one array — `SEQUENCE`/`SET`/`CHOICE` assembly, or a
//! bare top-level type — is responsible for re-basing each child's recipe
//! by a running slot counter as it concatenates their bytes
//! ([`shift_recipe`]). `SEQUENCE OF`/`SET OF` elements and resolved
//! `TypeRef`s get a fresh array of their own and are therefore never
//! re-based past their own boundary — this split is the reason recursive
//! ASN.1 types compile to finite programs.

use std::collections::{BTreeMap, BTreeSet};

use asnpack::opcode::{self, Op};
use asnpack::tag::{Class, Tag};
use snafu::OptionExt;

use crate::error::{
    AmbiguousSetOrderSnafu, CompileError, ImplicitTagOnChoiceOrAnySnafu, UnimplementedSnafu,
    UnresolvedTypeSnafu,
};
use crate::linker::resolve_type_module;
use crate::tree::{
    ChoiceType, ComponentType, DefinedType, ModuleSet, NamedType, SequenceOfType, SequenceType,
    SetType, SimpleType, TagClass, TagKind, TaggedType, Type,
};

/// The owned, compile-time mirror of [`asnpack::recipe::Recipe`]. Codegen
/// (`crate::codegen`) renders this into `&'static` Rust data; at this
/// stage field names are still owned `String`s and `TypeRef` targets are
/// still (module, type) names rather than resolved `&'static` pointers.
#[derive(Debug, Clone)]
pub enum RecipeIr {
    Leaf(usize),
    Named(Vec<(String, RecipeIr)>),
    Repeated {
        slot: usize,
        element_program: Vec<u8>,
        element_recipe: Box<RecipeIr>,
    },
    TypeRef {
        slot: usize,
        module: String,
        name: String,
    },
}

/// A fully compiled ASN.1 type assignment: the packer-program bytes
/// (terminated by `END`), its recipe, and its static cursor count.
#[derive(Debug, Clone)]
pub struct CompiledType {
    pub module: String,
    pub name: String,
    pub program: Vec<u8>,
    pub recipe: RecipeIr,
    pub cursor_count: usize,
}

/// Compiles every `TypeAssignment` in `module_name`, plus (transitively,
/// cached) anything else it references.
pub fn compile_module(modules: &ModuleSet, module_name: &str) -> Result<Vec<CompiledType>, CompileError> {
    let mut session = CompileSession::new(modules);
    session.compile_module(module_name)
}

struct CompileSession<'m> {
    modules: &'m ModuleSet,
    cache: BTreeMap<(String, String), CompiledType>,
    /// The (module, type) pairs currently being compiled, innermost last —
    /// re-entering one of these means a self-referential type and must cut
    /// to an opaque `TypeRef` rather than recursing.
    stack: Vec<(String, String)>,
}

impl<'m> CompileSession<'m> {
    fn new(modules: &'m ModuleSet) -> Self {
        Self { modules, cache: BTreeMap::new(), stack: Vec::new() }
    }

    fn compile_module(&mut self, module_name: &str) -> Result<Vec<CompiledType>, CompileError> {
        let module = self.modules.get(module_name).with_context(|| UnresolvedTypeSnafu {
            module: module_name,
            name: "<module>",
        })?;
        let mut out = Vec::with_capacity(module.assignments.len());
        for assignment in &module.assignments {
            out.push(self.compile_assignment(module_name, &assignment.name)?.clone());
        }
        Ok(out)
    }

    fn current_type_name(&self) -> String {
        self.stack.last().map(|(_, name)| name.clone()).unwrap_or_default()
    }

    fn compile_assignment(&mut self, module: &str, name: &str) -> Result<&CompiledType, CompileError> {
        let key = (module.to_string(), name.to_string());
        if !self.cache.contains_key(&key) {
            self.stack.push(key.clone());
            let assignment_ty = self
                .modules
                .get(module)
                .and_then(|m| m.assignments.iter().find(|a| a.name == name))
                .map(|a| a.ty.clone())
                .with_context(|| UnresolvedTypeSnafu { module, name })?;
            let result = self.compile_statement(module, &assignment_ty);
            self.stack.pop();
            let (mut bytes, recipe, cursor_count) = result?;
            bytes.push(opcode::SCOPE_CLOSE); // top-level END
            self.cache.insert(
                key.clone(),
                CompiledType { module: module.to_string(), name: name.to_string(), program: bytes, recipe, cursor_count },
            );
        }
        Ok(&self.cache[&key])
    }

    /// Lowers one ASN.1 type to a self-contained, locally-0-based
    /// `(bytes, recipe, slot_count)` triple (see module docs).
    fn compile_statement(&mut self, module: &str, ty: &Type) -> Result<(Vec<u8>, RecipeIr, usize), CompileError> {
        match ty {
            Type::Simple(simple) => self.compile_simple(module, *simple),
            Type::Defined(defined) => self.compile_defined(module, defined),
            Type::Tagged(tagged) => self.compile_tagged(module, tagged),
            Type::Sequence(SequenceType { components }) => self.compile_seq_or_set(module, components, true),
            Type::Set(SetType { components }) => self.compile_seq_or_set(module, components, false),
            Type::Choice(ChoiceType { alternatives }) => self.compile_choice(module, alternatives),
            Type::SequenceOf(boxed) => self.compile_repeated(module, &boxed.element, true),
            Type::SetOf(boxed) => self.compile_repeated(module, &boxed.element, false),
        }
    }

    fn compile_simple(&self, module: &str, simple: SimpleType) -> Result<(Vec<u8>, RecipeIr, usize), CompileError> {
        if simple == SimpleType::Any {
            return Ok((vec![opcode::ANY], RecipeIr::Leaf(0), 1));
        }
        if let SimpleType::Real | SimpleType::RelativeOid = simple {
            let what = if simple == SimpleType::Real { "REAL" } else { "RELATIVE-OID" };
            return UnimplementedSnafu { module, type_name: self.current_type_name(), what }.fail();
        }
        let tag = simple_tag(simple);
        Ok((vec![opcode::store(tag)], RecipeIr::Leaf(0), 1))
    }

    fn compile_defined(&mut self, module: &str, defined: &DefinedType) -> Result<(Vec<u8>, RecipeIr, usize), CompileError> {
        let target_module = resolve_type_module(self.modules, module, defined.module.as_deref(), &defined.name)?.to_string();
        let key = (target_module.clone(), defined.name.clone());
        if self.stack.contains(&key) {
            // Re-entry into a type still being compiled: the only way to
            // keep the program finite is to stop expanding here and defer
            // to a secondary unpack against the referenced type's own
            // (eventually complete) program, resolved at codegen time.
            return Ok((vec![opcode::ANY], RecipeIr::TypeRef { slot: 0, module: target_module, name: defined.name.clone() }, 1));
        }
        let compiled = self.compile_assignment(&target_module, &defined.name)?.clone();
        let mut bytes = compiled.program;
        bytes.pop(); // drop the referenced type's own top-level END; we inline its statement only
        Ok((bytes, compiled.recipe, compiled.cursor_count))
    }

    fn compile_tagged(&mut self, module: &str, tagged: &TaggedType) -> Result<(Vec<u8>, RecipeIr, usize), CompileError> {
        // CHOICE and ANY have no single leading tag to override — reject
        // before compiling the underlying statement. This is a structural
        // check on the ASN.1 type itself, not on the compiled opcode: a
        // recursion-cut defined-type reference also lowers to an `ANY`
        // opcode (for opaque-capture reasons unrelated to tagging) and
        // remains implicitly taggable.
        if tagged.tag.kind == TagKind::Implicit
            && matches!(tagged.underlying, Type::Choice(_) | Type::Simple(SimpleType::Any))
        {
            return ImplicitTagOnChoiceOrAnySnafu { module, type_name: self.current_type_name() }.fail();
        }

        let (mut bytes, recipe, slots) = self.compile_statement(module, &tagged.underlying)?;
        let tag = Tag::new(class_of(tagged.tag.class), tagged.tag.number);
        match tagged.tag.kind {
            TagKind::Explicit => {
                let mut out = vec![opcode::enter(tag)];
                out.append(&mut bytes);
                out.push(opcode::SCOPE_CLOSE);
                Ok((out, recipe, slots))
            }
            TagKind::Implicit => {
                match opcode::decode(&bytes, 0) {
                    Op::Enter(_) => bytes[0] = opcode::enter(tag),
                    // Covers both an ordinary primitive leaf and a
                    // `SEQUENCE OF`/`SET OF` field's `STORE|SEQUENCE`/
                    // `STORE|SET`: either way the wire form the cursor
                    // remembers (primitive or constructed) is unaffected by
                    // replacing the tag's class and number.
                    Op::Store(_) => bytes[0] = opcode::store(tag),
                    // `ANY` (a recursion-cut TypeRef capture): tag-transparent
                    // on both unpack and pack, so no byte patch is needed.
                    Op::Any => {}
                    _ => {
                        return ImplicitTagOnChoiceOrAnySnafu { module, type_name: self.current_type_name() }.fail()
                    }
                }
                Ok((bytes, recipe, slots))
            }
        }
    }

    fn compile_seq_or_set(
        &mut self,
        module: &str,
        components: &[ComponentType],
        is_sequence: bool,
    ) -> Result<(Vec<u8>, RecipeIr, usize), CompileError> {
        let named: Vec<&NamedType> = components
            .iter()
            .filter_map(|c| match c {
                ComponentType::Named(n) => Some(n),
                ComponentType::ExtensionMarker => None,
            })
            .collect();

        let ordered: Vec<&NamedType> = if is_sequence {
            named
        } else {
            // DER requires SET fields in ascending-tag order on the wire;
            // the compiler arranges program order to match so C4 never
            // has to reorder at encode time.
            let mut tagged = Vec::with_capacity(named.len());
            for n in named {
                let tag = self.leading_tag(module, &n.ty).with_context(|| AmbiguousSetOrderSnafu {
                    module,
                    type_name: self.current_type_name(),
                    field: n.name.clone(),
                })?;
                tagged.push((tag, n));
            }
            tagged.sort_by_key(|(tag, _)| (tag.class.bits(), tag.number));
            tagged.into_iter().map(|(_, n)| n).collect()
        };

        let mut body = Vec::new();
        let mut fields = Vec::with_capacity(ordered.len());
        let mut base = 0usize;
        for n in ordered {
            let (stmt_bytes, stmt_recipe, stmt_slots) = self.compile_statement(module, &n.ty)?;
            if n.optional {
                body.push(opcode::OPTIONAL);
            }
            body.extend(stmt_bytes);
            fields.push((field_name(&n.name), shift_recipe(stmt_recipe, base)));
            base += stmt_slots;
        }

        let outer_tag = if is_sequence { Tag::SEQUENCE } else { Tag::SET };
        let mut out = vec![opcode::enter(outer_tag)];
        out.append(&mut body);
        out.push(opcode::SCOPE_CLOSE);
        Ok((out, RecipeIr::Named(fields), base))
    }

    fn compile_choice(&mut self, module: &str, alternatives: &[NamedType]) -> Result<(Vec<u8>, RecipeIr, usize), CompileError> {
        let mut body = Vec::new();
        let mut fields = Vec::with_capacity(alternatives.len());
        let mut base = 0usize;
        for alt in alternatives {
            let (stmt_bytes, stmt_recipe, stmt_slots) = self.compile_statement(module, &alt.ty)?;
            body.extend(stmt_bytes);
            fields.push((field_name(&alt.name), shift_recipe(stmt_recipe, base)));
            base += stmt_slots;
        }
        let mut out = vec![opcode::CHOICE_BRACKET];
        out.append(&mut body);
        out.push(opcode::CHOICE_BRACKET);
        Ok((out, RecipeIr::Named(fields), base))
    }

    fn compile_repeated(&mut self, module: &str, element: &Type, is_sequence_of: bool) -> Result<(Vec<u8>, RecipeIr, usize), CompileError> {
        // The recursion cutoff: emit a single STORE|SEQUENCE (or STORE|SET)
        // so the body is captured as one opaque cursor, per spec.md §4.6.
        // `STORE`, not `ENTER`, because the element list isn't expanded
        // inline here — but the body is still constructed, so the cursor
        // the interpreter writes for it is marked opaque (see
        // `asnpack::cursor::Cursor::new_opaque`) rather than primitive.
        // The element program/recipe get their own independent 0-based
        // array, decoded lazily by the recipe engine on access.
        let (mut element_program, element_recipe, _) = self.compile_statement(module, element)?;
        element_program.push(opcode::SCOPE_CLOSE);
        let recipe = RecipeIr::Repeated { slot: 0, element_program, element_recipe: Box::new(element_recipe) };
        let outer_tag = if is_sequence_of { Tag::SEQUENCE } else { Tag::SET };
        Ok((vec![opcode::store(outer_tag)], recipe, 1))
    }

    /// The statically-knowable leading tag of `ty`, or `None` if it has
    /// none (`CHOICE`, `ANY`, or an unresolvable defined-type reference) —
    /// used only to sort `SET` fields into canonical DER order.
    fn leading_tag(&self, module: &str, ty: &Type) -> Option<Tag> {
        self.leading_tag_visiting(module, ty, &mut BTreeSet::new())
    }

    fn leading_tag_visiting(&self, module: &str, ty: &Type, visiting: &mut BTreeSet<(String, String)>) -> Option<Tag> {
        match ty {
            Type::Simple(SimpleType::Any) => None,
            Type::Simple(simple) => Some(simple_tag(*simple)),
            Type::Tagged(tagged) => Some(Tag::new(class_of(tagged.tag.class), tagged.tag.number)),
            Type::Sequence(_) | Type::SequenceOf(_) => Some(Tag::SEQUENCE),
            Type::Set(_) | Type::SetOf(_) => Some(Tag::SET),
            Type::Choice(_) => None,
            Type::Defined(defined) => {
                let target_module = resolve_type_module(self.modules, module, defined.module.as_deref(), &defined.name).ok()?;
                let key = (target_module.to_string(), defined.name.clone());
                if !visiting.insert(key.clone()) {
                    return None;
                }
                if let Some(compiled) = self.cache.get(&key) {
                    return tag_of_first_opcode(&compiled.program);
                }
                let assignment = self
                    .modules
                    .get(target_module)?
                    .assignments
                    .iter()
                    .find(|a| a.name == defined.name)?;
                self.leading_tag_visiting(target_module, &assignment.ty, visiting)
            }
        }
    }
}

fn tag_of_first_opcode(program: &[u8]) -> Option<Tag> {
    match opcode::decode(program, 0) {
        Op::Enter(tag) | Op::Store(tag) => Some(tag),
        _ => None,
    }
}

/// Recursively rebases every slot index in `recipe` by `base`. Stops at
/// `Repeated`/`TypeRef` boundaries — those address their own independent
/// cursor arrays, always starting at `0` (see module docs).
fn shift_recipe(recipe: RecipeIr, base: usize) -> RecipeIr {
    match recipe {
        RecipeIr::Leaf(slot) => RecipeIr::Leaf(slot + base),
        RecipeIr::Named(fields) => {
            RecipeIr::Named(fields.into_iter().map(|(name, r)| (name, shift_recipe(r, base))).collect())
        }
        RecipeIr::Repeated { slot, element_program, element_recipe } => {
            RecipeIr::Repeated { slot: slot + base, element_program, element_recipe }
        }
        RecipeIr::TypeRef { slot, module, name } => RecipeIr::TypeRef { slot: slot + base, module, name },
    }
}

/// Field-name policy: dashes become underscores at
/// definition time; [`asnpack::recipe::View::field`] handles the matching
/// trailing-underscore-strip at lookup time.
fn field_name(identifier: &str) -> String {
    identifier.replace('-', "_")
}

fn class_of(class: TagClass) -> Class {
    match class {
        TagClass::Universal => Class::Universal,
        TagClass::Application => Class::Application,
        TagClass::Context => Class::Context,
        TagClass::Private => Class::Private,
    }
}

fn simple_tag(simple: SimpleType) -> Tag {
    match simple {
        SimpleType::Any => unreachable!("ANY has no fixed tag; handled before this is called"),
        SimpleType::Boolean => Tag::BOOLEAN,
        SimpleType::Integer => Tag::INTEGER,
        SimpleType::BitString => Tag::BIT_STRING,
        SimpleType::OctetString => Tag::OCTET_STRING,
        SimpleType::Null => Tag::NULL,
        SimpleType::ObjectIdentifier => Tag::OBJECT_IDENTIFIER,
        SimpleType::RelativeOid => Tag::RELATIVE_OID,
        SimpleType::Real => Tag::REAL,
        SimpleType::Enumerated => Tag::ENUMERATED,
        SimpleType::Utf8String => Tag::UTF8_STRING,
        SimpleType::PrintableString => Tag::PRINTABLE_STRING,
        SimpleType::Ia5String => Tag::IA5_STRING,
        SimpleType::NumericString => Tag::NUMERIC_STRING,
        SimpleType::TeletexString => Tag::TELETEX_STRING,
        SimpleType::VideotexString => Tag::VIDEOTEX_STRING,
        SimpleType::GraphicString => Tag::GRAPHIC_STRING,
        SimpleType::VisibleString => Tag::VISIBLE_STRING,
        SimpleType::GeneralString => Tag::GENERAL_STRING,
        SimpleType::UniversalString => Tag::UNIVERSAL_STRING,
        SimpleType::BmpString => Tag::BMP_STRING,
        SimpleType::UtcTime => Tag::UTC_TIME,
        SimpleType::GeneralizedTime => Tag::GENERALIZED_TIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;
    use asnpack::cursor::CursorArray;
    use asnpack::pack::pack;
    use asnpack::unpack::unpack;

    fn compile_first(source: &str) -> CompiledType {
        let module = parse_module(source).unwrap();
        let name = module.name.clone();
        let mut modules = ModuleSet::new();
        modules.insert(name.clone(), module);
        compile_module(&modules, &name).unwrap().remove(0)
    }

    #[test]
    fn seed_vector_b_two_octet_strings() {
        let compiled = compile_first(
            "M DEFINITIONS ::= BEGIN\nMsg ::= SEQUENCE { a OCTET STRING, b OCTET STRING }\nEND\n",
        );
        let der = [0x30, 0x08, 0x04, 0x02, 0xca, 0xfe, 0x04, 0x02, 0xba, 0xbe];
        let cursors = unpack(&compiled.program, &der).unwrap();
        assert_eq!(cursors.len(), 2);
        assert_eq!(pack(&compiled.program, &cursors, &der).unwrap(), der);
    }

    #[test]
    fn optional_omission_seed_vector_e() {
        let compiled = compile_first(
            "M DEFINITIONS ::= BEGIN\nMsg ::= SEQUENCE { a INTEGER, b UTF8String OPTIONAL }\nEND\n",
        );
        let der = [0x30, 0x03, 0x02, 0x01, 0x07];
        let cursors = unpack(&compiled.program, &der).unwrap();
        assert_eq!(cursors.len(), 2);
        assert!(cursors.get(1).unwrap().is_empty());
        assert_eq!(pack(&compiled.program, &cursors, &der).unwrap(), der);
    }

    #[test]
    fn choice_seed_vector_f() {
        let compiled = compile_first(
            "M DEFINITIONS ::= BEGIN\nMsg ::= CHOICE { i [0] IMPLICIT INTEGER, s [1] IMPLICIT OCTET STRING }\nEND\n",
        );
        let der_s = [0x81, 0x03, 0x61, 0x62, 0x63];
        let cursors = unpack(&compiled.program, &der_s).unwrap();
        assert!(cursors.get(0).unwrap().is_empty());
        assert!(!cursors.get(1).unwrap().is_empty());

        let der_i = [0x80, 0x01, 0x2a];
        let cursors = unpack(&compiled.program, &der_i).unwrap();
        assert!(!cursors.get(0).unwrap().is_empty());
        assert!(cursors.get(1).unwrap().is_empty());
    }

    #[test]
    fn set_fields_are_ordered_by_ascending_tag() {
        // Declared out of DER order; the compiler must emit BOOLEAN (tag 1)
        // before OCTET STRING (tag 4).
        let compiled = compile_first(
            "M DEFINITIONS ::= BEGIN\nMsg ::= SET { b OCTET STRING, a BOOLEAN }\nEND\n",
        );
        assert_eq!(opcode::decode(&compiled.program, 1), Op::Store(Tag::BOOLEAN));
    }

    #[test]
    fn self_referential_type_compiles_to_a_finite_program_and_unpacks_nested_depth() {
        let compiled = compile_first("M DEFINITIONS ::= BEGIN\nA ::= SEQUENCE { next A OPTIONAL }\nEND\n");
        assert!(compiled.program.len() < 64);

        // depth-2 nesting: SEQUENCE { next: SEQUENCE { next: absent } }
        let inner = [0x30, 0x00];
        let der = [0x30, 0x02, 0x30, 0x00];
        let cursors = unpack(&compiled.program, &der).unwrap();
        assert_eq!(cursors.len(), 1);
        let nested_tlv = cursors.get(0).unwrap();
        assert_eq!(nested_tlv.slice(&der), &inner[..]);

        let Ok(RecipeIr::Named(_)) = Ok::<_, ()>(&compiled.recipe) else { panic!() };
    }

    #[test]
    fn implicit_tag_override_matches_der_with_replaced_outer_tag() {
        let compiled = compile_first(
            "M DEFINITIONS ::= BEGIN\nT ::= [0] IMPLICIT INTEGER\nEND\n",
        );
        let der = [0x80, 0x01, 0x2a];
        let cursors = unpack(&compiled.program, &der).unwrap();
        assert_eq!(cursors.get(0).unwrap().slice(&der), &[0x2a]);
    }

    #[test]
    fn implicit_tagging_choice_is_rejected() {
        let module = parse_module(
            "M DEFINITIONS ::= BEGIN\nT ::= [0] IMPLICIT CHOICE { a INTEGER, b OCTET STRING }\nEND\n",
        )
        .unwrap();
        let mut modules = ModuleSet::new();
        modules.insert("M".to_string(), module);
        let err = compile_module(&modules, "M").unwrap_err();
        assert!(matches!(err, CompileError::ImplicitTagOnChoiceOrAny { .. }));
    }

    #[test]
    fn real_is_unimplemented() {
        let module = parse_module("M DEFINITIONS ::= BEGIN\nT ::= REAL\nEND\n").unwrap();
        let mut modules = ModuleSet::new();
        modules.insert("M".to_string(), module);
        assert!(matches!(compile_module(&modules, "M").unwrap_err(), CompileError::Unimplemented { .. }));
    }

    #[test]
    fn sequence_of_captures_one_opaque_slot() {
        let compiled = compile_first("M DEFINITIONS ::= BEGIN\nList ::= SEQUENCE OF INTEGER\nEND\n");
        assert_eq!(compiled.cursor_count, 1);
        assert_eq!(opcode::decode(&compiled.program, 0), Op::Store(Tag::SEQUENCE));
        let der = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02];
        let cursors = unpack(&compiled.program, &der).unwrap();
        let RecipeIr::Repeated { element_program, .. } = &compiled.recipe else { panic!("expected Repeated") };
        let captured = cursors.get(0).unwrap();
        assert!(captured.is_constructed());
        // The SEQUENCE's own tag/length are consumed by the STORE; the
        // cursor holds just the body (the concatenated element TLVs).
        assert_eq!(captured.slice(&der), &der[2..]);
        let first_tlv = &captured.slice(&der)[..3];
        let element_cursors = unpack(element_program, first_tlv).unwrap();
        assert_eq!(element_cursors.get(0).unwrap().slice(first_tlv), &[0x01]);
    }

    #[test]
    fn set_of_compiles_to_store_set_not_store_sequence() {
        let compiled = compile_first("M DEFINITIONS ::= BEGIN\nList ::= SET OF INTEGER\nEND\n");
        assert_eq!(opcode::decode(&compiled.program, 0), Op::Store(Tag::SET));
        let der = [0x31, 0x03, 0x02, 0x01, 0x2a];
        let cursors = unpack(&compiled.program, &der).unwrap();
        assert_eq!(cursors.get(0).unwrap().slice(&der), &der[2..]);
    }

    #[test]
    fn optional_sequence_of_does_not_swallow_the_following_required_field() {
        // Regression: compiling SEQUENCE OF/SET OF to a bare `ANY` opcode
        // made `could_start_with` treat the field as a wildcard, so an
        // absent OPTIONAL SEQUENCE OF field could never be told apart from
        // the next field's own tag.
        let compiled = compile_first(
            "M DEFINITIONS ::= BEGIN\nMsg ::= SEQUENCE { a SEQUENCE OF INTEGER OPTIONAL, b BOOLEAN }\nEND\n",
        );
        let der = [0x30, 0x03, 0x01, 0x01, 0xff];
        let cursors = unpack(&compiled.program, &der).unwrap();
        assert!(cursors.get(0).unwrap().is_empty());
        assert_eq!(cursors.get(1).unwrap().slice(&der), &[0xff]);
        assert_eq!(pack(&compiled.program, &cursors, &der).unwrap(), der);
    }

    #[test]
    fn implicitly_tagged_sequence_of_overrides_tag_but_stays_constructed() {
        let compiled = compile_first("M DEFINITIONS ::= BEGIN\nT ::= [0] IMPLICIT SEQUENCE OF INTEGER\nEND\n");
        assert_eq!(opcode::decode(&compiled.program, 0), Op::Store(Tag::context(0)));
        let der = [0xa0, 0x03, 0x02, 0x01, 0x2a];
        let cursors = unpack(&compiled.program, &der).unwrap();
        assert!(cursors.get(0).unwrap().is_constructed());
        assert_eq!(pack(&compiled.program, &cursors, &der).unwrap(), der);
    }

    #[test]
    fn cross_module_reference_inlines_the_imported_type() {
        let shapes = parse_module(
            "Shapes DEFINITIONS ::= BEGIN\nShape ::= CHOICE { circle [0] IMPLICIT INTEGER, square [1] IMPLICIT INTEGER }\nEND\n",
        )
        .unwrap();
        let client = parse_module(
            "Client DEFINITIONS ::= BEGIN\nIMPORTS Shape FROM Shapes;\nHolder ::= SEQUENCE { held Shapes.Shape }\nEND\n",
        )
        .unwrap();
        let mut modules = ModuleSet::new();
        modules.insert("Shapes".to_string(), shapes);
        modules.insert("Client".to_string(), client);
        let compiled = compile_module(&modules, "Client").unwrap().remove(0);
        let der = [0x30, 0x03, 0x80, 0x01, 0x2a];
        let cursors = unpack(&compiled.program, &der).unwrap();
        assert_eq!(cursors.len(), 2);
        assert!(!cursors.get(0).unwrap().is_empty());

        let _ = CursorArray::with_capacity(0); // exercised elsewhere; keeps import honest
    }
}
